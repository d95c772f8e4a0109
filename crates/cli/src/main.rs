use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filestore_cli::console;
use filestore_cli::{logging, output};
use filestore_core::config;
use filestore_core::config::AppConfig;
use filestore_core::{FileStorage, SearchQuery, StorageHandle, StorageService};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        cfg.storage.root = root;
    }
    logging::init(&cfg.logging.level);

    let storage = FileStorage::from_config(&cfg)
        .with_context(|| format!("opening storage at {}", cfg.storage.root))?;
    let handle = StorageService::spawn(storage);

    match cli.command {
        Commands::Store { source, name, tags } => run_store(&handle, source, name, tags).await,
        Commands::Search {
            query,
            tags,
            ext,
            json,
            fields,
        } => run_search(&handle, query, tags, ext, json, &fields).await,
        Commands::List { json, fields } => run_list(&handle, json, &fields).await,
        Commands::Cat { name } => run_cat(&handle, &name).await,
        Commands::Path { name } => run_path(&handle, &name).await,
        Commands::Tag { name, tags } => run_tag(&handle, &name, tags).await,
        Commands::Tags => run_tags(&handle).await,
        Commands::Delete { name } => run_delete(&handle, &name).await,
        Commands::Audit { json } => run_audit(&handle, json).await,
        Commands::Shell => run_shell(handle, &cfg).await,
    }
}

#[derive(Parser)]
#[command(name = "filestore")]
#[command(about = "Tagged file storage with a JSON index", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Override the storage root directory
    #[arg(long)]
    root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a file into storage
    Store {
        /// File to copy
        source: String,
        /// Name to store it under (defaults to the source's name)
        #[arg(long)]
        name: Option<String>,
        /// Tags to attach (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        tags: Vec<String>,
    },
    /// Search stored files by name, tags and extension
    Search {
        /// Case-insensitive substring of the stored name
        #[arg(short, long)]
        query: Option<String>,
        /// Match files carrying any of these tags (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        tags: Vec<String>,
        /// Stored name suffix, e.g. .txt
        #[arg(long)]
        ext: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Restrict JSON fields (comma-separated), e.g. stored_name,size,tags
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
    },
    /// List every stored file
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Restrict JSON fields (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
    },
    /// Write a stored file's content to stdout
    Cat { name: String },
    /// Print the on-disk path of a stored file
    Path { name: String },
    /// Add tags to a stored file
    Tag {
        name: String,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },
    /// List every tag in use
    Tags,
    /// Delete a stored file
    Delete { name: String },
    /// Compare the index with the storage directory (read-only)
    Audit {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive menu
    Shell,
}

async fn run_store(
    handle: &StorageHandle,
    source: String,
    name: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let tags = output::parse_tags(&tags.join(","));
    let dest = handle.store(source, name, tags).await?;
    println!("{}", dest.display());
    Ok(())
}

async fn run_search(
    handle: &StorageHandle,
    query: Option<String>,
    tags: Vec<String>,
    ext: Option<String>,
    json: bool,
    fields: &[String],
) -> Result<()> {
    let mut search = SearchQuery::new().with_tags(output::parse_tags(&tags.join(",")));
    if let Some(q) = query {
        search = search.with_query(q);
    }
    if let Some(e) = ext {
        search = search.with_extension(e);
    }
    let results = handle.search_files(search).await?;
    let mut out = io::stdout().lock();
    if json {
        output::write_records_json(&mut out, &results, fields)
    } else {
        writeln!(out, "Found {} file(s):", results.len())?;
        output::write_records(&mut out, &results)
    }
}

async fn run_list(handle: &StorageHandle, json: bool, fields: &[String]) -> Result<()> {
    let all = handle.list_all_files().await?;
    let mut out = io::stdout().lock();
    if json {
        output::write_records_json(&mut out, &all, fields)
    } else {
        writeln!(out, "All {} file(s) in storage:", all.len())?;
        output::write_records(&mut out, &all)
    }
}

async fn run_cat(handle: &StorageHandle, name: &str) -> Result<()> {
    let content = handle.load_file_content(name).await?;
    let mut out = io::stdout().lock();
    out.write_all(&content)?;
    out.flush()?;
    Ok(())
}

async fn run_path(handle: &StorageHandle, name: &str) -> Result<()> {
    match handle.get_file_path(name).await? {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("file not found in storage: {name}"),
    }
}

async fn run_tag(handle: &StorageHandle, name: &str, tags: Vec<String>) -> Result<()> {
    let tags = output::parse_tags(&tags.join(","));
    if !handle.add_tags(name, tags).await? {
        bail!("file not found in storage: {name}");
    }
    if let Some(record) = handle.get_record(name).await? {
        println!("{}: {}", name, output::format_tags(&record.tags));
    }
    Ok(())
}

async fn run_tags(handle: &StorageHandle) -> Result<()> {
    for tag in handle.get_all_tags().await? {
        println!("{tag}");
    }
    Ok(())
}

async fn run_delete(handle: &StorageHandle, name: &str) -> Result<()> {
    if !handle.delete(name).await? {
        bail!("file {name} not found or could not be deleted");
    }
    println!("deleted {name}");
    Ok(())
}

async fn run_audit(handle: &StorageHandle, json: bool) -> Result<()> {
    let report = handle.audit().await?;
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        Ok(())
    } else {
        output::write_audit(&mut out, &report)
    }
}

async fn run_shell(handle: StorageHandle, cfg: &AppConfig) -> Result<()> {
    tracing::info!(root = %cfg.storage.root, "starting interactive console");
    console::run_blocking(handle, io::BufReader::new(io::stdin()), io::stdout()).await?;
    Ok(())
}
