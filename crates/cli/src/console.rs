use crate::output::{self, PREVIEW_CHARS};
use anyhow::Result;
use filestore_core::{SearchQuery, StorageError, StorageHandle};
use std::io::{BufRead, Write};
use tokio::task;

const MENU: &str = "
Options:
1. Store a file
2. Search for files
3. List all files
4. Load file content
5. Add tags to a file
6. View all tags
7. Delete a file
8. Exit";

/// Runs a session on a blocking thread, so reads from `input` never hold up
/// the runtime. Hands the output stream back when the session ends.
pub async fn run_blocking<R, W>(storage: StorageHandle, input: R, output: W) -> Result<W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let runtime = tokio::runtime::Handle::current();
    task::spawn_blocking(move || -> Result<W> {
        let mut console = Console::new(storage, input, output);
        runtime.block_on(console.run())?;
        Ok(console.into_output())
    })
    .await?
}

pub struct Console<R, W> {
    storage: StorageHandle,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(storage: StorageHandle, input: R, output: W) -> Self {
        Self {
            storage,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Interactive File Storage System")?;
        writeln!(self.output, "{}", "=".repeat(40))?;
        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("\nEnter your choice (1-8): ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.store().await?,
                "2" => self.search().await?,
                "3" => self.list().await?,
                "4" => self.load().await?,
                "5" => self.add_tags().await?,
                "6" => self.all_tags().await?,
                "7" => self.delete().await?,
                "8" => break,
                _ => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Trimmed line, or `None` once input is exhausted.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_or_empty(&mut self, message: &str) -> Result<String> {
        Ok(self.prompt(message)?.unwrap_or_default())
    }

    async fn store(&mut self) -> Result<()> {
        let source = self.prompt_or_empty("Enter the path to the file you want to store: ")?;
        let filename = self.prompt_or_empty(
            "Enter the filename to store it as (or press Enter to keep original): ",
        )?;
        let tags = self.prompt_or_empty("Enter tags separated by commas (or press Enter for no tags): ")?;
        let filename = (!filename.is_empty()).then_some(filename);

        match self
            .storage
            .store(source, filename, output::parse_tags(&tags))
            .await
        {
            Ok(path) => writeln!(self.output, "File stored successfully at: {}", path.display())?,
            Err(StorageError::SourceNotFound(_)) => {
                writeln!(self.output, "Error: Source file not found!")?
            }
            Err(e) => writeln!(self.output, "Error storing file: {e}")?,
        }
        Ok(())
    }

    async fn search(&mut self) -> Result<()> {
        let query = self.prompt_or_empty("Enter search query (or press Enter to skip): ")?;
        let tags = self.prompt_or_empty(
            "Enter tags to search for (separated by commas, or press Enter to skip): ",
        )?;
        let extension = self.prompt_or_empty(
            "Enter file extension to filter by (e.g., .txt, or press Enter to skip): ",
        )?;

        let mut search = SearchQuery::new().with_tags(output::parse_tags(&tags));
        if !query.is_empty() {
            search = search.with_query(query);
        }
        if !extension.is_empty() {
            search = search.with_extension(extension);
        }
        let results = self.storage.search_files(search).await?;
        writeln!(self.output, "\nFound {} file(s):", results.len())?;
        output::write_records(&mut self.output, &results)
    }

    async fn list(&mut self) -> Result<()> {
        let all = self.storage.list_all_files().await?;
        writeln!(self.output, "\nAll {} file(s) in storage:", all.len())?;
        output::write_records(&mut self.output, &all)
    }

    async fn load(&mut self) -> Result<()> {
        let filename = self.prompt_or_empty("Enter the filename to load: ")?;
        match self.storage.load_file_content(&filename).await {
            Ok(content) => {
                let (shown, truncated) = output::preview(&content, PREVIEW_CHARS);
                writeln!(self.output, "\nContent of {filename}:")?;
                writeln!(self.output, "{shown}")?;
                if truncated {
                    writeln!(self.output, "... (content truncated)")?;
                }
            }
            Err(e) => writeln!(self.output, "Error loading file: {e}")?,
        }
        Ok(())
    }

    async fn add_tags(&mut self) -> Result<()> {
        let filename = self.prompt_or_empty("Enter the filename to add tags to: ")?;
        let tags = self.prompt_or_empty("Enter tags to add (separated by commas): ")?;
        if self
            .storage
            .add_tags(&filename, output::parse_tags(&tags))
            .await?
        {
            let tags = self
                .storage
                .get_record(&filename)
                .await?
                .map(|r| output::format_tags(&r.tags))
                .unwrap_or_default();
            writeln!(self.output, "Tags updated for {filename}: {tags}")?;
        } else {
            writeln!(self.output, "File {filename} not found!")?;
        }
        Ok(())
    }

    async fn all_tags(&mut self) -> Result<()> {
        let tags = self.storage.get_all_tags().await?;
        writeln!(self.output, "\nAll tags in storage ({} total):", tags.len())?;
        for tag in tags {
            writeln!(self.output, "  - {tag}")?;
        }
        Ok(())
    }

    async fn delete(&mut self) -> Result<()> {
        let filename = self.prompt_or_empty("Enter the filename to delete: ")?;
        if self.storage.delete(&filename).await? {
            writeln!(self.output, "File {filename} deleted successfully!")?;
        } else {
            writeln!(self.output, "File {filename} not found or could not be deleted!")?;
        }
        Ok(())
    }
}
