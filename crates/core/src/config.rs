use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INDEX_FILE: &str = "file_index.json";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["pdf", "doc", "docx", "xls", "xlsx", "txt", "jpg", "jpeg", "png"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl StorageConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted source file in bytes; 0 disables the check.
    #[serde(default)]
    pub max_file_size: u64,
    /// Accepted extensions without the dot; empty accepts anything.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder()
        .set_default("storage.root", "./storage")?
        .set_default("storage.index_file", DEFAULT_INDEX_FILE)?
        .set_default("limits.max_file_size", DEFAULT_MAX_FILE_SIZE as i64)?
        .set_default(
            "limits.allowed_extensions",
            DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
        )?
        .set_default("logging.level", "info")?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("FILESTORE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("limits.allowed_extensions"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
