use std::env;
use std::path::PathBuf;

/// Crate-level constants
pub const APP_NAME: &str = "Grundkat";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted size for an uploaded catalog PDF.
/// Prevents OOM on corrupt/adversarial files.
pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Get the application data directory
/// ~/Grundkat/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Directory where uploaded catalog PDFs are stored
pub fn catalogs_dir() -> PathBuf {
    app_data_dir().join("catalogs")
}

/// Path of the SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("grundkat.db")
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    "info,grundkat=debug".to_string()
}

/// Runtime environment profile. Controls whether normalization persists
/// its results (`Prod`) or only produces diagnostics (`Dev`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvProfile {
    Dev,
    Prod,
}

impl EnvProfile {
    /// Read the profile from `GRUNDKAT_ENV`. Anything other than "prod" is Dev.
    pub fn from_env() -> Self {
        match env::var("GRUNDKAT_ENV").as_deref() {
            Ok("prod") => Self::Prod,
            _ => Self::Dev,
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Base URL of the Ollama instance used for text normalization.
pub fn ollama_url() -> String {
    env::var("GRUNDKAT_OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Model used for requirement text normalization.
pub fn normalizer_model() -> String {
    env::var("GRUNDKAT_MODEL").unwrap_or_else(|_| "llama3:8b".to_string())
}
