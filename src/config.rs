//! Configuration loading for the summarizer.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! sensible defaults so a bare checkout can still process a book.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Model identifier sent with every chat-completion request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Chat-completions endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Name of the environment variable holding the API credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// System instruction sent alongside each chapter.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How many chapters `--test` runs process before stopping.
    #[serde(default = "default_test_chapter_limit")]
    pub test_chapter_limit: usize,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub write_report_json: bool,
    #[serde(default)]
    pub on_gateway_error: GatewayErrorPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            model: default_model(),
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            prompt: default_prompt(),
            request_timeout_secs: default_request_timeout_secs(),
            test_chapter_limit: default_test_chapter_limit(),
            output_format: OutputFormat::default(),
            output_dir: default_output_dir(),
            write_report_json: false,
            on_gateway_error: GatewayErrorPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Markdown,
    Docx,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Markdown
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Docx => "docx",
        };
        write!(f, "{}", label)
    }
}

/// What to do when a summarization call fails.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GatewayErrorPolicy {
    /// Stop the run on the first failed call.
    Abort,
    /// Log a warning and leave the chapter out of the output document.
    Skip,
}

impl Default for GatewayErrorPolicy {
    fn default() -> Self {
        GatewayErrorPolicy::Abort
    }
}

impl std::fmt::Display for GatewayErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GatewayErrorPolicy::Abort => "abort",
            GatewayErrorPolicy::Skip => "skip",
        };
        write!(f, "{}", label)
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

fn default_model() -> String {
    "gpt-4o-2024-05-13".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_prompt() -> String {
    "Summarize the key takeaways from the provided text into a 250-word \
     section that begins on its own line with the label \"Key Takeaway(s):\". \
     Then, condense the main points from the entire text into a recap that is \
     approximately 75% of the original word count, beginning on its own line \
     with the label \"Recap:\". Please write the summary and recap in a \
     book-like format, using clear and concise language to reflect on the \
     learnings from the text. Ensure the text is formatted for optimal \
     readability, using paragraphs and proper spacing to make it easy to \
     follow and understand."
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_test_chapter_limit() -> usize {
    3
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Path::new("conf/does-not-exist.toml"));
        assert_eq!(cfg.test_chapter_limit, 3);
        assert_eq!(cfg.output_format, OutputFormat::Markdown);
        assert_eq!(cfg.on_gateway_error, GatewayErrorPolicy::Abort);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            model = "local-test"
            output_format = "docx"
            on_gateway_error = "skip"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.model, "local-test");
        assert_eq!(cfg.output_format, OutputFormat::Docx);
        assert_eq!(cfg.on_gateway_error, GatewayErrorPolicy::Skip);
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.test_chapter_limit, 3);
    }
}
