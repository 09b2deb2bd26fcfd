use anyhow::{Context, Result};

use crate::chunk::{ReaderOptions, DEFAULT_MAX_DEPTH};
use crate::logging::LogLevel;

/// Run options that can be set via CLI or config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub max_depth: Option<usize>,
    pub pad_odd_chunks: Option<bool>,
    pub recursive_extract: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub output_dir: Option<String>,
}

impl Options {
    /// Reader settings with unset fields falling back to defaults
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            pad_odd_chunks: self.pad_odd_chunks.unwrap_or(false),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    /// Whether extraction descends into FORM chunks
    pub fn recursive_extract(&self) -> bool {
        self.recursive_extract.unwrap_or(false)
    }
}

/// Load options from a `KEY=VALUE` config file.
///
/// No path means defaults. Blank lines and `#` comments are ignored.
pub fn load_config(config_file: &Option<String>) -> Result<Options> {
    let Some(path) = config_file else {
        return Ok(Options::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    parse_config(&text).with_context(|| format!("Invalid config file {}", path))
}

/// Parse config file contents
pub fn parse_config(text: &str) -> Result<Options> {
    let mut opts = Options::default();

    for (lineno, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("line {}: expected KEY=VALUE", lineno + 1);
        };
        let (key, value) = (key.trim(), value.trim());

        match key.to_ascii_uppercase().as_str() {
            "MAX_DEPTH" => {
                opts.max_depth = Some(parse_depth(value).context(format!("line {}", lineno + 1))?)
            }
            "PAD_ODD_CHUNKS" => {
                opts.pad_odd_chunks =
                    Some(parse_bool(value).context(format!("line {}", lineno + 1))?)
            }
            "RECURSIVE_EXTRACT" => {
                opts.recursive_extract =
                    Some(parse_bool(value).context(format!("line {}", lineno + 1))?)
            }
            "LOG_LEVEL" => {
                let level = LogLevel::from_name(value).with_context(|| {
                    format!("line {}: unknown log level '{}'", lineno + 1, value)
                })?;
                opts.log_level = Some(level);
            }
            "OUTPUT_DIR" => opts.output_dir = Some(value.to_string()),
            _ => log::warn!("config line {}: ignoring unknown key '{}'", lineno + 1, key),
        }
    }

    Ok(opts)
}

/// Parse a nesting limit; zero is rejected since no FORM could be read
pub fn parse_depth(s: &str) -> Result<usize> {
    let depth: usize = s.trim().parse().context("Invalid depth value")?;
    if depth == 0 {
        anyhow::bail!("Maximum depth must be at least 1");
    }
    Ok(depth)
}

/// Parse a boolean setting
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean value '{}'", other),
    }
}
