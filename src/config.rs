// src/config.rs
use crate::utils::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_COLCOUNT: usize = 1;
pub const DEFAULT_INVESTMENT_PAGE_TARGET: &str = "scheduleofinvestments";
pub const DEFAULT_INVESTMENT_CONTINUE_PAGE_TARGET: &str = "(continued)";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_VAR: &str = "API_KEY";

// `KEY = value` with optional surrounding whitespace
static CONFIG_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$")
        .expect("Failed to compile CONFIG_LINE_RE")
});

/// Strips all whitespace and lower-cases, the form markers are compared in.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Page geometry and marker settings for segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    pub header_height: f64,
    pub footer_height: f64,
    pub column_count: usize,
    /// Stored normalized.
    pub schedule_marker: String,
    /// Stored normalized.
    pub continuation_marker: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            header_height: 0.0,
            footer_height: 0.0,
            column_count: DEFAULT_COLCOUNT,
            schedule_marker: DEFAULT_INVESTMENT_PAGE_TARGET.to_string(),
            continuation_marker: DEFAULT_INVESTMENT_CONTINUE_PAGE_TARGET.to_string(),
        }
    }
}

impl SegmentationConfig {
    /// Builds a config, normalizing markers and falling back to defaults for empty ones.
    pub fn new(
        header_height: f64,
        footer_height: f64,
        column_count: usize,
        schedule_marker: &str,
        continuation_marker: &str,
    ) -> Result<Self, ConfigError> {
        if column_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOC_COLCOUNT".to_string(),
                value: column_count.to_string(),
            });
        }
        let schedule_marker = Some(normalize(schedule_marker))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_INVESTMENT_PAGE_TARGET.to_string());
        let continuation_marker = Some(normalize(continuation_marker))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_INVESTMENT_CONTINUE_PAGE_TARGET.to_string());

        Ok(Self {
            header_height,
            footer_height,
            column_count,
            schedule_marker,
            continuation_marker,
        })
    }
}

/// Everything a run needs, loaded from the config file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub document: PathBuf,
    pub segmentation: SegmentationConfig,
    pub model: String,
    pub api_base_url: String,
}

impl RunConfig {
    /// Reads and parses a config file. Relative `DOC` paths resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;

        if config.document.is_relative() {
            if let Some(dir) = path.parent() {
                config.document = dir.join(&config.document);
            }
        }
        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let values = parse_entries(contents);
        let get = |key: &str| values.get(key).map(String::as_str).unwrap_or("");

        let document = get("DOC");
        if document.is_empty() {
            return Err(ConfigError::MissingDocument);
        }

        let header_height = dimension(&values, "DOC_HEADER", 0);
        let footer_height = dimension(&values, "DOC_FOOTER", 0);
        let column_count = dimension(&values, "DOC_COLCOUNT", DEFAULT_COLCOUNT as u64);

        let segmentation = SegmentationConfig::new(
            header_height as f64,
            footer_height as f64,
            column_count as usize,
            get("INVESTMENT_PAGE_TARGET"),
            get("INVESTMENT_CONTINUE_PAGE_TARGET"),
        )?;

        let model = Some(get("MODEL"))
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        let api_base_url = Some(get("API_BASE_URL"))
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            document: PathBuf::from(document),
            segmentation,
            model,
            api_base_url,
        })
    }
}

/// Reads the completion API credential from the environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    std::env::var(API_KEY_VAR)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(ConfigError::MissingCredential)
}

fn parse_entries(contents: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match CONFIG_LINE_RE.captures(trimmed) {
            Some(caps) => {
                let key = caps[1].to_string();
                let value = unquote(&caps[2]);
                values.insert(key, value);
            }
            None => tracing::debug!("Ignoring unrecognized config line: '{}'", trimmed),
        }
    }
    values
}

fn unquote(raw: &str) -> String {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return raw[1..raw.len() - 1].to_string();
        }
    }
    // unquoted values end at an inline comment
    match raw.find(" #") {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn dimension(values: &HashMap<String, String>, key: &str, default: u64) -> u64 {
    match values.get(key) {
        None => default,
        Some(raw) if raw.is_empty() => default,
        Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!("{} = '{}' is not a non-negative integer, using {}", key, raw, default);
            default
        }),
    }
}
