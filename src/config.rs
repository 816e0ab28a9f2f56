//! Layered configuration.
//!
//! Values are looked up in an ordered list of sources (command line,
//! environment, config file, built-in defaults) and the first source that
//! has a key wins. The result is materialised once into an immutable
//! [`Config`] that is handed to the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

/// Environment variables are `MARKETMAP_<KEY>`, e.g. `MARKETMAP_COLUMNS`
pub const ENV_PREFIX: &str = "MARKETMAP_";

pub const COLUMNS: &str = "columns";
pub const INPUT_FILEPATH: &str = "input_filepath";
pub const MARKET_FILEPATH: &str = "market_filepath";
pub const OUTPUT_FILEPATH: &str = "output_filepath";
pub const SEPARATOR: &str = "separator";
pub const OUTPUT_SEPARATOR: &str = "output_separator";
pub const PARALLEL: &str = "parallel";

pub const KEYS: [&str; 7] = [
    COLUMNS,
    INPUT_FILEPATH,
    MARKET_FILEPATH,
    OUTPUT_FILEPATH,
    SEPARATOR,
    OUTPUT_SEPARATOR,
    PARALLEL,
];

/// GeoNames postal code dump layout
pub const DEFAULT_COLUMNS: [&str; 12] = [
    "country_code",
    "postal_code",
    "place_name",
    "admin_name_1",
    "admin_code_1",
    "admin_name_2",
    "admin_code_2",
    "admin_name_3",
    "admin_code_3",
    "latitude",
    "longitude",
    "accuracy",
];

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub columns: Vec<String>,
    pub input_filepath: PathBuf,
    pub market_filepath: PathBuf,
    pub output_filepath: PathBuf,
    pub separator: u8,
    pub output_separator: u8,
    pub parallel: bool,
}

impl Config {
    /// Resolve command line > environment > config file > defaults.
    ///
    /// A missing config file is treated as an empty source.
    pub fn load(cli: ConfigSource, config_path: &Path) -> Result<Self, ConfigError> {
        LayeredConfig::new(vec![
            cli,
            ConfigSource::from_env(),
            ConfigSource::from_toml_file(config_path)?,
            ConfigSource::defaults(),
        ])
        .resolve()
    }
}

/// A raw, unvalidated setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
}

/// One layer of configuration values
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub name: String,
    values: HashMap<String, RawValue>,
}

/// Shape of the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    columns: Option<FileColumns>,
    input_filepath: Option<String>,
    market_filepath: Option<String>,
    output_filepath: Option<String>,
    separator: Option<String>,
    output_separator: Option<String>,
    parallel: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileColumns {
    List(Vec<String>),
    Text(String),
}

impl ConfigSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: RawValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Set `key` only when a value is present
    pub fn set_opt(&mut self, key: &str, value: Option<RawValue>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn with(mut self, key: &str, value: RawValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `MARKETMAP_*` variables of the current process
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Environment-style source from explicit pairs; unknown keys are ignored.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut source = Self::new("environment");
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_ascii_lowercase();
            if KEYS.contains(&key.as_str()) {
                source.set(&key, RawValue::Text(value));
            }
        }
        source
    }

    /// Load a TOML config file. A file that does not exist yields an empty
    /// source.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new(path.display().to_string()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &content)
    }

    /// Parse TOML text; `path` names the source in errors.
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut source = Self::new(path.display().to_string());
        source.set_opt(
            COLUMNS,
            file.columns.map(|c| match c {
                FileColumns::List(list) => RawValue::List(list),
                FileColumns::Text(text) => RawValue::Text(text),
            }),
        );
        source.set_opt(INPUT_FILEPATH, file.input_filepath.map(RawValue::Text));
        source.set_opt(MARKET_FILEPATH, file.market_filepath.map(RawValue::Text));
        source.set_opt(OUTPUT_FILEPATH, file.output_filepath.map(RawValue::Text));
        source.set_opt(SEPARATOR, file.separator.map(RawValue::Text));
        source.set_opt(OUTPUT_SEPARATOR, file.output_separator.map(RawValue::Text));
        source.set_opt(PARALLEL, file.parallel.map(RawValue::Bool));
        Ok(source)
    }

    /// Built-in defaults
    pub fn defaults() -> Self {
        let text = |s: &str| RawValue::Text(s.to_string());
        Self::new("defaults")
            .with(
                COLUMNS,
                RawValue::List(DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()),
            )
            .with(INPUT_FILEPATH, text("input/us_zipcodes.csv"))
            .with(MARKET_FILEPATH, text("input/nielsen-dma-markets.geo.json"))
            .with(OUTPUT_FILEPATH, text("output/postal_codes_to_markets.csv"))
            .with(SEPARATOR, text("\t"))
            .with(OUTPUT_SEPARATOR, text(","))
            .with(PARALLEL, RawValue::Bool(false))
    }
}

/// Ordered sources, highest priority first
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    sources: Vec<ConfigSource>,
}

impl LayeredConfig {
    pub fn new(sources: Vec<ConfigSource>) -> Self {
        Self { sources }
    }

    /// First source holding `key`, with its value
    pub fn lookup(&self, key: &str) -> Option<(&ConfigSource, &RawValue)> {
        self.sources
            .iter()
            .find_map(|source| source.get(key).map(|value| (source, value)))
    }

    /// Validate and materialise every setting.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            columns: self.required(COLUMNS, parse_columns)?,
            input_filepath: self.required(INPUT_FILEPATH, parse_path)?,
            market_filepath: self.required(MARKET_FILEPATH, parse_path)?,
            output_filepath: self.required(OUTPUT_FILEPATH, parse_path)?,
            separator: self.required(SEPARATOR, parse_separator)?,
            output_separator: self.optional(OUTPUT_SEPARATOR, parse_separator)?.unwrap_or(b','),
            parallel: self.optional(PARALLEL, parse_bool)?.unwrap_or(false),
        })
    }

    fn required<T>(
        &self,
        key: &'static str,
        parse: fn(&RawValue) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        self.optional(key, parse)?.ok_or(ConfigError::MissingKey { key })
    }

    fn optional<T>(
        &self,
        key: &'static str,
        parse: fn(&RawValue) -> Result<T, String>,
    ) -> Result<Option<T>, ConfigError> {
        let Some((source, value)) = self.lookup(key) else {
            return Ok(None);
        };
        parse(value)
            .map(Some)
            .map_err(|reason| ConfigError::InvalidValue {
                key: key.to_string(),
                source_name: source.name.clone(),
                reason,
            })
    }
}

fn parse_columns(value: &RawValue) -> Result<Vec<String>, String> {
    let columns: Vec<String> = match value {
        RawValue::List(list) => list.iter().map(|c| c.trim().to_string()).collect(),
        RawValue::Text(text) => text
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        RawValue::Bool(_) => return Err("expected a list of column names".to_string()),
    };

    if columns.is_empty() {
        return Err("column list is empty".to_string());
    }
    if columns.iter().any(|c| c.is_empty()) {
        return Err("column names must not be empty".to_string());
    }
    Ok(columns)
}

fn parse_path(value: &RawValue) -> Result<PathBuf, String> {
    match value {
        RawValue::Text(text) if !text.trim().is_empty() => Ok(PathBuf::from(text.trim())),
        RawValue::Text(_) => Err("path is empty".to_string()),
        _ => Err("expected a file path".to_string()),
    }
}

/// Single-byte delimiter; `\t` (escaped) and `tab` also mean tab.
pub fn parse_separator(value: &RawValue) -> Result<u8, String> {
    let RawValue::Text(text) = value else {
        return Err("expected a single character".to_string());
    };
    match text.as_str() {
        "\\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => Err(format!("separator must be a single ASCII character, got {:?}", s)),
    }
}

fn parse_bool(value: &RawValue) -> Result<bool, String> {
    match value {
        RawValue::Bool(b) => Ok(*b),
        RawValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(format!("expected true or false, got {:?}", other)),
        },
        RawValue::List(_) => Err("expected true or false".to_string()),
    }
}
