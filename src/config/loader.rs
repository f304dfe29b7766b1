use super::types::*;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Failed to parse TOML config file: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("'{field}' is required for {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid placeholder '{0}'")]
    InvalidPlaceholder(String),

    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("{0:?} is not writeable")]
    NotWritable(PathBuf),

    #[error("Credential configuration error: {0}")]
    Credentials(String),

    #[error("Configuration inheritance cycle: {0}")]
    InheritanceCycle(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load, merge (`extends`) and validate a configuration document
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let mut chain = Vec::new();
    let document = load_document(path.as_ref(), &mut chain)?;
    let config: Config = serde_yaml::from_value(document)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load a single document and recursively apply its `extends` base
fn load_document(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Value> {
    let canonical = fs::canonicalize(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if chain.contains(&canonical) {
        let mut names: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
        names.push(canonical.display().to_string());
        return Err(ConfigError::InheritanceCycle(names.join(" -> ")));
    }
    chain.push(canonical.clone());

    let contents = fs::read_to_string(&canonical).map_err(|source| ConfigError::ReadError {
        path: canonical.clone(),
        source,
    })?;
    let mut document = parse_document(&canonical, &contents)?;

    let base_path = match &mut document {
        Value::Mapping(map) => match map.remove(&Value::from("extends")) {
            Some(Value::String(base)) => Some(base),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(ConfigError::ValidationError(format!(
                    "'extends' must be a path, got {:?}",
                    other
                )))
            }
        },
        _ => None,
    };

    if let Some(base) = base_path {
        let base = resolve_relative(&canonical, Path::new(&base));
        debug!("Config {:?} extends {:?}", canonical, base);
        let base_document = load_document(&base, chain)?;
        document = merge(base_document, document);
    }

    chain.pop();
    Ok(document)
}

fn parse_document(path: &Path, contents: &str) -> Result<Value> {
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let value = if is_toml {
        toml::from_str::<Value>(contents)?
    } else {
        serde_yaml::from_str::<Value>(contents)?
    };

    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Err(ConfigError::ValidationError(format!(
            "Config file {:?} is empty",
            path
        ))),
        _ => Err(ConfigError::ValidationError(format!(
            "Config file {:?} must contain a mapping at the top level",
            path
        ))),
    }
}

fn resolve_relative(document: &Path, target: &Path) -> PathBuf {
    let target = super::expand_tilde(target);
    if target.is_absolute() {
        return target;
    }
    document
        .parent()
        .map(|dir| dir.join(&target))
        .unwrap_or(target)
}

/// Merge two documents: top-level keys of `override_doc` replace those of `base`
pub fn merge(base: Value, override_doc: Value) -> Value {
    match (base, override_doc) {
        (Value::Mapping(mut base), Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                if key.as_str() == Some("extends") {
                    continue;
                }
                base.insert(key, value);
            }
            Value::Mapping(base)
        }
        (_, override_doc) => override_doc,
    }
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.source.is_empty() {
        return Err(ConfigError::ValidationError(
            "No sources defined".to_string(),
        ));
    }

    if config.destination.is_empty() {
        return Err(ConfigError::ValidationError(
            "No destinations defined".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in &config.source {
        validate_source(source)?;
        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }
    }

    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<()> {
    if source.name.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "name".to_string(),
            context: "source".to_string(),
        });
    }

    if source.include.is_empty() {
        return Err(ConfigError::MissingField {
            field: "include".to_string(),
            context: format!("source {}", source.name),
        });
    }

    Ok(())
}
