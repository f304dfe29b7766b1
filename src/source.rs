//! Backup sources: named sets of include/exclude patterns with an error policy

use crate::config::{ConfigError, ErrorPolicy, SourceConfig};
use crate::error::{BackupError, Result};
use crate::managers::notification::Alerter;
use crate::utils::glob;
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;
use tracing::debug;

/// One piece of an include pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    Month,
    Day,
    Latest,
}

/// Include pattern parsed once at construction so bad placeholders fail early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse `%Y`, `%m`, `%d`, `%LATEST` (also written `%{Y}` or `%{LATEST}`).
    /// A `%` not followed by a letter or `{` is kept literally.
    pub fn parse(pattern: &str) -> std::result::Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => return Err(ConfigError::InvalidPlaceholder(after.to_string())),
                }
            } else if after.starts_with("LATEST") {
                ("LATEST", "LATEST".len())
            } else {
                match after.chars().next() {
                    Some(c) if c.is_ascii_alphabetic() => (&after[..1], 1),
                    _ => {
                        literal.push('%');
                        rest = after;
                        continue;
                    }
                }
            };

            let segment = match name {
                "Y" => Segment::Year,
                "m" => Segment::Month,
                "d" => Segment::Day,
                "LATEST" => Segment::Latest,
                other => return Err(ConfigError::InvalidPlaceholder(other.to_string())),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Substitute placeholders for the given run date
    pub fn render(&self, now: NaiveDate) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Year => format!("{:04}", now.year()),
                Segment::Month => format!("{:02}", now.month()),
                Segment::Day => format!("{:02}", now.day()),
                Segment::Latest => "LATEST".to_string(),
            })
            .collect()
    }

    /// The pattern as configured
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Substitute date placeholders in a single pattern
pub fn substitute_placeholders(pattern: &str, now: NaiveDate) -> std::result::Result<String, ConfigError> {
    Ok(PathTemplate::parse(pattern)?.render(now))
}

pub struct BackupSource {
    name: String,
    include: Vec<PathTemplate>,
    exclude: Vec<String>,
    on_error: ErrorPolicy,
    included: Vec<PathBuf>,
}

impl BackupSource {
    pub fn new(config: &SourceConfig) -> std::result::Result<Self, ConfigError> {
        if config.include.is_empty() {
            return Err(ConfigError::MissingField {
                field: "include".to_string(),
                context: format!("source {}", config.name),
            });
        }

        let include = config
            .include
            .iter()
            .map(|pattern| PathTemplate::parse(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            include,
            exclude: config.exclude.clone(),
            on_error: config.onerror,
            included: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_error(&self) -> ErrorPolicy {
        self.on_error
    }

    /// Paths resolved by the last call to [`Self::resolve_included_paths`]
    pub fn included_paths(&self) -> &[PathBuf] {
        &self.included
    }

    pub fn excluded_paths(&self) -> &[String] {
        &self.exclude
    }

    /// Expand every include pattern for `now`.
    ///
    /// A pattern matching nothing goes through the source's error policy;
    /// patterns are otherwise independent. Results keep pattern order, then
    /// match order.
    pub fn resolve_included_paths(&mut self, now: NaiveDate, alerter: &dyn Alerter) -> Result<&[PathBuf]> {
        let mut included = Vec::new();

        for template in &self.include {
            let pattern = template.render(now);
            let paths = glob::expand(&pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;

            if paths.is_empty() {
                self.handle_error(BackupError::Resolution { pattern }, None, alerter)?;
                continue;
            }

            for path in &paths {
                debug!("Including path {:?}", path);
            }
            included.extend(paths);
        }

        self.included = included;
        Ok(&self.included)
    }

    /// Apply the source's error policy. Returns the error when it must propagate.
    /// Fatal errors always propagate.
    pub fn handle_error(
        &self,
        error: BackupError,
        destination: Option<&str>,
        alerter: &dyn Alerter,
    ) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }

        match self.on_error {
            ErrorPolicy::Fail => Err(error),
            ErrorPolicy::Alert => {
                alerter.alert(&self.name, destination, &error);
                Ok(())
            }
            ErrorPolicy::Continue => {
                debug!("Ignoring error for source '{}': {}", self.name, error);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for BackupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupSource")
            .field("name", &self.name)
            .field("include", &self.include.iter().map(PathTemplate::as_str).collect::<Vec<_>>())
            .field("exclude", &self.exclude)
            .field("on_error", &self.on_error)
            .finish()
    }
}
