use crate::config::{AmazonS3Options, ConfigError};

/// `s3://<bucket>` or `s3://<bucket>/<prefix>`
pub fn s3_root(options: &AmazonS3Options) -> Result<String, ConfigError> {
    let bucket = options
        .bucket
        .as_deref()
        .filter(|bucket| !bucket.is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: "bucket".to_string(),
            context: "amazons3 store".to_string(),
        })?;

    let root = match options.prefix.as_deref().map(|p| p.trim_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("s3://{}/{}", bucket, prefix),
        _ => format!("s3://{}", bucket),
    };

    Ok(root)
}
