//! S3 file storage.
//!
//! Objects are written under a per-organization prefix:
//! `<organization_id>/<folder>/<uuid>-<sanitized file name>`. Reads go
//! through short-lived presigned URLs, and a tenant can only presign keys
//! under its own prefix.

use std::time::Duration;

use aws_sdk_s3::{Client, presigning::PresigningConfig, primitives::ByteStream};
use uuid::Uuid;

use crate::{config::Config, error::AppError, models::file::FileFolder};

/// Lifetime of presigned download URLs.
pub const PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct FileStorage {
    client: Client,
    bucket: String,
    max_upload_bytes: usize,
}

impl FileStorage {
    /// Build the S3 client, or `None` when no bucket is configured.
    pub async fn from_config(config: &Config) -> Option<Self> {
        let bucket = config.aws_s3_bucket.clone()?;

        let mut loader = aws_config::from_env();
        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        // Custom endpoints (MinIO, R2) expect path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.aws_endpoint_url.is_some())
            .build();

        Some(Self {
            client: Client::from_conf(s3_config),
            bucket,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key, "S3 upload failed");
                AppError::Storage("upload failed".to_string())
            })?;
        Ok(())
    }

    pub async fn presigned_get(&self, key: &str) -> Result<String, AppError> {
        let presign = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| AppError::Storage(format!("invalid presign config: {e}")))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key, "S3 presign failed");
                AppError::Storage("could not create download URL".to_string())
            })?;
        Ok(request.uri().to_string())
    }
}

/// Keep ASCII letters, digits, dot, dash and underscore; everything else
/// becomes `-`. Never empty, at most 100 characters.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

pub fn object_key(organization_id: Uuid, folder: FileFolder, file_name: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        organization_id,
        folder.as_str(),
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// A tenant may only read keys under its own prefix.
pub fn key_belongs_to(organization_id: Uuid, key: &str) -> bool {
    let prefix = format!("{organization_id}/");
    key.starts_with(&prefix) && !key.contains("..")
}

/// Content type guessed from the file name; only images and PDF are accepted.
pub fn allowed_content_type(file_name: &str) -> Result<String, AppError> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let allowed = mime.type_() == mime_guess::mime::IMAGE
        || mime.essence_str() == "application/pdf";
    if !allowed {
        return Err(AppError::InvalidRequest(format!(
            "file type '{}' is not allowed; upload an image or a PDF",
            mime.essence_str()
        )));
    }
    Ok(mime.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("factura 001.pdf"), "factura-001.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\fotos\\moto roja.JPG"), "moto-roja.JPG");
        assert_eq!(sanitize_file_name("ñandú"), "and");
        assert_eq!(sanitize_file_name("///"), "file");
    }

    #[test]
    fn test_object_key_layout() {
        let org = Uuid::from_u128(7);
        let key = object_key(org, FileFolder::Tickets, "ticket.png");
        assert!(key.starts_with(&format!("{org}/tickets/")));
        assert!(key.ends_with("-ticket.png"));
        assert!(key_belongs_to(org, &key));
        assert!(!key_belongs_to(Uuid::from_u128(8), &key));
    }

    #[test]
    fn test_key_belongs_rejects_traversal() {
        let org = Uuid::from_u128(7);
        assert!(!key_belongs_to(org, &format!("{org}/../other/file.png")));
    }

    #[test]
    fn test_allowed_content_types() {
        assert_eq!(allowed_content_type("a.pdf").unwrap(), "application/pdf");
        assert_eq!(allowed_content_type("a.jpg").unwrap(), "image/jpeg");
        assert!(allowed_content_type("a.exe").is_err());
        assert!(allowed_content_type("noextension").is_err());
    }
}
