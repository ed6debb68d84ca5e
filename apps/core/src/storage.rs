//! File-backed object storage for uploaded prescriptions and reports.
//!
//! Objects live under `<data>/storage/<bucket>/<file_name>` and are
//! addressed by a public URL of the form
//! `<public_base>/storage/v1/object/public/<bucket>/<file_name>`. Records
//! keep only that URL, so deletion re-derives the object path from it.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::fs_manager::PortablePathManager;

/// Path segment between the public base URL and the bucket name.
pub const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public/";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Prescriptions,
    Reports,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Prescriptions, Bucket::Reports];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Prescriptions => "prescriptions",
            Bucket::Reports => "reports",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown bucket: {s}")))
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub file_name: String,
    pub public_url: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    paths: PortablePathManager,
    public_base: String,
}

impl ObjectStore {
    pub fn new(paths: PortablePathManager, public_base: &Url) -> Self {
        Self {
            paths,
            public_base: public_base.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.paths(), &config.storage_public_url)
    }

    /// Store `bytes` under a freshly generated `<uuid>.<ext>` name.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> AppResult<StoredObject> {
        if bytes.is_empty() {
            return Err(AppError::Validation("cannot upload an empty file".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(format!(
                "file is larger than {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let sniffed = infer::get(bytes);
        let extension = extension_of(original_name)
            .or_else(|| sniffed.map(|t| t.extension().to_string()))
            .unwrap_or_else(|| "bin".to_string());
        let content_type = sniffed
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| content_type_for_extension(&extension).to_string());

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.paths.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let public_url = self.public_url(bucket, &file_name);
        info!(%bucket, %file_name, %content_type, "Object uploaded");

        Ok(StoredObject {
            bucket,
            file_name,
            public_url,
            content_type,
            size: bytes.len(),
        })
    }

    pub fn public_url(&self, bucket: Bucket, file_name: &str) -> String {
        format!(
            "{}{}{}/{}",
            self.public_base, PUBLIC_OBJECT_PREFIX, bucket, file_name
        )
    }

    /// Re-derive `(bucket, file_name)` from a public URL issued by this store.
    pub fn object_path_from_url(&self, url: &str) -> AppResult<(Bucket, String)> {
        let prefix = format!("{}{}", self.public_base, PUBLIC_OBJECT_PREFIX);
        let rest = url
            .strip_prefix(&prefix)
            .ok_or_else(|| AppError::Validation(format!("not a storage URL: {url}")))?;

        // Query strings and fragments are not part of the object name.
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (bucket, file_name) = rest
            .split_once('/')
            .ok_or_else(|| AppError::Validation(format!("storage URL has no object: {url}")))?;

        let bucket = bucket.parse::<Bucket>()?;
        if !is_safe_file_name(file_name) {
            return Err(AppError::Validation(format!(
                "invalid object name: {file_name}"
            )));
        }
        Ok((bucket, file_name.to_string()))
    }

    /// Location on disk of the object behind `url`.
    pub fn local_path(&self, url: &str) -> AppResult<PathBuf> {
        let (bucket, file_name) = self.object_path_from_url(url)?;
        Ok(self.paths.bucket_dir(bucket).join(file_name))
    }

    pub async fn download(&self, url: &str) -> AppResult<Vec<u8>> {
        let path = self.local_path(url)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| missing_object(e, &path))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> AppResult<()> {
        let path = self.local_path(url)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| missing_object(e, &path))?;
        info!("Object deleted");
        Ok(())
    }
}

fn missing_object(err: io::Error, path: &Path) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        warn!(path = %path.display(), "Object not found");
        AppError::not_found("object", path.display().to_string())
    } else {
        AppError::Io(err)
    }
}

/// Lowercased extension of an uploaded file name, if it looks sane.
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Object names are single path segments without hidden-file or parent
/// references.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_round_trip() {
        for bucket in Bucket::ALL {
            assert_eq!(bucket.as_str().parse::<Bucket>().unwrap(), bucket);
        }
        assert!("avatars".parse::<Bucket>().is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Scan.PDF"), Some("pdf".to_string()));
        assert_eq!(extension_of("photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(extension_of("no_extension"), None);
        assert_eq!(extension_of("weird.p%f"), None);
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for_extension("pdf"), "application/pdf");
        assert_eq!(content_type_for_extension("xyz"), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("0b6f7c1e-9a7d-4c55-8d0e-1f2a3b4c5d6e.pdf"));
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("../secret.txt"));
        assert!(!is_safe_file_name("a/b.pdf"));
        assert!(!is_safe_file_name("a\\b.pdf"));
    }
}
