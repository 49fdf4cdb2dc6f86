pub mod rest;

use crate::error::StorageError;
use crate::search::slug;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use rest::RestObjectStorage;

/// Binary storage for listing photos
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;
    fn public_url(&self, path: &str) -> String;
    fn bucket(&self) -> &str;
}

/// Object key for a new photo: `<property_id>/<unix millis>-<slugified name>.<ext>`
pub fn photo_path(
    property_id: &str,
    file_name: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<String, StorageError> {
    let property_id = property_id.trim();
    if property_id.is_empty() || property_id.contains('/') {
        return Err(StorageError::InvalidPath(format!("property id {:?}", property_id)));
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (file_name, None),
    };

    let stem = slug::slugify(stem);
    if stem.is_empty() {
        return Err(StorageError::InvalidPath(format!("file name {:?}", file_name)));
    }

    let mut key = format!("{}/{}-{}", property_id, uploaded_at.timestamp_millis(), stem);
    if let Some(extension) = extension.map(slug::slugify).filter(|e| !e.is_empty()) {
        key.push('.');
        key.push_str(&extension);
    }
    Ok(key)
}

/// MIME type guessed from the extension
pub fn content_type(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn photo_paths_are_scoped_and_sanitised() {
        let path = photo_path("imv-001", "Fachada Frontal (1).JPG", at()).unwrap();
        assert_eq!(path, "imv-001/1714564800000-fachada-frontal-1.jpg");

        let path = photo_path("imv-001", "sem_extensao", at()).unwrap();
        assert_eq!(path, "imv-001/1714564800000-sem-extensao");
    }

    #[test]
    fn rejects_unusable_names() {
        assert!(photo_path("", "a.jpg", at()).is_err());
        assert!(photo_path("a/b", "a.jpg", at()).is_err());
        assert!(photo_path("imv-001", "???.png", at()).is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("a/b.JPG"), "image/jpeg");
        assert_eq!(content_type("a/b.webp"), "image/webp");
        assert_eq!(content_type("a/b"), "application/octet-stream");
    }
}
