use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use regex::Regex;

use crate::repositories::asset_store::AssetStore;
use crate::{Error, Result};

/// MIME types accepted for upload.
pub const ALLOWED_IMAGE_TYPES: [&str; 8] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
];

/// An image file handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Validates, encodes, and persists uploaded images.
#[derive(Clone)]
pub struct ImageService {
    assets: Arc<dyn AssetStore>,
    max_upload_bytes: u64,
}

impl ImageService {
    pub fn new(assets: Arc<dyn AssetStore>, max_upload_bytes: u64) -> Self {
        Self {
            assets,
            max_upload_bytes,
        }
    }

    /// Validate `file`, encode it as a data URI, and persist it under a
    /// generated key. Resolves with the data URI itself, which callers
    /// use directly as an image source or inline in post content.
    /// Nothing is written when any validation step fails.
    pub async fn upload(&self, file: &UploadFile) -> Result<String> {
        if file.name.is_empty() || file.bytes.is_empty() {
            return Err(Error::InvalidInput);
        }
        if file.bytes.len() as u64 > self.max_upload_bytes {
            return Err(Error::FileTooLarge {
                size: file.bytes.len() as u64,
                limit: self.max_upload_bytes,
            });
        }
        if !ALLOWED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
            return Err(Error::UnsupportedType {
                given: file.content_type.clone(),
                allowed: ALLOWED_IMAGE_TYPES.join(", "),
            });
        }

        let key = asset_key(&file.name);
        let data_uri = format!(
            "data:{};base64,{}",
            file.content_type,
            STANDARD.encode(&file.bytes)
        );
        self.assets.put(&key, &data_uri).await?;
        Ok(data_uri)
    }
}

/// Canonical asset key: upload time in epoch millis plus the original
/// file name with whitespace runs collapsed to hyphens. Unique in
/// practice; collisions are not checked for.
pub fn asset_key(file_name: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        whitespace_re().replace_all(file_name, "-")
    )
}

/// A candidate image path is usable if it is a data URI, an absolute
/// URL, or rooted at a local path. Anything else (empty string, bare
/// file name) fails and gets the placeholder substituted instead.
pub fn is_valid_image_path(path: &str, image_dir: &str) -> bool {
    path.starts_with("data:image/")
        || path.starts_with("http")
        || path.starts_with(image_dir)
        || path.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::asset_store::InMemoryAssetStore;

    fn service() -> (Arc<InMemoryAssetStore>, ImageService) {
        let assets = Arc::new(InMemoryAssetStore::new());
        let service = ImageService::new(assets.clone(), 5 * 1024 * 1024);
        (assets, service)
    }

    fn png(name: &str, bytes: Vec<u8>) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes,
        }
    }

    #[tokio::test]
    async fn upload_persists_and_returns_the_data_uri() {
        let (assets, service) = service();
        let data_uri = service.upload(&png("logo.png", vec![1, 2, 3])).await.unwrap();
        assert_eq!(data_uri, "data:image/png;base64,AQID");

        let stored = assets.iterate_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        let (key, value) = stored.iter().next().unwrap();
        assert!(key.ends_with("-logo.png"));
        assert_eq!(value, &data_uri);
    }

    #[tokio::test]
    async fn uploaded_payload_decodes_back_to_the_original_bytes() {
        let (assets, service) = service();
        let bytes = vec![0u8, 255, 42, 7, 99];
        service.upload(&png("raw.png", bytes.clone())).await.unwrap();

        let stored = assets.iterate_all().await.unwrap();
        let value = stored.values().next().unwrap();
        let payload = value.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_without_persisting() {
        let (assets, service) = service();
        let file = png("big.png", vec![0u8; 5 * 1024 * 1024 + 1]);
        let err = service.upload(&file).await.unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
        assert_eq!(assets.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_with_the_allowed_set() {
        let (assets, service) = service();
        let file = UploadFile {
            name: "movie.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: vec![1],
        };
        let err = service.upload(&file).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("video/mp4"));
        assert!(message.contains("image/svg+xml"));
        assert_eq!(assets.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_file_is_invalid_input() {
        let (_, service) = service();
        let err = service.upload(&png("empty.png", vec![])).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput));

        let err = service.upload(&png("", vec![1])).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput));
    }

    #[test]
    fn asset_key_collapses_whitespace_to_hyphens() {
        let key = asset_key("my  holiday photo.jpg");
        let name = key.splitn(2, '-').nth(1).unwrap();
        assert_eq!(name, "my-holiday-photo.jpg");
        assert!(key.split('-').next().unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn path_validity_predicate() {
        assert!(is_valid_image_path("data:image/png;base64,AQID", "/images"));
        assert!(is_valid_image_path("https://example.com/a.png", "/images"));
        assert!(is_valid_image_path("/images/a.png", "/images"));
        assert!(is_valid_image_path("/avatar-placeholder.jpg", "/images"));
        assert!(!is_valid_image_path("", "/images"));
        assert!(!is_valid_image_path("a.png", "/images"));
    }
}
