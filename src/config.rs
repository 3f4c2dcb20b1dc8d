use std::env;
use std::path::PathBuf;

/// Runtime settings for the blog storage layer.
///
/// The defaults reproduce the constants the original deployment shipped
/// with; only the data directory and the upload limit are expected to
/// vary between installations, so those two can be overridden from the
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the record files and the asset database.
    pub data_dir: PathBuf,
    /// Upper bound for a single image upload, in bytes.
    pub max_upload_bytes: u64,
    /// Path prefix that marks an image reference as internal.
    pub image_dir: String,
    /// Cover image substituted when a candidate fails validity checks.
    pub placeholder_image: String,
    /// Record key for the current post collection.
    pub posts_key: String,
    /// Record key for the legacy numeric-id post collection.
    pub legacy_posts_key: String,
    /// File name of the embedded asset database inside `data_dir`.
    pub database_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_upload_bytes: 5 * 1024 * 1024,
            image_dir: "/images".to_string(),
            placeholder_image: "/avatar-placeholder.jpg".to_string(),
            posts_key: "blogPosts".to_string(),
            legacy_posts_key: "blog_posts".to_string(),
            database_file: "blogDatabase.redb".to_string(),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn init() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("BLOGVAULT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(max) = env::var("BLOGVAULT_MAX_UPLOAD_BYTES") {
            if let Ok(max) = max.parse() {
                config.max_upload_bytes = max;
            }
        }
        config
    }

    /// Full path of the embedded asset database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}
