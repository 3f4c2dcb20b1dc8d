//! Client-side blog content persistence and rendering, re-expressed as
//! an embedded library.
//!
//! Post records live as one serialized JSON blob in a text record store;
//! image payloads live as data URIs in an embedded transactional redb
//! database. The services wire the two together: upload validation and
//! encoding, internal image reference resolution, Markdown rendering,
//! and HTML sanitization.

pub use self::errors::{Error, Result};

pub mod config;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use config::Config;
use repositories::asset_store::{AssetStore, RedbAssetStore};
use repositories::record_store::{FileTextStore, TextRecordStore};
use services::images::ImageService;
use services::posts::PostService;

/// Shared application context: both stores opened once and the services
/// wired over them.
///
/// Built a single time at startup and passed to consumers by reference,
/// replacing the module-level singleton managers of the original design
/// while keeping single-instance-per-process semantics.
pub struct BlogContext {
    pub config: Config,
    pub assets: Arc<dyn AssetStore>,
    pub posts: PostService,
    pub images: ImageService,
}

impl BlogContext {
    /// Open both stores under `config.data_dir` and wire the services.
    pub fn init(config: Config) -> Result<Self> {
        let records: Arc<dyn TextRecordStore> =
            Arc::new(FileTextStore::open(config.data_dir.clone())?);
        let assets: Arc<dyn AssetStore> = Arc::new(RedbAssetStore::open(config.database_path())?);

        let posts = PostService::new(records, Arc::clone(&assets), &config);
        let images = ImageService::new(Arc::clone(&assets), config.max_upload_bytes);

        Ok(Self {
            config,
            assets,
            posts,
            images,
        })
    }
}
