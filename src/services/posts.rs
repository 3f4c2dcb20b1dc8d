use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use tracing::{error, warn};
use validator::Validate;

use crate::config::Config;
use crate::models::post::{LegacyPost, Post, PostDraft, RenderedPost};
use crate::repositories::asset_store::AssetStore;
use crate::repositories::record_store::TextRecordStore;
use crate::services::images::is_valid_image_path;
use crate::services::render::ContentRenderer;
use crate::{Error, Result};

/// Any Markdown image reference, internal or external.
fn image_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\(([^\s\)\]\}]+)\)").expect("valid regex"))
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn hyphen_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid regex"))
}

/// Derive a URL-safe slug from a post title: lowercase, strip everything
/// but word characters, whitespace, and hyphens, collapse whitespace and
/// hyphen runs to single hyphens, trim edge hyphens.
///
/// Deterministic, so duplicate titles produce duplicate ids; the store
/// does not deduplicate them.
pub fn generate_id(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = non_word_re().replace_all(&lowered, "");
    let hyphenated = whitespace_re().replace_all(&stripped, "-");
    let collapsed = hyphen_run_re().replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// CRUD over the post collection, coordinating the record store, the
/// asset store, and the renderer.
///
/// Mutations read the whole stored collection, modify it, and write it
/// back. The two steps are not atomic; interleaved mutations are
/// last-write-wins.
#[derive(Clone)]
pub struct PostService {
    records: Arc<dyn TextRecordStore>,
    assets: Arc<dyn AssetStore>,
    renderer: ContentRenderer,
    posts_key: String,
    legacy_posts_key: String,
    image_dir: String,
    placeholder_image: String,
}

impl PostService {
    pub fn new(
        records: Arc<dyn TextRecordStore>,
        assets: Arc<dyn AssetStore>,
        config: &Config,
    ) -> Self {
        Self {
            records,
            assets,
            renderer: ContentRenderer::new(&config.image_dir),
            posts_key: config.posts_key.clone(),
            legacy_posts_key: config.legacy_posts_key.clone(),
            image_dir: config.image_dir.clone(),
            placeholder_image: config.placeholder_image.clone(),
        }
    }

    /// All stored records in stored order, raw (no rendering). A missing
    /// key, unreadable store, or malformed blob reads as empty.
    pub fn get_all_posts(&self) -> Vec<Post> {
        self.load_collection(&self.posts_key)
    }

    /// Posts stored under the legacy `blog_posts` key. Read-only; the
    /// legacy schema is never merged into the current one.
    pub fn get_legacy_posts(&self) -> Vec<LegacyPost> {
        self.load_collection(&self.legacy_posts_key)
    }

    /// Load a post and enrich it for display: coerce an invalid cover
    /// image to the placeholder, resolve internal image references
    /// against the asset store, and render the content to HTML.
    ///
    /// An absent id is `Ok(None)`. If the asset store cannot be read the
    /// post still renders, with unresolved references and the
    /// placeholder cover; that failure class never reaches the caller.
    pub async fn get_post_by_id(&self, id: &str) -> Result<Option<RenderedPost>> {
        let posts = self.get_all_posts();
        let Some(mut post) = posts.into_iter().find(|post| post.id == id) else {
            return Ok(None);
        };

        if !is_valid_image_path(&post.cover_image, &self.image_dir) {
            post.cover_image = self.placeholder_image.clone();
        }

        match self.assets.iterate_all().await {
            Ok(assets) => {
                post.content = self.renderer.resolve_images(&post.content, &assets);
            }
            Err(err) => {
                warn!("failed to load image storage, rendering unresolved content: {err}");
                post.cover_image = self.placeholder_image.clone();
            }
        }

        let html = self.renderer.render(&post.content);
        Ok(Some(RenderedPost { post, html }))
    }

    /// Create a post from `draft`, returning the generated id.
    ///
    /// Every internal image reference in the content must already exist
    /// in the asset store; the first missing one aborts the create with
    /// no write.
    pub async fn create_post(&self, draft: PostDraft) -> Result<String> {
        draft.validate()?;
        let id = generate_id(&draft.title);

        self.check_content_images(&draft.content).await?;

        let post = self.normalize(id.clone(), draft);
        let mut posts = self.get_all_posts();
        posts.push(post);
        self.save_posts(&posts)?;

        Ok(id)
    }

    /// Replace the post with the given id, preserving the id. Same
    /// validation and normalization as create.
    pub async fn update_post(&self, id: &str, draft: PostDraft) -> Result<()> {
        draft.validate()?;

        let mut posts = self.get_all_posts();
        let Some(index) = posts.iter().position(|post| post.id == id) else {
            return Err(Error::PostNotFound(id.to_string()));
        };

        self.check_content_images(&draft.content).await?;

        posts[index] = self.normalize(id.to_string(), draft);
        self.save_posts(&posts)
    }

    /// Remove the post with the given id. Assets it referenced stay in
    /// the asset store; nothing garbage-collects them.
    pub fn delete_post(&self, id: &str) -> Result<()> {
        let mut posts = self.get_all_posts();
        posts.retain(|post| post.id != id);
        self.save_posts(&posts)
    }

    /// Every internal image reference in `content` must resolve to an
    /// existing asset, checked one match at a time.
    async fn check_content_images(&self, content: &str) -> Result<()> {
        for caps in image_ref_re().captures_iter(content) {
            let path = &caps[2];
            if !path.starts_with(&self.image_dir) {
                continue;
            }
            let Some(name) = path.rsplit('/').next() else {
                continue;
            };
            if !self.assets.contains(name).await? {
                return Err(Error::ImageNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    /// Apply the write-time defaults: invalid cover becomes the
    /// placeholder, date defaults to today, template to standard.
    fn normalize(&self, id: String, draft: PostDraft) -> Post {
        let cover_image = match draft.cover_image {
            Some(cover) if is_valid_image_path(&cover, &self.image_dir) => cover,
            _ => self.placeholder_image.clone(),
        };
        Post {
            id,
            title: draft.title,
            date: draft.date.unwrap_or_else(|| Utc::now().date_naive()),
            summary: draft.summary,
            content: draft.content,
            template: draft.template.unwrap_or_default(),
            cover_image,
        }
    }

    fn load_collection<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.records.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("failed to read record storage under {key}: {err}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!("malformed record storage under {key}, treating as empty: {err}");
                Vec::new()
            }
        }
    }

    fn save_posts(&self, posts: &[Post]) -> Result<()> {
        let raw = serde_json::to_string(posts).map_err(|err| Error::Storage(err.to_string()))?;
        self.records.set(&self.posts_key, &raw).map_err(|err| {
            error!("failed to store posts data: {err}");
            Error::Storage(err.to_string())
        })
    }
}
