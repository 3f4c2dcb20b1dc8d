use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Presentation layout for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Standard,
    Photo,
    Tech,
}

/// A stored blog post.
///
/// `date` serializes as an ISO `YYYY-MM-DD` string. Rendered HTML is
/// never part of this record; see [`RenderedPost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub summary: String,
    pub content: String,
    #[serde(default)]
    pub template: Template,
    #[serde(rename = "coverImage")]
    pub cover_image: String,
}

/// A post enriched for display: internal image references in `content`
/// resolved against the asset store and `html` rendered from the result.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    #[serde(flatten)]
    pub post: Post,
    pub html: String,
}

/// Input for creating or updating a post. The id is derived from the
/// title on create and preserved on update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostDraft {
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Summary is required."))]
    pub summary: String,
    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,
    pub template: Option<Template>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<String>,
}

/// Record shape of the earlier `blog_posts` store: auto-incrementing
/// numeric ids and no template field. A separate, non-interoperable
/// schema version; never merged into [`Post`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPost {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub summary: String,
    pub content: String,
    #[serde(
        rename = "coverImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image: Option<String>,
}
