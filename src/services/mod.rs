pub mod images;
pub mod posts;
pub mod render;
