pub mod asset_store;
pub mod record_store;
