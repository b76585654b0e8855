pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod packing;
pub mod pipeline;
pub mod types;

pub use config::{AtlasConfig, AtlasFormat, BakeConfig};
pub use error::BakeError;
pub use packing::pack_textures;
pub use pipeline::{BakeSummary, Pipeline};
