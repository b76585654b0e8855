use std::io;

/// All error types for the obj-baker pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    #[error("Missing image data for material '{material}'")]
    MissingImageData { material: String },
    #[error("Inconsistent tile geometry: {0}")]
    InconsistentTreeGeometry(String),
    #[error(
        "Texture coordinate {index} is shared by materials '{first}' and '{second}'"
    )]
    UnresolvedSharedCoordinate {
        index: u32,
        first: String,
        second: String,
    },
    #[error("Input error: {0}")]
    Input(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BakeError>;
