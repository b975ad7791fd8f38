mod volume;
pub use volume::{ArrayLoader, NpyLoader, Volume};
mod render;
pub use render::{coolwarm, trim_whitespace, Caption, ColorScale, HeatmapRenderer, SliceRenderer};
mod sampler;
pub use sampler::sample_indices;
mod animation;
pub use animation::{AnimationEncoder, GifAnimator};
mod config;
pub use config::{DataSplit, RenderTarget, RunConfig};
mod logger;
pub use logger::RunLogger;
mod driver;
pub use driver::{BatchDriver, RunSummary};

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("array file not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("failed to read or write file: {0}")]
    Read(#[from] std::io::Error),
    #[error("array shape does not match its data: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("failed to encode or decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to serialize configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to move {from:?} to {to:?}: {source}")]
    Persist {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
