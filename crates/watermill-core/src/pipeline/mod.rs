//! Watermarking pipeline components.
//!
//! - **discovery**: Find usable images in a directory tree
//! - **decode** / **encode** / **metadata**: Format adapters and EXIF passthrough
//! - **compositor**: Pure sizing, placement and blending
//! - **conflict**: Handling of outputs that already exist
//! - **validate** / **watermark**: Pre-run checks and the shared logo
//! - **processor**: The per-file pipeline
//! - **scheduler** / **channel**: Bounded fan-out, progress and cancellation

pub mod channel;
pub mod compositor;
pub mod conflict;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod metadata;
pub mod processor;
pub mod scheduler;
pub mod validate;
pub mod watermark;

// Re-exports for convenient access
pub use channel::{CancelToken, ProgressEvent, RunStage};
pub use conflict::{ConflictAction, ConflictResolver};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{Discovery, FileDiscovery};
pub use encode::Encoder;
pub use metadata::MetadataExtractor;
pub use processor::{output_stem, render_preview, ImageProcessor, ProcessOutcome};
pub use scheduler::{BatchOutcome, BatchRequest, Scheduler};
pub use validate::Validator;
pub use watermark::Watermark;
