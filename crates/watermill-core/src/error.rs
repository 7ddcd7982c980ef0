//! Error types for the Watermill watermarking pipeline.
//!
//! Errors are organized by when they can happen: configuration problems stop
//! a run before it starts, pipeline errors are confined to a single file, and
//! report errors surface after the images have already been written.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Watermill operations.
#[derive(Error, Debug)]
pub enum WatermillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Log or archive errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors. Any of these aborts a run before it starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse a preset file
    #[error("Failed to parse preset: {0}")]
    PresetError(#[from] serde_json::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Input, output or watermark paths are unusable
    #[error("{0}")]
    InvalidPaths(String),

    /// The watermark file exists but cannot be used
    #[error("Invalid watermark {path}: {message}")]
    Watermark { path: PathBuf, message: String },
}

/// Per-file processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Writing an output file failed
    #[error("Write error for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Another source in the same batch already writes this output
    #[error("Output {output} is already written by {claimed_by} in this batch")]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        claimed_by: PathBuf,
    },

    /// The worker running this file stopped unexpectedly
    #[error("Worker failed for {path}: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Errors raised while writing the processing log or the archive.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Convenience type alias for Watermill results.
pub type Result<T> = std::result::Result<T, WatermillError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
