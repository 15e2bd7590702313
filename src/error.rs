//! Error types for the playground.
//!
//! Asset problems are recoverable: loaders log them and fall back to an empty
//! mesh or a blank texture. Configuration, replay files and viewer start-up
//! report errors to the caller.

use thiserror::Error;

/// Errors that can occur while parsing an OBJ file.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A coordinate or index could not be parsed.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },
    /// A `v`, `vt` or `vn` statement had too few components.
    #[error("line {line}: missing vector component")]
    MissingComponent { line: usize },
    /// A face referenced a vertex, uv or normal that does not exist.
    #[error("line {line}: index {index} out of range")]
    IndexOutOfRange { line: usize, index: i64 },
    /// A face with fewer than three corners.
    #[error("line {line}: face needs at least 3 vertices")]
    DegenerateFace { line: usize },
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode image data.
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// The asset source had no such file.
    #[error("Texture file not found: {0}")]
    NotFound(String),
}

/// Errors that can occur while reading the app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for [`crate::AppConfig`].
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while saving or loading an input recording.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to read or write the recording file.
    #[error("Failed to access recording: {0}")]
    Io(#[from] std::io::Error),
    /// The recording could not be (de)serialized.
    #[error("Invalid recording: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when starting the interactive viewer.
#[cfg(feature = "viewer")]
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12/GL support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The playback file could not be read, or the recording not saved.
    #[error(transparent)]
    Replay(#[from] ReplayError),
}
