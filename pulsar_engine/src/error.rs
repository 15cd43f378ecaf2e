//! Error types for the Pulsar engine
//!
//! This module defines the error types used throughout the engine,
//! including swapchain management, pipeline creation, and scene bookkeeping.
//!
//! Transient presentation conditions (out-of-date swapchain, suboptimal
//! swapchain, zero-sized window) are NOT errors — they are status values
//! handled by the swapchain recreation path. Protocol misuse (unpaired
//! begin/end calls, a frame token used against the wrong frame) is a
//! programming bug and aborts via assert rather than returning an error.

use std::fmt;

/// Result type for Pulsar engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pulsar engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, etc.)
    Backend(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (geometry, pipeline, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, backend, subsystems)
    InitializationFailed(String),

    /// Swapchain creation or recreation failed
    SwapchainCreation(String),

    /// Graphics pipeline creation failed
    PipelineCreation(String),

    /// Failed to load a compiled shader from disk
    ShaderLoad {
        /// Path of the shader file that failed to load
        path: String,
        /// Underlying failure description
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::SwapchainCreation(msg) => write!(f, "Swapchain creation failed: {}", msg),
            Error::PipelineCreation(msg) => write!(f, "Pipeline creation failed: {}", msg),
            Error::ShaderLoad { path, message } => {
                write!(f, "Failed to load shader '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
