/*!
# Pulsar Engine

Core traits and types for the Pulsar real-time rendering engine.

This crate provides the platform-agnostic frame lifecycle: the swap image
chain and frame orchestration, the window/device/pipeline trait seams, and
the scene layer (game objects, shared geometry, draw recording). Backend
implementations (Vulkan) live in separate crates and are wired in through
the traits.

## Architecture

- **WindowAdapter**: the engine's view of the platform window
- **GraphicsDevice**: factory trait for GPU resources
- **SwapImageChain / SwapChainFactory**: presentable images + recreation
- **CommandList**: frame command recording trait
- **Pipeline**: graphics pipeline trait
- **FrameOrchestrator**: the acquire -> record -> submit -> present cycle
- **Scene / RenderSystem**: objects, shared geometry, draw recording

The orchestrator absorbs swapchain death (resize, out-of-date surface,
minimized window) transparently: callers see at most a skipped frame.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod window;
pub mod graphics;
pub mod frame_orchestrator;
pub mod scene;

// Main pulsar namespace module
pub mod pulsar {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (global logger slot)
    pub use crate::engine::Engine;

    // Frame lifecycle
    pub use crate::frame_orchestrator::{FrameOrchestrator, FrameToken};

    // Window abstraction
    pub use crate::window::{Extent2d, WindowAdapter};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Graphics sub-module with all backend-facing types
    pub mod graphics {
        pub use crate::graphics::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
