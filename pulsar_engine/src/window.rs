/// Window adapter trait - the engine's view of the platform window
///
/// The engine never talks to a windowing library directly. Everything it
/// needs from the window goes through this trait: the framebuffer extent,
/// event pumping, the close request, and a one-shot resize flag that the
/// frame orchestrator polls after each present.

/// Framebuffer extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    /// Create a new extent
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (minimized or mid-resize window)
    ///
    /// A degenerate extent means no swapchain can exist: frame acquisition
    /// is skipped entirely and recreation waits until the extent becomes
    /// non-degenerate again.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Platform window abstraction
///
/// Implemented by the application (e.g. over winit) and by test doubles.
pub trait WindowAdapter: Send + Sync {
    /// Current framebuffer extent in pixels
    fn extent(&self) -> Extent2d;

    /// True once the user has requested the window to close
    fn should_close(&self) -> bool;

    /// Process pending window events without blocking
    fn poll_events(&mut self);

    /// Block until at least one window event arrives
    ///
    /// Used by the swapchain recreation path to sleep while the window is
    /// minimized instead of busy-spinning.
    fn wait_events(&mut self);

    /// Take the pending resize notification, clearing it
    ///
    /// Returns true at most once per resize. The caller acting on the flag
    /// (triggering swapchain recreation) is what consumes it; an unrelated
    /// reader must not observe a stale resize.
    fn take_resize_flag(&mut self) -> bool;
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
