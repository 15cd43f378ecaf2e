/// Winit-backed implementation of the engine's WindowAdapter trait
///
/// Lives behind `Arc<Mutex<..>>` shared between the event loop (which
/// feeds resize and close notifications in) and the frame orchestrator
/// (which polls them).

use pulsar_engine::pulsar::{Extent2d, WindowAdapter};
use std::sync::Arc;
use std::time::Duration;
use winit::window::Window;

pub struct WinitWindowAdapter {
    window: Arc<Window>,
    resize_pending: bool,
    close_requested: bool,
}

impl WinitWindowAdapter {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            resize_pending: false,
            close_requested: false,
        }
    }

    /// Record a resize notification from the event loop
    pub fn notify_resized(&mut self) {
        self.resize_pending = true;
    }

    /// Record a close request from the event loop
    #[allow(dead_code)]
    pub fn notify_close_requested(&mut self) {
        self.close_requested = true;
    }
}

impl WindowAdapter for WinitWindowAdapter {
    fn extent(&self) -> Extent2d {
        let size = self.window.inner_size();
        Extent2d::new(size.width, size.height)
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn poll_events(&mut self) {
        // Event pumping happens in winit's ApplicationHandler loop
    }

    fn wait_events(&mut self) {
        // Called while the window is minimized. The real events arrive
        // through the ApplicationHandler; sleeping here just keeps the
        // recreation spin from burning a core.
        std::thread::sleep(Duration::from_millis(50));
    }

    fn take_resize_flag(&mut self) -> bool {
        std::mem::take(&mut self.resize_pending)
    }
}
