/// Frame orchestrator - the frame lifecycle state machine
///
/// Owns the swap image chain and the per-slot command lists, and drives the
/// acquire -> record -> submit -> present cycle. Swapchain death (window
/// resize, out-of-date surface, minimized window) is absorbed here: callers
/// see at most a skipped frame, never an error, while the chain is rebuilt
/// underneath them.
///
/// The four-call protocol per frame is:
///
/// ```ignore
/// if let Some(token) = orchestrator.begin_frame()? {
///     orchestrator.begin_render_pass(&token)?;
///     // record draw commands on orchestrator.current_command_list()
///     orchestrator.end_render_pass(&token)?;
///     orchestrator.end_frame(token)?;
/// }
/// ```
///
/// Misuse of the protocol (nested begin_frame, a call without a frame in
/// progress, a token from another frame) is a programming bug and panics.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics::{
    AcquireResult, CommandList, GraphicsDevice, PresentResult, SwapChainFactory, SwapImageChain,
};
use crate::window::{Extent2d, WindowAdapter};
use crate::{engine_info, engine_warn};

const SOURCE: &str = "pulsar::FrameOrchestrator";

/// Proof that begin_frame succeeded, consumed by end_frame
///
/// Not copyable: one token, one frame.
pub struct FrameToken {
    slot: usize,
}

/// Frame lifecycle state machine
pub struct FrameOrchestrator {
    window: Arc<Mutex<dyn WindowAdapter>>,
    device: Arc<Mutex<dyn GraphicsDevice>>,
    factory: Box<dyn SwapChainFactory>,
    /// None only transiently inside recreate_swap_chain
    chain: Option<Box<dyn SwapImageChain>>,
    command_lists: Vec<Box<dyn CommandList>>,
    current_image_index: u32,
    current_slot: usize,
    frame_started: bool,
    suboptimal_acquired: bool,
    surface_formats_changed: bool,
}

impl FrameOrchestrator {
    /// Create the orchestrator, building the initial chain
    ///
    /// Blocks on window events while the extent is degenerate (window
    /// created minimized), then builds the chain and one command list per
    /// swap image.
    ///
    /// # Arguments
    ///
    /// * `window` - Window adapter providing extent and resize events
    /// * `device` - Graphics device for command list allocation
    /// * `factory` - Factory that builds swap image chains
    pub fn new(
        window: Arc<Mutex<dyn WindowAdapter>>,
        device: Arc<Mutex<dyn GraphicsDevice>>,
        mut factory: Box<dyn SwapChainFactory>,
    ) -> Result<Self> {
        let extent = Self::wait_for_valid_extent(&window)?;
        let chain = factory.build(extent, None)?;
        let image_count = chain.image_count();

        let command_lists = device
            .lock()
            .map_err(|_| Error::Backend("device lock poisoned".to_string()))?
            .allocate_command_lists(image_count)?;

        engine_info!(
            SOURCE,
            "Frame orchestrator created: {} swap images at {}x{}",
            image_count,
            extent.width,
            extent.height
        );

        Ok(Self {
            window,
            device,
            factory,
            chain: Some(chain),
            command_lists,
            current_image_index: 0,
            current_slot: 0,
            frame_started: false,
            suboptimal_acquired: false,
            surface_formats_changed: false,
        })
    }

    /// The current swap image chain
    pub fn chain(&self) -> &dyn SwapImageChain {
        self.chain
            .as_deref()
            .expect("swap image chain is always present outside recreation")
    }

    /// True between a successful begin_frame and its end_frame
    pub fn frame_in_progress(&self) -> bool {
        self.frame_started
    }

    /// The command list recording the current frame
    ///
    /// Panics when no frame is in progress.
    pub fn current_command_list(&mut self) -> &mut dyn CommandList {
        assert!(
            self.frame_started,
            "current_command_list called with no frame in progress"
        );
        self.command_lists[self.current_slot].as_mut()
    }

    /// Take the pending surface-formats-changed notification, clearing it
    ///
    /// Raised when recreation produced a chain whose attachment formats
    /// differ from the previous chain's. Pipelines built against the old
    /// chain are invalid and must be rebuilt before the next frame.
    pub fn take_surface_formats_changed(&mut self) -> bool {
        std::mem::take(&mut self.surface_formats_changed)
    }

    /// Begin a frame: acquire the next swap image and start recording
    ///
    /// Returns `None` when the frame must be skipped: the window extent is
    /// degenerate, or the chain was out of date and has been recreated.
    /// Callers simply try again next iteration.
    ///
    /// Panics when a frame is already in progress.
    pub fn begin_frame(&mut self) -> Result<Option<FrameToken>> {
        assert!(
            !self.frame_started,
            "begin_frame called while a frame is already in progress"
        );

        // A degenerate extent means no surface to render to; skip without
        // touching the chain.
        let extent = self
            .window
            .lock()
            .map_err(|_| Error::Backend("window lock poisoned".to_string()))?
            .extent();
        if extent.is_degenerate() {
            return Ok(None);
        }

        let chain = self
            .chain
            .as_mut()
            .expect("swap image chain is always present outside recreation");

        let image_index = match chain.acquire_next_image()? {
            AcquireResult::Ready(index) => index,
            AcquireResult::Suboptimal(index) => {
                // Still render this frame; recreate after present.
                self.suboptimal_acquired = true;
                index
            }
            AcquireResult::OutOfDate => {
                engine_warn!(SOURCE, "Swap image chain out of date at acquire, recreating");
                self.recreate_swap_chain()?;
                return Ok(None);
            }
        };

        self.current_image_index = image_index;
        self.frame_started = true;
        self.command_lists[self.current_slot].begin()?;

        Ok(Some(FrameToken {
            slot: self.current_slot,
        }))
    }

    /// Record the render pass entry for the current frame
    ///
    /// Panics when the token does not belong to the frame in progress.
    pub fn begin_render_pass(&mut self, token: &FrameToken) -> Result<()> {
        self.check_token(token);
        let chain = self
            .chain
            .as_deref()
            .expect("swap image chain is always present outside recreation");
        chain.begin_render_pass(
            self.command_lists[self.current_slot].as_mut(),
            self.current_image_index,
        )
    }

    /// Record the render pass exit for the current frame
    ///
    /// Panics when the token does not belong to the frame in progress.
    pub fn end_render_pass(&mut self, token: &FrameToken) -> Result<()> {
        self.check_token(token);
        self.command_lists[self.current_slot].end_render_pass()
    }

    /// End the frame: submit, present, and handle chain death
    ///
    /// An out-of-date or suboptimal present, or a pending window resize,
    /// triggers transparent recreation; the frame itself has already been
    /// presented (or dropped by the presentation engine) either way.
    pub fn end_frame(&mut self, token: FrameToken) -> Result<()> {
        self.check_token(&token);

        let cmd = self.command_lists[self.current_slot].as_mut();
        cmd.end()?;

        let chain = self
            .chain
            .as_mut()
            .expect("swap image chain is always present outside recreation");
        let present = chain.submit(cmd, self.current_image_index)?;

        self.frame_started = false;

        let resized = self
            .window
            .lock()
            .map_err(|_| Error::Backend("window lock poisoned".to_string()))?
            .take_resize_flag();
        let suboptimal = std::mem::take(&mut self.suboptimal_acquired);

        if resized
            || suboptimal
            || matches!(present, PresentResult::OutOfDate | PresentResult::Suboptimal)
        {
            self.recreate_swap_chain()?;
            // Recreation reset the slot ring; do not advance past it.
            return Ok(());
        }

        self.current_slot = (self.current_slot + 1) % self.command_lists.len();
        Ok(())
    }

    fn check_token(&self, token: &FrameToken) {
        assert!(
            self.frame_started,
            "frame lifecycle call with no frame in progress"
        );
        assert_eq!(
            token.slot, self.current_slot,
            "frame token does not match the frame in progress"
        );
    }

    /// Block on window events until the extent is non-degenerate
    fn wait_for_valid_extent(window: &Arc<Mutex<dyn WindowAdapter>>) -> Result<Extent2d> {
        loop {
            let extent = window
                .lock()
                .map_err(|_| Error::Backend("window lock poisoned".to_string()))?
                .extent();
            if !extent.is_degenerate() {
                return Ok(extent);
            }
            window
                .lock()
                .map_err(|_| Error::Backend("window lock poisoned".to_string()))?
                .wait_events();
        }
    }

    /// Rebuild the chain wholesale at the current window extent
    ///
    /// Single recovery path for resize, out-of-date and suboptimal. Waits
    /// for the device to go idle, hands the old chain to the factory as a
    /// creation hint, and reconciles the command list pool only when the
    /// image count changed.
    fn recreate_swap_chain(&mut self) -> Result<()> {
        let extent = Self::wait_for_valid_extent(&self.window)?;

        self.device
            .lock()
            .map_err(|_| Error::Backend("device lock poisoned".to_string()))?
            .wait_idle()?;

        let previous = self.chain.take();
        let previous_formats = previous.as_ref().map(|c| c.surface_formats());

        let chain = self.factory.build(extent, previous)?;

        if let Some(old_formats) = previous_formats {
            if chain.surface_formats() != old_formats {
                engine_warn!(
                    SOURCE,
                    "Surface formats changed during recreation; dependent pipelines must be rebuilt"
                );
                self.surface_formats_changed = true;
            }
        }

        let image_count = chain.image_count();
        self.chain = Some(chain);

        if self.command_lists.len() != image_count {
            self.command_lists.clear();
            self.command_lists = self
                .device
                .lock()
                .map_err(|_| Error::Backend("device lock poisoned".to_string()))?
                .allocate_command_lists(image_count)?;
        }

        // The new chain starts its slot ring at zero; follow it.
        self.current_slot = 0;

        // A recreation at the current extent satisfies any pending resize.
        let _ = self
            .window
            .lock()
            .map_err(|_| Error::Backend("window lock poisoned".to_string()))?
            .take_resize_flag();

        engine_info!(
            SOURCE,
            "Swap image chain recreated: {} images at {}x{}",
            image_count,
            extent.width,
            extent.height
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_orchestrator_tests.rs"]
mod tests;
