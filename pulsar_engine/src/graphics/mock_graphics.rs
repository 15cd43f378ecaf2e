/// Mock graphics backend for unit tests (no GPU required)
///
/// These doubles let the frame orchestrator, scene and render system be
/// tested in-process. The MockGpu keeps a simulated completion timeline so
/// fence-wait behavior (a frame slot blocking until its previous submission
/// completes) is observable from tests.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::graphics::{
    AcquireResult, CommandList, GeometryBuffer, GraphicsDevice, Pipeline, PipelineDesc,
    PresentResult, Rect2d, SurfaceFormats, SwapChainFactory, SwapImageChain, TextureFormat,
    Viewport,
};
use crate::window::{Extent2d, WindowAdapter};

// ============================================================================
// Simulated GPU timeline
// ============================================================================

/// One recorded fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceWait {
    /// Frame slot whose fence was waited on
    pub slot: usize,
    /// True when the wait actually blocked (work was still pending)
    pub blocked: bool,
}

/// Simulated GPU clock and per-slot completion times
///
/// `submit` schedules the slot's work to complete `submit_latency` ticks in
/// the future; `wait_fence` advances the clock to that completion time when
/// the work is still outstanding, recording whether it had to block.
pub struct MockGpu {
    pub clock: u64,
    /// Simulated execution time of one submission
    pub submit_latency: u64,
    /// Pending completion time per slot (None = fence already signaled)
    pending: Vec<Option<u64>>,
    /// Completion time of the last queued submission (the GPU executes
    /// submissions serially)
    queue_tail: u64,
    pub wait_log: Vec<FenceWait>,
    /// (slot, submitted_at, completes_at) per submission
    pub submit_log: Vec<(usize, u64, u64)>,
}

impl MockGpu {
    pub fn new(slot_count: usize, submit_latency: u64) -> Self {
        Self {
            clock: 0,
            submit_latency,
            pending: vec![None; slot_count],
            queue_tail: 0,
            wait_log: Vec::new(),
            submit_log: Vec::new(),
        }
    }

    /// Wait for the slot's fence, advancing the clock if work is pending
    pub fn wait_fence(&mut self, slot: usize) {
        let blocked = match self.pending[slot].take() {
            Some(completes_at) if completes_at > self.clock => {
                self.clock = completes_at;
                true
            }
            _ => false,
        };
        self.wait_log.push(FenceWait { slot, blocked });
    }

    /// Submit work on the slot, re-arming its fence
    ///
    /// Execution starts when the previously queued submission finishes.
    pub fn submit(&mut self, slot: usize) {
        let starts_at = self.clock.max(self.queue_tail);
        let completes_at = starts_at + self.submit_latency;
        self.queue_tail = completes_at;
        self.pending[slot] = Some(completes_at);
        self.submit_log.push((slot, self.clock, completes_at));
    }
}

// ============================================================================
// Shared recording state
// ============================================================================

/// Command log shared between the mock device, its command lists and the
/// mock chain, so tests can assert on the global recording order.
#[derive(Default)]
pub struct MockLog {
    pub commands: Vec<String>,
    /// Raw bytes of every push_constants call, in order
    pub push_data: Vec<Vec<u8>>,
}

pub type SharedLog = Arc<Mutex<MockLog>>;

pub fn new_shared_log() -> SharedLog {
    Arc::new(Mutex::new(MockLog::default()))
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    pub id: usize,
    log: SharedLog,
}

impl MockCommandList {
    pub fn new(id: usize, log: SharedLog) -> Self {
        Self { id, log }
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().commands.push(entry);
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.record(format!("cmd{}: begin", self.id));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.record(format!("cmd{}: end", self.id));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record(format!("cmd{}: end_render_pass", self.id));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!(
            "cmd{}: set_viewport {}x{}",
            self.id, viewport.width, viewport.height
        ));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2d) -> Result<()> {
        self.record(format!(
            "cmd{}: set_scissor {}x{}",
            self.id, scissor.width, scissor.height
        ));
        Ok(())
    }

    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.record(format!("cmd{}: bind_pipeline", self.id));
        Ok(())
    }

    fn push_constants(&mut self, _pipeline: &Arc<dyn Pipeline>, data: &[u8]) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.commands
            .push(format!("cmd{}: push_constants {} bytes", self.id, data.len()));
        log.push_data.push(data.to_vec());
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GeometryBuffer>) -> Result<()> {
        self.record(format!(
            "cmd{}: bind_vertex_buffer {} vertices",
            self.id,
            buffer.vertex_count()
        ));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.record(format!(
            "cmd{}: draw {} from {}",
            self.id, vertex_count, first_vertex
        ));
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// Mock Pipeline / GeometryBuffer
// ============================================================================

pub struct MockPipeline {
    pub push_constant_size: u32,
}

impl Pipeline for MockPipeline {
    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockGeometry {
    pub vertex_count: u32,
}

impl GeometryBuffer for MockGeometry {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockDevice {
    pub log: SharedLog,
    pub wait_idle_count: Arc<AtomicUsize>,
    next_list_id: usize,
}

impl MockDevice {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            wait_idle_count: Arc::new(AtomicUsize::new(0)),
            next_list_id: 0,
        }
    }
}

impl GraphicsDevice for MockDevice {
    fn wait_idle(&self) -> Result<()> {
        self.wait_idle_count.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .commands
            .push("device: wait_idle".to_string());
        Ok(())
    }

    fn allocate_command_lists(&mut self, count: usize) -> Result<Vec<Box<dyn CommandList>>> {
        self.log
            .lock()
            .unwrap()
            .commands
            .push(format!("device: allocate {} command lists", count));
        let mut lists: Vec<Box<dyn CommandList>> = Vec::with_capacity(count);
        for _ in 0..count {
            lists.push(Box::new(MockCommandList::new(
                self.next_list_id,
                self.log.clone(),
            )));
            self.next_list_id += 1;
        }
        Ok(lists)
    }

    fn create_geometry(
        &mut self,
        _vertex_data: &[u8],
        vertex_count: u32,
    ) -> Result<Arc<dyn GeometryBuffer>> {
        self.log
            .lock()
            .unwrap()
            .commands
            .push(format!("device: create_geometry {} vertices", vertex_count));
        Ok(Arc::new(MockGeometry { vertex_count }))
    }

    fn create_pipeline(
        &mut self,
        _chain: &dyn SwapImageChain,
        desc: &PipelineDesc,
    ) -> Result<Arc<dyn Pipeline>> {
        self.log
            .lock()
            .unwrap()
            .commands
            .push("device: create_pipeline".to_string());
        Ok(Arc::new(MockPipeline {
            push_constant_size: desc.push_constant_size,
        }))
    }
}

// ============================================================================
// Mock SwapImageChain
// ============================================================================

pub struct MockSwapChain {
    image_count: usize,
    extent: Extent2d,
    formats: SurfaceFormats,
    gpu: Arc<Mutex<MockGpu>>,
    log: SharedLog,
    live_chains: Arc<AtomicUsize>,
    current_slot: usize,
    next_image: usize,
    /// Scripted acquire outcomes, shared with the factory so tests can
    /// script the current chain through the orchestrator; when empty,
    /// images round-robin as Ready
    scripted_acquires: Arc<Mutex<VecDeque<ScriptedAcquire>>>,
    /// Scripted present outcomes; when empty, presents return Ready
    scripted_presents: Arc<Mutex<VecDeque<PresentResult>>>,
}

/// Scripted outcome for one acquire call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedAcquire {
    Ready,
    Suboptimal,
    OutOfDate,
}

impl Drop for MockSwapChain {
    fn drop(&mut self) {
        self.live_chains.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SwapImageChain for MockSwapChain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        // Fence discipline: the slot's previous submission must complete
        // before its command list can be reused.
        self.gpu.lock().unwrap().wait_fence(self.current_slot);

        let scripted = self
            .scripted_acquires
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedAcquire::Ready);

        if scripted == ScriptedAcquire::OutOfDate {
            self.log
                .lock()
                .unwrap()
                .commands
                .push("chain: acquire -> out_of_date".to_string());
            return Ok(AcquireResult::OutOfDate);
        }

        let image = self.next_image as u32;
        self.next_image = (self.next_image + 1) % self.image_count;
        self.log
            .lock()
            .unwrap()
            .commands
            .push(format!("chain: acquire image {}", image));

        Ok(match scripted {
            ScriptedAcquire::Suboptimal => AcquireResult::Suboptimal(image),
            _ => AcquireResult::Ready(image),
        })
    }

    fn submit(
        &mut self,
        _command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<PresentResult> {
        self.gpu.lock().unwrap().submit(self.current_slot);
        self.log.lock().unwrap().commands.push(format!(
            "chain: submit image {} (slot {})",
            image_index, self.current_slot
        ));
        self.current_slot = (self.current_slot + 1) % self.image_count;
        Ok(self
            .scripted_presents
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PresentResult::Ready))
    }

    fn begin_render_pass(
        &self,
        command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<()> {
        self.log.lock().unwrap().commands.push(format!(
            "chain: begin_render_pass image {} extent {}x{}",
            image_index, self.extent.width, self.extent.height
        ));
        command_list.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        })?;
        command_list.set_scissor(Rect2d {
            x: 0,
            y: 0,
            width: self.extent.width,
            height: self.extent.height,
        })?;
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn extent(&self) -> Extent2d {
        self.extent
    }

    fn surface_formats(&self) -> SurfaceFormats {
        self.formats
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock SwapChainFactory
// ============================================================================

pub struct MockChainFactory {
    pub image_count: usize,
    /// Formats stamped on every chain built; tests mutate this between
    /// builds to simulate a surface format change
    pub formats: Arc<Mutex<SurfaceFormats>>,
    pub submit_latency: u64,
    log: SharedLog,
    /// Extents of every chain built, in order
    pub built_extents: Arc<Mutex<Vec<Extent2d>>>,
    /// Number of builds that received a previous chain as hint
    pub builds_with_previous: Arc<AtomicUsize>,
    /// Chains currently alive (incremented on build, decremented on drop)
    pub live_chains: Arc<AtomicUsize>,
    /// GPU timeline shared by every chain this factory builds
    pub gpu: Arc<Mutex<MockGpu>>,
    /// Acquire script shared with every chain this factory builds
    pub scripted_acquires: Arc<Mutex<VecDeque<ScriptedAcquire>>>,
    /// Present script shared with every chain this factory builds
    pub scripted_presents: Arc<Mutex<VecDeque<PresentResult>>>,
}

impl MockChainFactory {
    pub fn new(image_count: usize, log: SharedLog) -> Self {
        Self {
            image_count,
            formats: Arc::new(Mutex::new(SurfaceFormats {
                color: TextureFormat::Bgra8Srgb,
                depth: TextureFormat::D32Float,
            })),
            submit_latency: 0,
            log,
            built_extents: Arc::new(Mutex::new(Vec::new())),
            builds_with_previous: Arc::new(AtomicUsize::new(0)),
            live_chains: Arc::new(AtomicUsize::new(0)),
            gpu: Arc::new(Mutex::new(MockGpu::new(image_count, 0))),
            scripted_acquires: Arc::new(Mutex::new(VecDeque::new())),
            scripted_presents: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Factory whose chains share a GPU timeline with the given latency
    pub fn with_latency(image_count: usize, submit_latency: u64, log: SharedLog) -> Self {
        let mut factory = Self::new(image_count, log);
        factory.submit_latency = submit_latency;
        factory.gpu = Arc::new(Mutex::new(MockGpu::new(image_count, submit_latency)));
        factory
    }
}

impl SwapChainFactory for MockChainFactory {
    fn build(
        &mut self,
        extent: Extent2d,
        previous: Option<Box<dyn SwapImageChain>>,
    ) -> Result<Box<dyn SwapImageChain>> {
        assert!(
            !extent.is_degenerate(),
            "chain build requested with degenerate extent {}x{}",
            extent.width,
            extent.height
        );

        if previous.is_some() {
            self.builds_with_previous.fetch_add(1, Ordering::SeqCst);
        }
        // The previous chain is consumed here; dropping it releases its
        // live_chains count, which is what the leak tests observe.
        drop(previous);

        self.built_extents.lock().unwrap().push(extent);
        self.live_chains.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .commands
            .push(format!("factory: build {}x{}", extent.width, extent.height));

        Ok(Box::new(MockSwapChain {
            image_count: self.image_count,
            extent,
            formats: *self.formats.lock().unwrap(),
            gpu: self.gpu.clone(),
            log: self.log.clone(),
            live_chains: self.live_chains.clone(),
            current_slot: 0,
            next_image: 0,
            scripted_acquires: self.scripted_acquires.clone(),
            scripted_presents: self.scripted_presents.clone(),
        }))
    }
}

// ============================================================================
// Mock WindowAdapter
// ============================================================================

pub struct MockWindow {
    pub extent: Extent2d,
    pub resize_pending: bool,
    pub close_requested: bool,
    /// Extents applied one-by-one on wait_events, simulating the window
    /// being restored while the recreation path sleeps
    pub extent_script: VecDeque<Extent2d>,
    pub wait_events_count: usize,
}

impl MockWindow {
    pub fn new(extent: Extent2d) -> Self {
        Self {
            extent,
            resize_pending: false,
            close_requested: false,
            extent_script: VecDeque::new(),
            wait_events_count: 0,
        }
    }
}

impl WindowAdapter for MockWindow {
    fn extent(&self) -> Extent2d {
        self.extent
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn poll_events(&mut self) {}

    fn wait_events(&mut self) {
        self.wait_events_count += 1;
        match self.extent_script.pop_front() {
            Some(extent) => self.extent = extent,
            None => panic!("wait_events called with no scripted extent (test would hang)"),
        }
    }

    fn take_resize_flag(&mut self) -> bool {
        std::mem::take(&mut self.resize_pending)
    }
}

#[cfg(test)]
#[path = "mock_graphics_tests.rs"]
mod tests;
