use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::gpu::CompiledProgram;
use crate::shader::ParameterDescriptor;

/// Lock that survives a panicked holder; shared state stays usable for display
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// AIDEV-NOTE: Pausable animation clock shared by both renderers
#[derive(Debug, Clone)]
pub struct PreviewClock {
    start: Instant,
    paused_at: Option<Instant>,
}

impl PreviewClock {
    pub fn new(now: Instant) -> Self {
        Self {
            start: now,
            paused_at: None,
        }
    }

    pub fn elapsed(&self, now: Instant) -> f32 {
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(self.start).as_secs_f32()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        match self.paused_at.take() {
            Some(paused_at) => self.start += now.saturating_duration_since(paused_at),
            None => self.paused_at = Some(now),
        }
    }

    /// Back to zero, keeping the paused state
    pub fn restart(&mut self, now: Instant) {
        self.start = now;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }
}

/// Pointer in normalized coordinates, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer(pub [f32; 2]);

impl Default for Pointer {
    fn default() -> Self {
        Self([0.5, 0.5])
    }
}

impl Pointer {
    /// Move by whole units of a `width`x`height` grid whose y axis points down
    pub fn move_by(&mut self, dx: i32, dy: i32, width: u32, height: u32) {
        let [x, y] = &mut self.0;
        *x = (*x + dx as f32 / width.max(1) as f32).clamp(0.0, 1.0);
        *y = (*y - dy as f32 / height.max(1) as f32).clamp(0.0, 1.0);
    }

    /// Set from a position in a y-down grid
    pub fn set_from(&mut self, x: f32, y: f32, width: u32, height: u32) {
        self.0 = [
            (x / width.max(1) as f32).clamp(0.0, 1.0),
            (1.0 - y / height.max(1) as f32).clamp(0.0, 1.0),
        ];
    }
}

#[derive(Debug, Clone)]
pub struct FrameData {
    /// Tightly packed RGBA8, row 0 at the top
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

// AIDEV-NOTE: GPU→Terminal frame handoff; unread frames are replaced, never queued
#[derive(Default)]
pub struct SharedFrameBuffer {
    next_frame: Option<FrameData>,
    frames_dropped: u64,
}

impl SharedFrameBuffer {
    pub fn write_frame(&mut self, frame: FrameData) {
        if self.next_frame.replace(frame).is_some() {
            self.frames_dropped += 1;
        }
    }

    pub fn take_frame(&mut self) -> Option<FrameData> {
        self.next_frame.take()
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}

// AIDEV-NOTE: Terminal→GPU state. The terminal thread owns the session and pushes
// snapshots here; the GPU thread only reads them.
pub struct SharedRenderState {
    pending_program: Option<CompiledProgram>,
    params: Vec<ParameterDescriptor>,
    params_revision: u64,
    pub clock: PreviewClock,
    pub pointer: Pointer,
    pub viewport: (u32, u32),
    pub shutdown: bool,
}

impl SharedRenderState {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            pending_program: None,
            params: Vec::new(),
            params_revision: 0,
            clock: PreviewClock::new(Instant::now()),
            pointer: Pointer::default(),
            viewport,
            shutdown: false,
        }
    }

    pub fn submit_program(&mut self, program: CompiledProgram) {
        self.pending_program = Some(program);
    }

    pub fn take_program(&mut self) -> Option<CompiledProgram> {
        self.pending_program.take()
    }

    pub fn set_params(&mut self, params: &[ParameterDescriptor], revision: u64) {
        if revision != self.params_revision {
            self.params = params.to_vec();
            self.params_revision = revision;
        }
    }

    /// Parameters newer than `seen`
    pub fn params_since(&self, seen: u64) -> Option<(u64, Vec<ParameterDescriptor>)> {
        (self.params_revision != seen).then(|| (self.params_revision, self.params.clone()))
    }
}

pub type SharedFrameBufferHandle = Arc<Mutex<SharedFrameBuffer>>;
pub type SharedRenderStateHandle = Arc<Mutex<SharedRenderState>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadEvent {
    PipelineReady,
    PipelineError(String),
    GpuError(String),
    TerminalError(String),
    Shutdown,
}

pub type EventSender = std::sync::mpsc::Sender<ThreadEvent>;
pub type EventReceiver = std::sync::mpsc::Receiver<ThreadEvent>;

/// Frames per second over a sliding one-second window
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    frames: VecDeque<Instant>,
}

const FPS_WINDOW: Duration = Duration::from_secs(1);

impl PerformanceTracker {
    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now());
    }

    pub fn record_frame_at(&mut self, now: Instant) {
        self.frames.push_back(now);
        while let Some(&oldest) = self.frames.front() {
            if now.duration_since(oldest) > FPS_WINDOW {
                self.frames.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn fps(&self) -> f32 {
        match (self.frames.front(), self.frames.back()) {
            (Some(first), Some(last)) if self.frames.len() > 1 => {
                let span = last.duration_since(*first).as_secs_f32();
                if span > 0.0 {
                    (self.frames.len() - 1) as f32 / span
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

pub type PerformanceTrackerHandle = Arc<Mutex<PerformanceTracker>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_pause_resume() {
        let t0 = Instant::now();
        let mut clock = PreviewClock::new(t0);
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(2)), 2.0);

        clock.toggle_pause(t0 + Duration::from_secs(2));
        assert!(clock.is_paused());
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(10)), 2.0);

        clock.toggle_pause(t0 + Duration::from_secs(10));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(11)), 3.0);
    }

    #[test]
    fn test_clock_restart_keeps_pause() {
        let t0 = Instant::now();
        let mut clock = PreviewClock::new(t0);
        clock.toggle_pause(t0 + Duration::from_secs(5));
        clock.restart(t0 + Duration::from_secs(6));
        assert!(clock.is_paused());
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(9)), 0.0);
    }

    #[test]
    fn test_pointer_moves_y_up() {
        let mut pointer = Pointer::default();
        pointer.move_by(10, -10, 100, 100);
        assert_eq!(pointer.0, [0.6, 0.6]);

        pointer.move_by(-1000, 1000, 100, 100);
        assert_eq!(pointer.0, [0.0, 0.0]);

        pointer.set_from(25.0, 0.0, 100, 50);
        assert_eq!(pointer.0, [0.25, 1.0]);
    }

    #[test]
    fn test_frame_buffer_drops_unread() {
        let mut buffer = SharedFrameBuffer::default();
        let frame = FrameData {
            pixels: vec![0; 4],
            width: 1,
            height: 1,
        };
        buffer.write_frame(frame.clone());
        buffer.write_frame(frame);
        assert_eq!(buffer.frames_dropped(), 1);
        assert!(buffer.take_frame().is_some());
        assert!(buffer.take_frame().is_none());
    }

    #[test]
    fn test_params_since() {
        let mut state = SharedRenderState::new((4, 4));
        assert!(state.params_since(0).is_none());
        state.set_params(&[], 3);
        assert_eq!(state.params_since(0).map(|(r, _)| r), Some(3));
        assert!(state.params_since(3).is_none());
    }

    #[test]
    fn test_fps() {
        let t0 = Instant::now();
        let mut tracker = PerformanceTracker::default();
        for i in 0..=10 {
            tracker.record_frame_at(t0 + Duration::from_millis(i * 50));
        }
        assert!((tracker.fps() - 20.0).abs() < 0.01);
    }
}
