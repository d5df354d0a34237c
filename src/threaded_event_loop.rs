use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use anyhow::{anyhow, Context, Result};

use crate::config::Config;
use crate::gpu_renderer::GpuRenderer;
use crate::terminal_renderer::{viewport_for, TerminalRenderer};
use crate::threading::{
    lock, PerformanceTracker, SharedFrameBuffer, SharedRenderState, ThreadEvent,
};
use crate::workspace::Workspace;

// AIDEV-NOTE: Multi-threaded event loop with independent GPU and terminal threads; the
// main thread only waits for shutdown or a fatal terminal error
pub fn run_threaded_event_loop(
    shader_file: &Path,
    document: String,
    config: &Config,
    perf: bool,
) -> Result<()> {
    let (cols, rows) = crossterm::terminal::size().context("Failed to query terminal size")?;
    let viewport = viewport_for(cols, rows);

    let frame_buffer = Arc::new(Mutex::new(SharedFrameBuffer::default()));
    let render_state = Arc::new(Mutex::new(SharedRenderState::new(viewport)));
    let performance_tracker = perf.then(|| Arc::new(Mutex::new(PerformanceTracker::default())));

    let (main_sender, main_receiver) = mpsc::channel();
    let (gpu_sender, gpu_receiver) = mpsc::channel();

    // Initialize GPU before starting threads so device errors surface on the console
    let gpu_renderer = GpuRenderer::new(viewport.0, viewport.1)?;
    let workspace = Workspace::open(shader_file, document, config)?;

    let gpu_thread = {
        let frame_buffer = Arc::clone(&frame_buffer);
        let render_state = Arc::clone(&render_state);
        let tracker = performance_tracker.clone();
        thread::Builder::new()
            .name("gpu".to_string())
            .spawn(move || gpu_renderer.run_gpu_thread(frame_buffer, render_state, gpu_sender, tracker))
            .context("Failed to spawn GPU thread")?
    };

    let terminal_thread = {
        let frame_buffer = Arc::clone(&frame_buffer);
        let render_state = Arc::clone(&render_state);
        let terminal_renderer = TerminalRenderer::new(
            cols,
            rows,
            workspace,
            config.display.max_fps,
            performance_tracker,
        );
        thread::Builder::new()
            .name("terminal".to_string())
            .spawn(move || {
                terminal_renderer.run_terminal_thread(frame_buffer, render_state, main_sender, gpu_receiver)
            })
            .context("Failed to spawn terminal thread")?
    };

    let outcome = match main_receiver.recv() {
        Ok(ThreadEvent::TerminalError(msg)) => Err(anyhow!("Terminal error: {msg}")),
        // Shutdown, or the terminal thread is gone
        _ => Ok(()),
    };

    lock(&render_state).shutdown = true;
    if terminal_thread.join().is_err() {
        log::error!("Terminal thread panicked");
    }
    if gpu_thread.join().is_err() {
        log::error!("GPU thread panicked");
    }

    outcome
}
