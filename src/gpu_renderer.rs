use std::time::{Duration, Instant};

use anyhow::Result;

use crate::gpu::{
    BuiltinUniforms, CompiledProgram, GpuDevice, OffscreenTarget, ShaderPipeline, UniformBuffer,
    OFFSCREEN_FORMAT,
};
use crate::shader::ParameterDescriptor;
use crate::threading::{
    lock, EventSender, FrameData, PerformanceTrackerHandle, SharedFrameBufferHandle,
    SharedRenderStateHandle, ThreadEvent,
};

// AIDEV-NOTE: GPU renderer runs in a dedicated thread, drawing offscreen and handing
// RGBA frames to the terminal thread
pub struct GpuRenderer {
    gpu_device: GpuDevice,
    target: OffscreenTarget,
    builtins: UniformBuffer,
    pipeline: Option<ShaderPipeline>,
    params: Vec<ParameterDescriptor>,
    params_seen: u64,
}

impl GpuRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let gpu_device = GpuDevice::new_blocking()?;
        let target = OffscreenTarget::new(&gpu_device.device, width, height);
        let builtins = UniformBuffer::for_builtins(&gpu_device.device);

        Ok(Self {
            gpu_device,
            target,
            builtins,
            pipeline: None,
            params: Vec::new(),
            params_seen: 0,
        })
    }

    /// Swap in a new program; on failure the previous pipeline keeps running
    pub fn load_program(&mut self, program: &CompiledProgram) -> Result<()> {
        let pipeline = ShaderPipeline::new(
            &self.gpu_device.device,
            program,
            &self.builtins,
            OFFSCREEN_FORMAT,
        )?;
        self.pipeline = Some(pipeline);
        self.upload_params(program);
        Ok(())
    }

    fn upload_params(&self, program: &CompiledProgram) {
        if let Some(pipeline) = &self.pipeline {
            pipeline
                .params_buffer
                .write(&self.gpu_device.queue, &program.layout.pack(&self.params));
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.target.width, self.target.height) {
            self.target = OffscreenTarget::new(&self.gpu_device.device, width, height);
        }
    }

    pub fn render_frame(&self, builtins: &BuiltinUniforms) -> Result<Option<FrameData>> {
        let Some(pipeline) = &self.pipeline else {
            return Ok(None);
        };

        self.builtins.update_builtins(&self.gpu_device.queue, builtins);

        let mut encoder =
            self.gpu_device
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Offscreen Encoder"),
                });
        pipeline.draw(&mut encoder, &self.target.view);
        self.target.copy_to_readback(&mut encoder);
        self.gpu_device.queue.submit(Some(encoder.finish()));

        let pixels = self.target.read_pixels_blocking(&self.gpu_device.device)?;
        Ok(Some(FrameData {
            pixels,
            width: self.target.width,
            height: self.target.height,
        }))
    }

    // AIDEV-NOTE: Main GPU thread function; exits when the shared state asks for shutdown
    pub fn run_gpu_thread(
        mut self,
        frame_buffer: SharedFrameBufferHandle,
        render_state: SharedRenderStateHandle,
        event_sender: EventSender,
        performance_tracker: Option<PerformanceTrackerHandle>,
    ) {
        let mut current_program: Option<CompiledProgram> = None;

        loop {
            let (program, params, builtins, viewport) = {
                let mut state = lock(&render_state);
                if state.shutdown {
                    break;
                }
                let (width, height) = state.viewport;
                let builtins = BuiltinUniforms::new(
                    width,
                    height,
                    state.clock.elapsed(Instant::now()),
                    state.pointer.0,
                );
                (
                    state.take_program(),
                    state.params_since(self.params_seen),
                    builtins,
                    state.viewport,
                )
            };

            self.resize(viewport.0, viewport.1);

            if let Some((revision, params)) = params {
                self.params_seen = revision;
                self.params = params;
                if let Some(program) = &current_program {
                    self.upload_params(program);
                }
            }

            if let Some(program) = program {
                match self.load_program(&program) {
                    Ok(()) => {
                        current_program = Some(program);
                        let _ = event_sender.send(ThreadEvent::PipelineReady);
                    }
                    Err(e) => {
                        log::error!("{e:#}");
                        let _ = event_sender.send(ThreadEvent::PipelineError(format!("{e:#}")));
                    }
                }
            }

            match self.render_frame(&builtins) {
                Ok(Some(frame)) => {
                    lock(&frame_buffer).write_frame(frame);
                    if let Some(tracker) = &performance_tracker {
                        lock(tracker).record_frame();
                    }
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(16)),
                Err(e) => {
                    let _ = event_sender.send(ThreadEvent::GpuError(format!("{e:#}")));
                    // Keep the thread alive; back off to roughly 60 FPS
                    std::thread::sleep(Duration::from_millis(16));
                }
            }

            std::thread::yield_now();
        }

        log::debug!("GPU thread stopped");
    }
}
