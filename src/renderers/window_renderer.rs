use std::time::Instant;

use anyhow::{Context, Result};

use crate::gpu::{CompiledProgram, GpuDevice, ShaderPipeline, UniformBuffer};
use crate::shader::ParameterDescriptor;
use crate::threading::PerformanceTracker;

use super::window::{SurfaceManager, WindowState};

// AIDEV-NOTE: WindowRenderer draws the user program straight to the surface with the
// fullscreen-triangle pipeline; the last good pipeline survives failed reloads.
pub struct WindowRenderer {
    surface_manager: SurfaceManager,
    gpu_device: GpuDevice,
    builtins: UniformBuffer,
    pipeline: Option<(ShaderPipeline, CompiledProgram)>,
    params: Vec<ParameterDescriptor>,
    performance_tracker: Option<PerformanceTracker>,
}

impl WindowRenderer {
    pub fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        window_size: (u32, u32),
        enable_performance_tracking: bool,
    ) -> Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("No GPU adapter compatible with the window surface")?;

        log::info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("shaderlab window device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: Default::default(),
        }))
        .context("Failed to create GPU device")?;

        let gpu_device = GpuDevice { device, queue };
        let surface_manager = SurfaceManager::new(surface, adapter);
        surface_manager.configure(&gpu_device.device, window_size.0, window_size.1);
        let builtins = UniformBuffer::for_builtins(&gpu_device.device);

        Ok(Self {
            surface_manager,
            gpu_device,
            builtins,
            pipeline: None,
            params: Vec::new(),
            performance_tracker: enable_performance_tracking.then(PerformanceTracker::default),
        })
    }

    pub fn load_program(&mut self, program: CompiledProgram) -> Result<()> {
        let pipeline = ShaderPipeline::new(
            &self.gpu_device.device,
            &program,
            &self.builtins,
            self.surface_manager.format(),
        )?;
        self.pipeline = Some((pipeline, program));
        self.upload_params();
        Ok(())
    }

    pub fn set_params(&mut self, params: &[ParameterDescriptor]) {
        self.params = params.to_vec();
        self.upload_params();
    }

    fn upload_params(&self) {
        if let Some((pipeline, program)) = &self.pipeline {
            pipeline
                .params_buffer
                .write(&self.gpu_device.queue, &program.layout.pack(&self.params));
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_manager
            .configure(&self.gpu_device.device, width, height);
    }

    pub fn fps(&self) -> Option<f32> {
        self.performance_tracker.as_ref().map(PerformanceTracker::fps)
    }

    pub fn render(&mut self, state: &WindowState) -> Result<()> {
        let Some((pipeline, _)) = &self.pipeline else {
            return Ok(());
        };

        self.builtins
            .update_builtins(&self.gpu_device.queue, &state.builtins(Instant::now()));

        let output = match self.surface_manager.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Reconfigure and try again next frame
                self.surface_manager
                    .configure(&self.gpu_device.device, state.width, state.height);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface texture"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu_device
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Window Render Encoder"),
                });
        pipeline.draw(&mut encoder, &view);
        self.gpu_device.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(tracker) = &mut self.performance_tracker {
            tracker.record_frame();
        }

        Ok(())
    }
}
