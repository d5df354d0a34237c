// AIDEV-NOTE: Surface configuration in one place; resize and surface loss both reconfigure
pub struct SurfaceManager {
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    format: wgpu::TextureFormat,
}

impl SurfaceManager {
    pub fn new(surface: wgpu::Surface<'static>, adapter: wgpu::Adapter) -> Self {
        let format = optimal_format(&surface.get_capabilities(&adapter).formats);
        Self {
            surface,
            adapter,
            format,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn configure(&self, device: &wgpu::Device, width: u32, height: u32) {
        let surface_caps = self.surface.get_capabilities(&self.adapter);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        self.surface.configure(device, &config);
    }

    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}

/// Shaders write display values directly, so prefer a non-sRGB format
fn optimal_format(formats: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
        .unwrap_or(wgpu::TextureFormat::Bgra8Unorm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_linear_format() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(optimal_format(&formats), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(
            optimal_format(&[wgpu::TextureFormat::Rgba8UnormSrgb]),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(optimal_format(&[]), wgpu::TextureFormat::Bgra8Unorm);
    }
}
