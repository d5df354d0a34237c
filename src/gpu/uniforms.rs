use bytemuck::{Pod, Zeroable};

// AIDEV-NOTE: Mirrors the Builtins block in shaders/preamble.glsl (std140). Plain and
// i-prefixed names always carry the same values.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BuiltinUniforms {
    pub i_resolution: [f32; 2],
    pub i_mouse: [f32; 2],
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub i_time: f32,
    pub time: f32,
    pub _padding: [f32; 2],
}

impl BuiltinUniforms {
    /// `mouse` is normalized to [0,1] with y up
    pub fn new(width: u32, height: u32, time: f32, mouse: [f32; 2]) -> Self {
        let resolution = [width as f32, height as f32];
        Self {
            i_resolution: resolution,
            i_mouse: mouse,
            resolution,
            mouse,
            i_time: time,
            time,
            _padding: [0.0; 2],
        }
    }
}

/// Fixed-size uniform buffer written wholesale from CPU bytes
pub struct UniformBuffer {
    pub buffer: wgpu::Buffer,
    size: u64,
}

impl UniformBuffer {
    pub fn new(device: &wgpu::Device, label: &str, size: usize) -> Self {
        let size = size as wgpu::BufferAddress;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self { buffer, size }
    }

    pub fn for_builtins(device: &wgpu::Device) -> Self {
        Self::new(device, "Builtin Uniforms", std::mem::size_of::<BuiltinUniforms>())
    }

    pub fn write(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        let len = bytes.len().min(self.size as usize);
        queue.write_buffer(&self.buffer, 0, &bytes[..len]);
    }

    pub fn update_builtins(&self, queue: &wgpu::Queue, uniforms: &BuiltinUniforms) {
        self.write(queue, bytemuck::bytes_of(uniforms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_block_size() {
        assert_eq!(std::mem::size_of::<BuiltinUniforms>(), 48);
    }

    #[test]
    fn test_aliases_share_values() {
        let u = BuiltinUniforms::new(320, 200, 1.5, [0.25, 0.75]);
        assert_eq!(u.i_resolution, u.resolution);
        assert_eq!(u.resolution, [320.0, 200.0]);
        assert_eq!(u.i_mouse, u.mouse);
        assert_eq!(u.i_time, 1.5);
        assert_eq!(u.time, 1.5);

        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&u));
        assert_eq!(&floats[8..10], &[1.5, 1.5]);
    }
}
