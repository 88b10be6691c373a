//! The particle record shared by the CPU ring buffer and the GPU vertex buffer.

use glam::Vec3;

/// One point-sprite particle as uploaded to the GPU.
///
/// The layout is fixed at 32 bytes so the ring buffer can be copied into a
/// vertex buffer without conversion. All animation (fading, growth, gravity)
/// happens in the vertex shader, keyed off `time` and the global clock, so a
/// record is never rewritten after spawning except for `time` when the slot
/// retires (it then holds the draw frame of retirement).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
    /// Starting position.
    pub position: Vec3,
    /// Starting velocity.
    pub velocity: Vec3,
    /// Four random bytes; the shader uses them to vary size, rotation and color.
    pub random: [u8; 4],
    /// Spawn time in seconds, or the retirement frame once retired. Frames
    /// past 2^24 lose precision; see [`RETIREMENT_DELAY`](crate::RETIREMENT_DELAY).
    pub time: f32,
}

impl Particle {
    /// Size of one record in bytes (the vertex stride).
    pub const SIZE: usize = std::mem::size_of::<Particle>();

    /// Vertex attributes matching the field layout.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Unorm8x4,
        3 => Float32,
    ];

    /// Vertex buffer layout for drawing the ring as a point list.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
