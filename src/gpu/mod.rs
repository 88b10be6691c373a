//! wgpu side of the particle ring.
//!
//! The ring is mirrored in a vertex buffer of the same capacity. Each frame
//! only the freshly spawned slots are written, then the live slots are drawn
//! as points in one call, or two when the live region wraps past the end of
//! the buffer. Pipelines and shaders belong to the host renderer.
//!
//! ```ignore
//! let mut vertices = ParticleVertexBuffer::new(&device, system.capacity());
//!
//! // Every frame:
//! system.update(dt);
//! let frame = system.draw_ranges();
//! vertices.upload(&queue, system.particles(), &frame.upload);
//! queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(
//!     &ParticleUniforms::new(&camera, viewport_height, frame.current_time),
//! ));
//! vertices.draw(&mut pass, &frame.draw);
//! ```

use crate::camera::OrientationCamera;
use crate::particle::Particle;
use crate::ring::SlotRanges;
use crate::settings::{BlendFactor, ParticleSettings};
use bytemuck::{Pod, Zeroable};
use std::ops::Range;

/// Per-frame values the particle shader animates with.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Used to scale point sprites with distance.
    pub viewport_height: f32,
    /// Particle system clock; particle ages are `current_time - time`.
    pub current_time: f32,
    pub _padding: [f32; 2],
}

impl ParticleUniforms {
    pub fn new(camera: &OrientationCamera, viewport_height: f32, current_time: f32) -> Self {
        Self {
            view: camera.view().to_cols_array_2d(),
            projection: camera.projection().to_cols_array_2d(),
            viewport_height,
            current_time,
            _padding: [0.0; 2],
        }
    }
}

/// Vertex buffer mirroring a particle ring.
pub struct ParticleVertexBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

impl ParticleVertexBuffer {
    /// Allocate room for `capacity` particles.
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Vertex Buffer"),
            size: (capacity * Particle::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("Allocated particle vertex buffer for {capacity} slots");

        Self { buffer, capacity }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy the given slots of `particles` into the buffer.
    pub fn upload(&self, queue: &wgpu::Queue, particles: &[Particle], ranges: &SlotRanges) {
        for range in ranges.iter() {
            let start = byte_offset(range.start);
            queue.write_buffer(&self.buffer, start, bytemuck::cast_slice(&particles[range]));
        }
    }

    /// Record draw calls for the given slots.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, ranges: &SlotRanges) {
        if ranges.is_empty() {
            return;
        }

        pass.set_vertex_buffer(0, self.buffer.slice(..));
        for range in ranges.iter() {
            pass.draw(vertex_range(range), 0..1);
        }
    }
}

fn byte_offset(slot: usize) -> wgpu::BufferAddress {
    (slot * Particle::SIZE) as wgpu::BufferAddress
}

fn vertex_range(slots: Range<usize>) -> Range<u32> {
    slots.start as u32..slots.end as u32
}

/// Blend state for compositing a particle effect.
pub fn blend_state(settings: &ParticleSettings) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: to_wgpu(settings.source_blend),
        dst_factor: to_wgpu(settings.destination_blend),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn to_wgpu(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SourceColor => wgpu::BlendFactor::Src,
        BlendFactor::InverseSourceColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SourceAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::InverseSourceAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DestinationColor => wgpu::BlendFactor::Dst,
        BlendFactor::InverseDestinationColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DestinationAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::InverseDestinationAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraMode, CameraSettings};

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 144);
        assert_eq!(std::mem::size_of::<ParticleUniforms>() % 16, 0);
    }

    #[test]
    fn test_uniforms_from_camera() {
        let mut camera = OrientationCamera::new(CameraSettings {
            mode: CameraMode::Fly,
            ..Default::default()
        })
        .unwrap();
        camera.set_position(glam::Vec3::new(0.0, 0.0, 5.0));

        let uniforms = ParticleUniforms::new(&camera, 720.0, 1.5);
        assert_eq!(uniforms.view[3][2], -5.0);
        assert_eq!(uniforms.projection, camera.projection().to_cols_array_2d());
        assert_eq!(uniforms.current_time, 1.5);
    }

    #[test]
    fn test_wrapped_ranges_map_to_buffer() {
        let ranges = SlotRanges::between(6, 2, 8);
        let offsets: Vec<_> = ranges.iter().map(|r| byte_offset(r.start)).collect();
        let draws: Vec<_> = ranges.iter().map(vertex_range).collect();

        assert_eq!(offsets, vec![6 * 32, 0]);
        assert_eq!(draws, vec![6..8, 0..2]);
    }

    #[test]
    fn test_default_blend_is_alpha() {
        let state = blend_state(&ParticleSettings::default());
        assert_eq!(state.color, wgpu::BlendState::ALPHA_BLENDING.color);
    }

    #[test]
    fn test_additive_blend() {
        let state = blend_state(&ParticleSettings::fire());
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
    }
}
