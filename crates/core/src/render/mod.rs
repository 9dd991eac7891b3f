//! Per-frame hand-off of the shared parameters to GPU-visible memory.
//!
//! Device, surface and pipeline setup live with the platform layer. This
//! module only knows the uniform layout and the order of operations for a
//! frame: snapshot, copy, then draw.

use std::mem;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::{FrameTick, ParameterSet, ParameterStore, Result};

/// Uniform block shared with the shader: four floats, `size` first.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub size: f32,
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl FrameUniforms {
    pub const SIZE: usize = mem::size_of::<FrameUniforms>();

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Reads the block back from the start of `bytes`, if long enough.
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..Self::SIZE)
            .map(bytemuck::pod_read_unaligned::<FrameUniforms>)
    }

    /// Colour as RGBA with opaque alpha.
    pub fn color(&self) -> [f32; 4] {
        [self.red, self.green, self.blue, 1.0]
    }
}

impl From<ParameterSet> for FrameUniforms {
    fn from(set: ParameterSet) -> Self {
        Self {
            size: set.size,
            red: set.red,
            green: set.green,
            blue: set.blue,
        }
    }
}

impl From<FrameUniforms> for ParameterSet {
    fn from(uniforms: FrameUniforms) -> Self {
        Self {
            red: uniforms.red,
            green: uniforms.green,
            blue: uniforms.blue,
            size: uniforms.size,
        }
    }
}

/// GPU-visible memory region the uniforms are copied into.
pub trait UniformBuffer {
    /// Mapped contents, or `None` while the buffer has not been allocated.
    fn contents_mut(&mut self) -> Option<&mut [u8]>;
}

/// Host memory stand-in for a shared-storage GPU buffer. Starts
/// unallocated, like a real buffer during startup.
#[derive(Debug, Default, Clone)]
pub struct HostUniformBuffer {
    bytes: Option<Vec<u8>>,
}

impl HostUniformBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocated() -> Self {
        let mut buffer = Self::new();
        buffer.allocate();
        buffer
    }

    pub fn allocate(&mut self) {
        self.bytes.get_or_insert_with(|| vec![0; FrameUniforms::SIZE]);
    }

    pub fn is_allocated(&self) -> bool {
        self.bytes.is_some()
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn uniforms(&self) -> Option<FrameUniforms> {
        self.bytes().and_then(FrameUniforms::read_from)
    }
}

impl UniformBuffer for HostUniformBuffer {
    fn contents_mut(&mut self) -> Option<&mut [u8]> {
        self.bytes.as_deref_mut()
    }
}

/// Outcome of preparing one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    /// The snapshot was copied into the buffer.
    Published(FrameUniforms),
    /// No usable buffer yet; the next frame tries again.
    Deferred,
}

/// Copies the current parameters into the uniform buffer once per frame.
#[derive(Debug)]
pub struct FramePublisher {
    store: Arc<ParameterStore>,
    published: u64,
    deferred: u64,
}

impl FramePublisher {
    pub fn new(store: Arc<ParameterStore>) -> Self {
        Self {
            store,
            published: 0,
            deferred: 0,
        }
    }

    /// Snapshots the shared parameters and overwrites the uniform block.
    ///
    /// Runs unconditionally, whether or not anything changed since the last
    /// frame. Must be called before any draw that reads the buffer.
    pub fn prepare_frame(&mut self, buffer: &mut dyn UniformBuffer) -> FrameStatus {
        let Some(target) = buffer
            .contents_mut()
            .and_then(|bytes| bytes.get_mut(..FrameUniforms::SIZE))
        else {
            self.deferred += 1;
            return FrameStatus::Deferred;
        };

        let uniforms = FrameUniforms::from(self.store.read_snapshot());
        target.copy_from_slice(uniforms.as_bytes());
        self.published += 1;
        FrameStatus::Published(uniforms)
    }

    pub fn frames_published(&self) -> u64 {
        self.published
    }

    pub fn frames_deferred(&self) -> u64 {
        self.deferred
    }
}

/// Draw collaborator invoked after the uniforms are in place.
pub trait FramePresenter {
    fn present(&mut self, tick: &FrameTick, uniforms: &FrameUniforms) -> Result<()>;
}

/// Publish-then-draw entry point for a render loop driver.
#[derive(Debug)]
pub struct RenderLoop {
    publisher: FramePublisher,
    frames: u64,
}

impl RenderLoop {
    pub fn new(store: Arc<ParameterStore>) -> Self {
        Self {
            publisher: FramePublisher::new(store),
            frames: 0,
        }
    }

    /// Prepares the frame timed by `tick` and, if the buffer was ready,
    /// draws it. A deferred frame skips the draw.
    pub fn render_frame(
        &mut self,
        tick: &FrameTick,
        buffer: &mut dyn UniformBuffer,
        presenter: &mut dyn FramePresenter,
    ) -> Result<FrameStatus> {
        self.frames += 1;

        let status = self.publisher.prepare_frame(buffer);
        if let FrameStatus::Published(uniforms) = &status {
            presenter.present(tick, uniforms)?;
        }
        Ok(status)
    }

    /// Frames attempted so far, deferred ones included.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn publisher(&self) -> &FramePublisher {
        &self.publisher
    }
}
