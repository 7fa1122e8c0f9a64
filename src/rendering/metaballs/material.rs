use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef, ShaderType};
use bevy::render::storage::ShaderStorageBuffer;
use bevy::sprite::Material2d;
use bytemuck::{Pod, Zeroable};

#[cfg(target_arch = "wasm32")]
use bevy::render::render_resource::Shader;
#[cfg(target_arch = "wasm32")]
use std::sync::OnceLock;
#[cfg(target_arch = "wasm32")]
static METABALLS_SHADER_HANDLE: OnceLock<Handle<Shader>> = OnceLock::new();

/// Renderer capacity. Marbles beyond this are dropped deterministically by
/// iteration order; the race itself is unaffected.
pub const MAX_MARBLES: usize = 4096;

// =====================================================================================
// Uniform layout
// v0: (marble_count, time_seconds, field_threshold, unused)
// v1: (viewport_w, viewport_h, noise_scale, noise_time_scale)
// =====================================================================================
#[repr(C, align(16))]
#[derive(Clone, Copy, ShaderType, Debug)]
pub(crate) struct MetaballsUniform {
    pub v0: Vec4,
    pub v1: Vec4,
}

impl Default for MetaballsUniform {
    fn default() -> Self {
        Self {
            v0: Vec4::new(0.0, 0.0, 1.0, 0.0),
            v1: Vec4::new(0.0, 0.0, 0.005, 0.0125),
        }
    }
}

/// One marble in the storage buffer: (screen x, screen y, screen radius,
/// species flag). Screen space is pixels, y down, matching the fragment
/// position the shader sums against.
#[repr(C, align(16))]
#[derive(Clone, Copy, ShaderType, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMarble {
    pub data: Vec4,
}

impl GpuMarble {
    pub fn new(pos: Vec2, radius: f32, species: f32) -> Self {
        Self {
            data: Vec4::new(pos.x, pos.y, radius, species),
        }
    }
}

#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
pub struct MetaballsMaterial {
    #[uniform(0)]
    pub(crate) data: MetaballsUniform,
    #[storage(1, read_only)]
    pub(crate) marbles: Handle<ShaderStorageBuffer>,
}

impl Default for MetaballsMaterial {
    fn default() -> Self {
        Self {
            data: MetaballsUniform::default(),
            marbles: Default::default(),
        }
    }
}

impl Material2d for MetaballsMaterial {
    fn fragment_shader() -> ShaderRef {
        #[cfg(target_arch = "wasm32")]
        {
            ShaderRef::Handle(METABALLS_SHADER_HANDLE.get().unwrap().clone())
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            "shaders/metaballs.wgsl".into()
        }
    }
    fn vertex_shader() -> ShaderRef {
        #[cfg(target_arch = "wasm32")]
        {
            ShaderRef::Handle(METABALLS_SHADER_HANDLE.get().unwrap().clone())
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            "shaders/metaballs.wgsl".into()
        }
    }
}

/// Embed the shader on wasm where asset paths are unavailable at startup.
#[cfg(target_arch = "wasm32")]
pub(crate) fn register_embedded_shader(app: &mut App) {
    use bevy::asset::Assets;
    use bevy::render::render_resource::Shader;
    let mut shaders = app.world_mut().resource_mut::<Assets<Shader>>();
    let handle = shaders.add(Shader::from_wgsl(
        include_str!("../../../assets/shaders/metaballs.wgsl"),
        "metaballs_embedded.wgsl",
    ));
    METABALLS_SHADER_HANDLE.get_or_init(|| handle);
}
