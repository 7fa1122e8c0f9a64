//! GPU adapter precondition probing & gating.
//!
//! The metaball pipeline needs float storage buffers large enough for the
//! marble list plus an ordinary uniform block. If the selected adapter cannot
//! provide that, simulating would only produce a black surface, so the guard
//! fails fast: it logs one consolidated diagnostic, marks the capabilities
//! resource as failed (the upload system then no-ops) and asks the app to
//! exit cleanly instead of crashing the host.

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::render::renderer::{RenderAdapter, RenderAdapterInfo};
use wgpu::Limits;

use super::metaballs::MAX_MARBLES;

/// Hard minimum limits for the metaball pipeline.
#[derive(Debug, Clone)]
pub struct RequiredGpu {
    pub max_bind_groups: u32,
    pub max_storage_buffers_per_shader_stage: u32,
    pub max_uniform_buffer_binding_size: u32,
    pub max_storage_buffer_binding_size: u64,
}

impl RequiredGpu {
    pub const fn new() -> Self {
        Self {
            max_bind_groups: 2,
            max_storage_buffers_per_shader_stage: 1,
            max_uniform_buffer_binding_size: 16 * 1024,
            // one Vec4 per marble
            max_storage_buffer_binding_size: (MAX_MARBLES * 16) as u64,
        }
    }
}

/// Captured and exposed capabilities after validation.
#[derive(Resource, Debug, Clone)]
pub struct GpuCapabilities {
    pub ok: bool,
    pub limits: Limits,
    pub fallback: bool,
}

/// Evaluate adapter limits against the pipeline minima. Returns the failure
/// list (empty = pass).
pub fn evaluate_limits(limits: &Limits, required: &RequiredGpu) -> Vec<String> {
    let mut failures = Vec::new();
    macro_rules! check_limit_u32 {
        ($field:ident) => {{
            if limits.$field < required.$field {
                failures.push(format!(
                    "Limit {}={} below required {} (adapter insufficient for metaball pipeline)",
                    stringify!($field),
                    limits.$field,
                    required.$field
                ));
            }
        }};
    }
    check_limit_u32!(max_bind_groups);
    check_limit_u32!(max_storage_buffers_per_shader_stage);
    check_limit_u32!(max_uniform_buffer_binding_size);
    if u64::from(limits.max_storage_buffer_binding_size) < required.max_storage_buffer_binding_size
    {
        failures.push(format!(
            "Limit max_storage_buffer_binding_size={} below required {} (marble buffer will not fit)",
            limits.max_storage_buffer_binding_size, required.max_storage_buffer_binding_size
        ));
    }
    if *limits == Limits::downlevel_webgl2_defaults() {
        failures.push(
            "Adapter limits match downlevel_webgl2_defaults (environment too constrained)".into(),
        );
    }
    failures
}

fn system_run_gpu_guard(
    adapter: Res<RenderAdapter>,
    info: Res<RenderAdapterInfo>,
    mut commands: Commands,
    mut exit: EventWriter<AppExit>,
    already: Option<Res<GuardRan>>,
) {
    if already.is_some() {
        return;
    }
    commands.insert_resource(GuardRan);

    let required = RequiredGpu::new();
    let limits = adapter.0.limits();
    let fallback = matches!(
        info.0.device_type,
        wgpu::DeviceType::Cpu | wgpu::DeviceType::Other
    );
    info!(
        target: "gpu",
        "Adapter=\"{}\" backend={:?} device_type={:?} fallback={}",
        info.0.name, info.0.backend, info.0.device_type, fallback
    );
    if fallback {
        warn!(target: "gpu", "Fallback adapter in use; performance & limits may be reduced.");
    }

    let failures = evaluate_limits(&limits, &required);
    if failures.is_empty() {
        info!(target: "gpu", "GPU preconditions PASS; metaball pipeline enabled");
        commands.insert_resource(GpuCapabilities {
            ok: true,
            limits,
            fallback,
        });
    } else {
        error!(target: "gpu", "GPU preconditions FAILED ({} issues); not simulating", failures.len());
        for f in &failures {
            error!(target: "gpu", " - {f}");
        }
        commands.insert_resource(GpuCapabilities {
            ok: false,
            limits,
            fallback,
        });
        exit.write(AppExit::error());
    }
}

#[derive(Resource, Debug)]
struct GuardRan; // Marker to ensure the guard runs only once.

/// Plugin registering the GPU precondition guard. Must be added *after* `RenderPlugin`.
pub struct GpuGuardPlugin;

impl Plugin for GpuGuardPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, system_run_gpu_guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_pass() {
        let failures = evaluate_limits(&Limits::default(), &RequiredGpu::new());
        assert!(failures.is_empty(), "{failures:?}");
    }

    #[test]
    fn tiny_storage_budget_fails_with_named_limit() {
        let mut limits = Limits::default();
        limits.max_storage_buffer_binding_size = 1024;
        let failures = evaluate_limits(&limits, &RequiredGpu::new());
        assert!(failures
            .iter()
            .any(|f| f.contains("max_storage_buffer_binding_size")));
    }

    #[test]
    fn webgl2_downlevel_is_rejected() {
        let failures = evaluate_limits(&Limits::downlevel_webgl2_defaults(), &RequiredGpu::new());
        assert!(!failures.is_empty());
    }
}
