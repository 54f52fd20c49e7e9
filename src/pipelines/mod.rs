//! Render pipeline definitions and shared GPU resources.
//!
//! - `basic` is the textured, lit and shadowed pipeline
//! - `cloak` is the translucent pipeline for the cloaked fleet
//! - `shadow` fills the shadow map with a depth-only pass
//! - `light` holds the light uniform and its bind group

pub mod basic;
pub mod cloak;
pub mod light;
pub mod shadow;

/// The two colour pipelines of the main pass. The shadow pipeline lives with
/// its map in [`shadow::ShadowResources`].
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub cloak: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        shadow_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let basic = basic::mk_basic_pipeline(
            device,
            config,
            light_bind_group_layout,
            camera_bind_group_layout,
            shadow_bind_group_layout,
        );
        let cloak = cloak::mk_cloak_pipeline(
            device,
            config,
            light_bind_group_layout,
            camera_bind_group_layout,
        );

        Self { basic, cloak }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn fleet_shader_wgsl_parses() {
        let source = include_str!("fleet_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("fleet_shader.wgsl failed to parse");
    }

    #[test]
    fn cloak_shader_wgsl_parses() {
        let source = include_str!("cloak.wgsl");
        naga::front::wgsl::parse_str(source).expect("cloak.wgsl failed to parse");
    }

    #[test]
    fn shadow_shader_wgsl_parses() {
        let source = include_str!("shadow.wgsl");
        naga::front::wgsl::parse_str(source).expect("shadow.wgsl failed to parse");
    }
}
