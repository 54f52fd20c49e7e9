use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, layout};

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// One white-ish directional light plus the ambient term, in the layout the
/// shaders expect.
///
/// The vec3 fields each leave a 4 byte gap that the following f32 fills, so
/// the struct matches WGSL uniform alignment without dead padding in between.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub light_view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub ambient_intensity: f32,
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient_color: [f32; 3],
    // Rounds the struct up to the 16 byte stride uniforms require
    pub _padding: f32,
}

impl LightUniform {
    pub fn new(position: [f32; 3], color: [f32; 3], intensity: f32) -> Self {
        Self {
            light_view_proj: light_view_proj(position).into(),
            position,
            ambient_intensity: layout::AMBIENT_INTENSITY,
            color,
            intensity,
            ambient_color: layout::AMBIENT_COLOR,
            _padding: 0.0,
        }
    }

    /// Moves the light and keeps the shadow projection pointed at the scene.
    pub fn set_position(&mut self, position: [f32; 3]) {
        if self.position != position {
            self.position = position;
            self.light_view_proj = light_view_proj(position).into();
        }
    }
}

/// View projection of the shadow pass: an orthographic box looking from the
/// light's position towards the origin.
pub fn light_view_proj(position: [f32; 3]) -> cgmath::Matrix4<f32> {
    let position = cgmath::Point3::from(position);
    let target = cgmath::Point3::new(0.0, 0.0, 0.0);
    // Straight above or below the origin the usual up vector degenerates.
    let up = if position.x.abs() < f32::EPSILON && position.z.abs() < f32::EPSILON {
        cgmath::Vector3::unit_z()
    } else {
        cgmath::Vector3::unit_y()
    };
    let view = cgmath::Matrix4::look_at_rh(position, target, up);
    let proj = cgmath::ortho(
        -layout::SHADOW_EXTENT,
        layout::SHADOW_EXTENT,
        -layout::SHADOW_EXTENT,
        layout::SHADOW_EXTENT,
        layout::SHADOW_NEAR,
        layout::SHADOW_FAR,
    );
    OPENGL_TO_WGPU_MATRIX * proj * view
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: None,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_matches_wgsl_stride() {
        // 4x4 matrix plus three vec3/f32 pairs, 16 byte aligned.
        assert_eq!(std::mem::size_of::<LightUniform>(), 112);
    }

    #[test]
    fn test_view_proj_survives_a_vertical_light() {
        // look_at_rh would collapse if up stayed unit_y here.
        let matrix: [[f32; 4]; 4] = light_view_proj([0.0, 5.0, 0.0]).into();
        for column in matrix {
            for value in column {
                assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn test_set_position_refreshes_the_projection() {
        let mut uniform = LightUniform::new(layout::LIGHT_POSITION, layout::LIGHT_COLOR, 0.6);
        let before = uniform.light_view_proj;

        uniform.set_position([4.0, 5.0, 1.0]);

        assert_ne!(uniform.light_view_proj, before);
        let expected: [[f32; 4]; 4] = light_view_proj([4.0, 5.0, 1.0]).into();
        assert_eq!(uniform.light_view_proj, expected);
    }
}
