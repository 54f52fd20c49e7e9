//! Per-instance transform data for GPU instancing.
//!
//! Every ship placement is one [`Instance`]; a squadron uploads its instances
//! as a vertex buffer with [`InstanceRaw`] layout so a single draw call covers
//! all placements of one model.

use std::ops::Mul;

use cgmath::{One, SquareMatrix};

use crate::data_structures::model;

/// A position, rotation (as quaternion) and scale.
///
/// Composes with `*`: `group * local` yields the world transform of a child
/// placed inside a group, which is how the fleet group's elevation reaches
/// the individual ships.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// The identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let world_matrix = self.to_matrix();
        let handedness = world_matrix.determinant().signum();
        InstanceRaw {
            model: world_matrix.into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            handedness,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

/**
 * As we store instance data directly in GPU memory we need to tell what the bytes refer to.
 *
 * Stride layout here: the 4x4 model matrix (four 4d vectors), the 3x3 normal
 * matrix (three 3d vectors) and the handedness sign for mirrored instances.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Step mode Instance: the shader only advances to the next entry
            // when it starts processing a new instance.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s,
                // so the matrix needs a slot per column.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    // corresponds to the @location in the shader file.
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, Vector3};

    #[test]
    fn test_to_matrix_puts_translation_last() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let m = instance.to_matrix();

        // cgmath is column major, translation sits in the fourth column
        assert!((m.w.x - 1.0).abs() < 1e-6);
        assert!((m.w.y - 2.0).abs() < 1e-6);
        assert!((m.w.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_group_times_local_moves_the_child() {
        let group = Instance {
            position: Vector3::new(0.0, 2.0, 0.0),
            ..Default::default()
        };
        let local = Instance {
            position: Vector3::new(5.0, 0.0, -3.0),
            ..Default::default()
        };

        let world = &group * &local;

        assert_eq!(world.position, Vector3::new(5.0, 2.0, -3.0));
        assert_eq!(world.scale, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_group_scale_applies_before_group_offset() {
        let group = Instance {
            position: Vector3::new(0.0, 1.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Default::default()
        };
        let local = Instance {
            position: Vector3::new(3.0, 0.0, 0.0),
            ..Default::default()
        };

        let world = &group * &local;

        assert_eq!(world.position, Vector3::new(6.0, 1.0, 0.0));
        assert_eq!(world.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_group_rotation_swings_the_child_around() {
        let group = Instance {
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            ..Default::default()
        };
        let local = Instance {
            position: Vector3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };

        let world = &group * &local;

        // A quarter turn around y sends +x to -z
        assert!((world.position.x - 0.0).abs() < 1e-6);
        assert!((world.position.z - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_handedness_flips_with_negative_scale() {
        let mut instance = Instance::new();
        assert_eq!(instance.to_raw().handedness, 1.0);

        instance.scale = Vector3::new(-1.0, 1.0, 1.0);
        assert_eq!(instance.to_raw().handedness, -1.0);
    }
}
