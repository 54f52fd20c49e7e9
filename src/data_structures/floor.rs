//! The ground plane the fleet hovers over.
//!
//! A single quad with a solid dark grey albedo, drawn through the same
//! pipeline as the ships so it receives their shadows. It never casts a
//! shadow itself and is excluded from the shadow pass.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, Mesh, Model, ModelVertex},
        texture::Texture,
    },
    layout,
    render::Instanced,
};

pub struct Floor {
    model: Model,
    instance_buffer: wgpu::Buffer,
}

impl Floor {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let half = layout::FLOOR_SIZE / 2.0;
        let vertices = [
            ModelVertex {
                position: [-half, 0.0, -half],
                tex_coords: [0.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
            ModelVertex {
                position: [-half, 0.0, half],
                tex_coords: [0.0, 1.0],
                normal: [0.0, 1.0, 0.0],
            },
            ModelVertex {
                position: [half, 0.0, half],
                tex_coords: [1.0, 1.0],
                normal: [0.0, 1.0, 0.0],
            },
            ModelVertex {
                position: [half, 0.0, -half],
                tex_coords: [1.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
        ];
        // Counter-clockwise seen from above, so the quad faces the camera.
        let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("floor vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("floor indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let diffuse = Texture::create_solid(layout::FLOOR_COLOR, true, device, queue);
        let emissive = Texture::create_solid([0, 0, 0, 255], true, device, queue);
        let material = Material::new(device, "floor", diffuse, emissive, material_layout);

        let mesh = Mesh {
            name: "floor".to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            material: 0,
        };
        let model = Model {
            meshes: vec![mesh],
            materials: vec![material],
        };

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("floor instance"),
            contents: bytemuck::cast_slice(&[Instance::new().to_raw()]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            model,
            instance_buffer,
        }
    }

    pub fn render(&self) -> Instanced<'_> {
        Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
            amount: 1,
        }
    }
}
