use wgpu::util::DeviceExt;

use crate::data_structures::model;

/**
 * Converts one tobj model into our vertex format.
 *
 * Obj texture coordinates have their origin in the bottom left corner while
 * wgpu samples from the top left, so the v coordinate is flipped here.
 */
pub fn to_vertices(m: &tobj::Model) -> Vec<model::ModelVertex> {
    (0..m.mesh.positions.len() / 3)
        .map(|i| model::ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>()
}

pub fn load_meshes(
    models: &Vec<tobj::Model>,
    file_name: &str,
    device: &wgpu::Device,
) -> Vec<model::Mesh> {
    models
        .into_iter()
        .map(|m| {
            let vertices = to_vertices(m);

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", file_name)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", file_name)),
                // One index covers positions, texels and normals because we set `single_index`
                contents: bytemuck::cast_slice(&m.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            model::Mesh {
                name: file_name.to_string(),
                vertex_buffer,
                index_buffer,
                num_elements: m.mesh.indices.len() as u32,
                material: m.mesh.material_id.unwrap_or(0),
            }
        })
        .collect::<Vec<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with(positions: Vec<f32>, texcoords: Vec<f32>, normals: Vec<f32>) -> tobj::Model {
        let mesh = tobj::Mesh {
            positions,
            texcoords,
            normals,
            ..Default::default()
        };
        tobj::Model::new(mesh, "test".to_string())
    }

    #[test]
    fn test_to_vertices_flips_v() {
        let m = model_with(
            vec![1.0, 2.0, 3.0],
            vec![0.25, 0.25],
            vec![0.0, 1.0, 0.0],
        );

        let vertices = to_vertices(&m);

        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].tex_coords, [0.25, 0.75]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_to_vertices_defaults_missing_attributes() {
        let m = model_with(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0], vec![], vec![]);

        let vertices = to_vertices(&m);

        assert_eq!(vertices.len(), 2);
        for vertex in vertices {
            // The flip turns the fallback v of 0.0 into 1.0.
            assert_eq!(vertex.tex_coords, [0.0, 1.0]);
            assert_eq!(vertex.normal, [0.0, 0.0, 0.0]);
        }
    }
}
