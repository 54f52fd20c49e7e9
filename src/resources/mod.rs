use std::io::{BufReader, Cursor};
use std::path::Path;

use anyhow::Context;

use crate::{
    data_structures::{model, texture::Texture},
    layout,
    resources::texture::{load_string, load_texture},
};

/**
 * This module contains all logic for loading meshes/textures/etc. from external files.
 */
pub mod mesh;
pub mod texture;

fn extension(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|e| e.to_str())
}

/// Loads one ship's OBJ geometry and applies the textures from the manifest.
///
/// The manifest names a diffuse map and usually an emissive map. Ships
/// without an emissive entry get a solid black one so every ship goes
/// through the same pipeline. Any materials the OBJ's own mtl declares are
/// parsed but ignored, and a missing mtl file is tolerated.
pub async fn load_ship_model(
    obj_file: &str,
    textures: &[&'static str],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let obj_text = load_string(&format!("{}/{}", layout::MODEL_DIR, obj_file)).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, _obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mat_text = load_string(&format!("{}/{}", layout::MODEL_DIR, p))
                .await
                .unwrap_or_else(|_| {
                    log::warn!("no mtl file for {p}, using the texture manifest only");
                    String::new()
                });
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text)))
        },
    )
    .await?;

    let diffuse_name = textures
        .first()
        .with_context(|| format!("{obj_file} has no diffuse texture listed"))?;
    let diffuse_texture = load_texture(
        &format!("{}/{}", layout::TEXTURE_DIR, diffuse_name),
        true,
        device,
        queue,
        extension(diffuse_name),
    )
    .await?;
    let emissive_texture = match textures.get(1) {
        Some(emissive_name) => {
            load_texture(
                &format!("{}/{}", layout::TEXTURE_DIR, emissive_name),
                true,
                device,
                queue,
                extension(emissive_name),
            )
            .await?
        }
        None => Texture::create_solid([0, 0, 0, 255], true, device, queue),
    };
    let material = model::Material::new(
        device,
        obj_file,
        diffuse_texture,
        emissive_texture,
        bind_group_layout,
    );

    let mut meshes = mesh::load_meshes(&models, obj_file, device);
    // The manifest provides a single material per ship, even if the obj
    // declares more.
    for mesh in meshes.iter_mut().filter(|m| m.material != 0) {
        log::warn!(
            "{}: a mesh references material {}, falling back to the manifest textures",
            obj_file,
            mesh.material
        );
        mesh.material = 0;
    }
    log::info!("loaded {} ({} meshes)", obj_file, meshes.len());

    Ok(model::Model {
        meshes,
        materials: vec![material],
    })
}
