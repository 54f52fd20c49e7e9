//! The spaceship fleet: two parallel groups over one set of models.
//!
//! Each model file is loaded once and shared between a decloaked group
//! (textured, lit, shadow casting) and a cloaked group (translucent shader,
//! no textures). Both groups place the same geometry at the same spots; the
//! cloak toggle only decides which group reaches the render pass. The cloaked
//! group's transform is resynchronized to the decloaked one every frame, so
//! elevation changes apply to whichever appearance is active.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{instance::Instance, model::Model},
    layout,
    render::{Instanced, Render},
    resources,
};

/// Applies a group transform to each local transform.
pub fn world_transforms(group: &Instance, locals: &[Instance]) -> Vec<Instance> {
    locals.iter().map(|local| group * local).collect()
}

/// All placements of one ship model, drawn with a single instanced call.
pub struct Squadron {
    model: Arc<Model>,
    locals: Vec<Instance>,
    worlds: Vec<Instance>,
    instance_buffer: wgpu::Buffer,
}

impl Squadron {
    pub fn new(
        model: Arc<Model>,
        positions: &[[f32; 3]],
        scale: f32,
        device: &wgpu::Device,
    ) -> Self {
        let locals = positions
            .iter()
            .map(|position| {
                let mut instance = Instance::from(cgmath::Vector3::from(*position));
                instance.scale = cgmath::Vector3::new(scale, scale, scale);
                instance
            })
            .collect::<Vec<_>>();
        let worlds = world_transforms(&Instance::new(), &locals);

        let instance_data = worlds.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("squadron instances"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            model,
            locals,
            worlds,
            instance_buffer,
        }
    }

    pub fn update_world(&mut self, group: &Instance) {
        self.worlds = world_transforms(group, &self.locals);
    }

    /// The placement count never changes, so the buffer is rewritten in place.
    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        let raw_instances = self.worlds.iter().map(Instance::to_raw).collect::<Vec<_>>();
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw_instances));
    }

    pub fn amount(&self) -> usize {
        self.locals.len()
    }

    pub fn render(&self) -> Instanced<'_> {
        Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
            amount: self.amount(),
        }
    }
}

/// One of the two fleet appearances, holding its own instance buffers.
pub struct FleetGroup {
    pub transform: Instance,
    squadrons: Vec<Squadron>,
    dirty: bool,
}

impl FleetGroup {
    pub fn new(models: &[Arc<Model>], device: &wgpu::Device) -> Self {
        let squadrons = layout::FLEET
            .iter()
            .zip(models.iter())
            .map(|(ship, model)| {
                Squadron::new(model.clone(), ship.positions, layout::FLEET_SCALE, device)
            })
            .collect();
        let transform = Instance::from(cgmath::Vector3::from(layout::FLEET_BASE_POSITION));

        Self {
            transform,
            squadrons,
            // Forces the first update to push the group transform down.
            dirty: true,
        }
    }

    pub fn set_elevation(&mut self, y: f32) {
        if self.transform.position.y != y {
            self.transform.position.y = y;
            self.dirty = true;
        }
    }

    pub fn set_transform(&mut self, transform: &Instance) {
        if self.transform != *transform {
            self.transform = transform.clone();
            self.dirty = true;
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        for squadron in self.squadrons.iter_mut() {
            squadron.update_world(&self.transform);
            squadron.write_to_buffer(queue);
        }
        self.dirty = false;
    }

    pub fn render(&self) -> Vec<Instanced<'_>> {
        self.squadrons.iter().map(Squadron::render).collect()
    }
}

/// The whole fleet with its runtime toggles.
pub struct Fleet {
    decloaked: FleetGroup,
    cloaked: FleetGroup,
    pub visible: bool,
    pub cloak_enabled: bool,
    pub cast_shadow: bool,
}

impl Fleet {
    /// Loads every ship model concurrently and builds both groups over the
    /// shared results.
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<Self> {
        let loads = layout::FLEET.iter().map(|ship| {
            resources::load_ship_model(ship.obj, ship.textures, device, queue, material_layout)
        });
        let models = futures::future::join_all(loads)
            .await
            .into_iter()
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();
        log::info!("fleet loaded: {} ships", layout::ship_count());

        let decloaked = FleetGroup::new(&models, device);
        let cloaked = FleetGroup::new(&models, device);

        Ok(Self {
            decloaked,
            cloaked,
            visible: true,
            cloak_enabled: false,
            cast_shadow: true,
        })
    }

    pub fn set_elevation(&mut self, y: f32) {
        self.decloaked.set_elevation(y);
    }

    /// Mirrors the decloaked group's transform onto the cloaked group, then
    /// pushes pending transform changes to the GPU.
    pub fn update(&mut self, queue: &wgpu::Queue) {
        let transform = self.decloaked.transform.clone();
        self.cloaked.set_transform(&transform);
        self.decloaked.update(queue);
        self.cloaked.update(queue);
    }

    pub fn render(&self) -> Render<'_> {
        if !self.visible {
            return Render::None;
        }
        if self.cloak_enabled {
            Render::Cloakeds(self.cloaked.render())
        } else {
            Render::Opaques(self.decloaked.render())
        }
    }

    /// What the shadow pass draws. Both groups share geometry and transforms,
    /// so the decloaked buffers stand in for either appearance.
    pub fn render_shadow(&self) -> Vec<Instanced<'_>> {
        if !self.cast_shadow || !self.visible {
            return Vec::new();
        }
        self.decloaked.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn group_at(y: f32) -> Instance {
        Instance {
            position: Vector3::new(0.0, y, 0.0),
            scale: Vector3::new(layout::FLEET_SCALE, layout::FLEET_SCALE, layout::FLEET_SCALE),
            ..Default::default()
        }
    }

    #[test]
    fn test_world_transforms_lift_every_placement() {
        let locals: Vec<Instance> = layout::FLEET[0]
            .positions
            .iter()
            .map(|position| Instance {
                position: Vector3::from(*position),
                ..Default::default()
            })
            .collect();

        let worlds = world_transforms(&group_at(2.0), &locals);

        assert_eq!(worlds.len(), locals.len());
        for (world, local) in worlds.iter().zip(&locals) {
            let expected = local.position * layout::FLEET_SCALE
                + Vector3::new(0.0, 2.0, 0.0);
            assert!((world.position - expected).magnitude() < 1e-5);
            assert_eq!(world.scale.x, layout::FLEET_SCALE);
        }
    }

    #[test]
    fn test_elevation_moves_the_group_not_the_locals() {
        let local = Instance {
            position: Vector3::new(1.0, 0.5, -1.0),
            ..Default::default()
        };

        let low = world_transforms(&group_at(1.0), std::slice::from_ref(&local));
        let high = world_transforms(&group_at(3.0), std::slice::from_ref(&local));

        let lift = high[0].position - low[0].position;
        assert!((lift - Vector3::new(0.0, 2.0, 0.0)).magnitude() < 1e-5);
    }
}
