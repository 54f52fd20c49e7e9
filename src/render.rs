//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which is used by scene objects to
//! specify how they should be rendered. The render loop uses `Render` to sort
//! objects into the batch for the textured pipeline and the batch for the
//! cloak pipeline before recording the main pass.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//!

use crate::data_structures::model::Model;

/// Data for instanced object rendering: a model and its instance buffer.
///
/// Used for 3D objects rendered with GPU instancing. The instance buffer
/// contains per-instance transformation data.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Opaque(Instanced)` renders a single textured instanced object
/// - `Opaques(Vec<Instanced>)` renders a batch of textured instanced objects
/// - `Cloaked(Instanced)` renders a single cloaked instanced object
/// - `Cloakeds(Vec<Instanced>)` renders a batch of cloaked objects
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
///
pub enum Render<'a> {
    None,
    Opaque(Instanced<'a>),
    Opaques(Vec<Instanced<'a>>),
    Cloaked(Instanced<'a>),
    Cloakeds(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort into the per-pipeline batches the main pass draws from.
    ///
    /// Opaque objects come first so the cloaked ones blend over them.
    pub(crate) fn batch(self, opaques: &mut Vec<Instanced<'a>>, cloaks: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Opaque(instanced) => opaques.push(instanced),
            Render::Opaques(mut vec) => opaques.append(&mut vec),
            Render::Cloaked(instanced) => cloaks.push(instanced),
            Render::Cloakeds(mut vec) => cloaks.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(opaques, cloaks)),
            Render::None => (),
        }
    }
}
