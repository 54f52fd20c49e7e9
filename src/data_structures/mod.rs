//! Scene data structures: models, textures, instances and the fleet.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation and attribute data
//! - `fleet` groups the ship models into the two cloak states
//! - `floor` is the shadow-receiving ground quad

pub mod fleet;
pub mod floor;
pub mod instance;
pub mod model;
pub mod texture;
