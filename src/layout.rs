//! The fixed arrangement of the diorama.
//!
//! Everything that defines what the scene looks like lives here as plain
//! constants: which ship models to load, where each ship sits, which texture
//! files dress each model, and the floor/light/camera defaults. The tables are
//! parallel per ship type; [`FLEET`] ties them together so an index mismatch
//! cannot happen.

/// One ship type: its geometry file, every position it is placed at, and the
/// texture files for its decloaked appearance.
///
/// The first texture entry is the diffuse map, the second the emissive map.
/// A few ships ship with a third gloss/specular map; it is kept in the
/// manifest for completeness but the material does not sample it.
pub struct ShipSpec {
    pub obj: &'static str,
    pub positions: &'static [[f32; 3]],
    pub textures: &'static [&'static str],
}

/// Subdirectory of `assets/` holding the OBJ files.
pub const MODEL_DIR: &str = "models/fleet";
/// Subdirectory of `assets/` holding the texture images.
pub const TEXTURE_DIR: &str = "textures/fleet";

/// All ships share one uniform scale.
pub const FLEET_SCALE: f32 = 0.75;
/// The fleet group hovers one unit above the floor; the elevation slider
/// moves the y component.
pub const FLEET_BASE_POSITION: [f32; 3] = [0.0, 1.0, 0.0];

pub const FLEET: &[ShipSpec] = &[
    ShipSpec {
        obj: "battlecruiser_silver.obj",
        positions: &[
            [-5.0, 1.5, -2.0],
            [5.0, 1.5, -2.0],
            [-10.0, 0.0, -6.0],
            [10.0, 0.0, -6.0],
            [0.0, 0.75, -8.0],
        ],
        textures: &[
            "battlecruiser_silver_diff.jpg",
            "battlecruiser_silver_emis.jpg",
            "battlecruiser_silver_gloss.jpg",
        ],
    },
    ShipSpec {
        obj: "battlecruiser_umojan.obj",
        positions: &[[0.0, 0.0, 0.0]],
        textures: &[
            "battlecruiser_umojan_diffuse.jpg",
            "battlecruiser_umojan_emissive.jpg",
        ],
    },
    ShipSpec {
        obj: "liberator.obj",
        positions: &[[-5.0, 0.0, 3.0], [0.0, 0.0, 5.0], [5.0, 0.0, 3.0]],
        textures: &["liberator_diff.jpg", "liberator_emiss.jpg"],
    },
    ShipSpec {
        obj: "raven_BO.obj",
        positions: &[[0.0, 3.0, -3.0]],
        textures: &["raven_diffuse.jpg", "raven_blackops_emiss.jpg"],
    },
    ShipSpec {
        obj: "viking.obj",
        positions: &[[-2.5, 1.0, 2.5], [2.5, 1.0, 2.5]],
        textures: &["viking_diffuse.jpg", "viking_emissive.jpg"],
    },
    ShipSpec {
        obj: "wraith.obj",
        positions: &[
            [-2.5, 0.0, 7.5],
            [2.5, 0.0, 7.5],
            [-4.0, -0.5, -6.0],
            [4.0, -0.5, -6.0],
        ],
        textures: &[
            "wraith_diffuse.jpg",
            "wraith_emissive.jpg",
            "wraith_specular.jpg",
        ],
    },
];

/// Side length of the square floor plane.
pub const FLOOR_SIZE: f32 = 30.0;
/// Floor albedo, `#444444` in sRGB bytes.
pub const FLOOR_COLOR: [u8; 4] = [0x44, 0x44, 0x44, 0xff];

pub const AMBIENT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const AMBIENT_INTENSITY: f32 = 0.8;

pub const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const LIGHT_INTENSITY: f32 = 0.6;
pub const LIGHT_POSITION: [f32; 3] = [-5.0, 5.0, 0.0];

pub const SHADOW_MAP_SIZE: u32 = 1024;
/// Half-extent of the orthographic shadow frustum (left/right/top/bottom).
pub const SHADOW_EXTENT: f32 = 7.0;
pub const SHADOW_NEAR: f32 = 0.5;
pub const SHADOW_FAR: f32 = 15.0;

pub const CAMERA_POSITION: [f32; 3] = [-5.0, 10.0, 10.0];
/// The orbit target sits at the umojan battlecruiser's deck height.
pub const CAMERA_TARGET: [f32; 3] = [0.0, 0.75, 0.0];
pub const CAMERA_FOVY_DEG: f32 = 75.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 100.0;

/// Total number of ship placements across all squadrons.
pub fn ship_count() -> usize {
    FLEET.iter().map(|spec| spec.positions.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_manifest_counts() {
        assert_eq!(FLEET.len(), 6);
        assert_eq!(ship_count(), 16);

        let placements: Vec<usize> = FLEET.iter().map(|spec| spec.positions.len()).collect();
        assert_eq!(placements, vec![5, 1, 3, 1, 2, 4]);
    }

    #[test]
    fn test_every_ship_has_geometry_and_maps() {
        for spec in FLEET {
            assert!(spec.obj.ends_with(".obj"), "{} is not an obj", spec.obj);
            assert!(
                spec.textures.len() >= 2,
                "{} needs a diffuse and an emissive map",
                spec.obj
            );
            // Diffuse and emissive only, the extra gloss maps are unused.
            for texture in &spec.textures[..2] {
                assert!(texture.ends_with(".jpg"), "{} is not a jpg", texture);
            }
            assert!(!spec.positions.is_empty());
        }
    }

    #[test]
    fn test_placements_fit_on_the_floor() {
        let half = FLOOR_SIZE / 2.0;
        for spec in FLEET {
            for [x, _, z] in spec.positions {
                assert!(x.abs() < half, "{} sticks out sideways", spec.obj);
                assert!(z.abs() < half, "{} sticks out front or back", spec.obj);
            }
        }
    }
}
