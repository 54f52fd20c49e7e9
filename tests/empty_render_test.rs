#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour_sky_without_fleet() {
    use fleet_diorama::app::ImageTestResult;

    probe_test!(
        |values: &mut fleet_diorama::panel::PanelValues| {
            values.visible = false;
        },
        |frame, texture| {
            // Let a settled frame through first.
            if frame <= 1 {
                return Ok(ImageTestResult::Waiting);
            }

            // The camera looks down at the floor, so the whole top scanline
            // is sky and must carry the clear colour.
            let sky = common::test_utils::colour_to_pixel(wgpu::Color::BLACK);
            for x in 0..texture.width() {
                assert_eq!(
                    *texture.get_pixel(x, 0),
                    sky,
                    "pixel ({}, 0) is not sky",
                    x
                );
            }

            // The floor still renders with the fleet hidden.
            let floor_lit = texture.pixels().any(|pixel| *pixel != sky);
            assert!(floor_lit, "expected the floor to show without the fleet");

            Ok(ImageTestResult::Passed)
        }
    );
}
