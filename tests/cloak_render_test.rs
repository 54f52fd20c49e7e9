#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_tint_cloaked_fleet_blue() {
    use fleet_diorama::app::ImageTestResult;

    probe_test!(
        |values: &mut fleet_diorama::panel::PanelValues| {
            values.cloaked = true;
        },
        |frame, texture| {
            // Let a settled frame through first.
            if frame <= 1 {
                return Ok(ImageTestResult::Waiting);
            }

            // Floor and sky are grey and black, both with equal red and blue.
            // Only the cloak tint pushes blue past red, strongest along the
            // fresnel silhouettes of the ships.
            let most_blue_shift = texture
                .pixels()
                .map(|image::Rgba([r, _, b, _])| b.saturating_sub(*r))
                .max()
                .unwrap_or(0);
            assert!(
                most_blue_shift > 16,
                "no cloak tint found, strongest blue shift was {}",
                most_blue_shift
            );

            Ok(ImageTestResult::Passed)
        }
    );
}
