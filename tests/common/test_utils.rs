//! Shared helpers for the GPU integration tests.

/// Builds a [`fleet_diorama::app::RenderProbe`] from a setup and a validate
/// closure and runs the app under it.
///
/// The validate closure sees the frame number and the captured frame. The
/// surface needs a configure round trip before the first capture arrives, so
/// returning `Waiting` for early frames is the usual pattern.
#[macro_export]
macro_rules! probe_test {
    ($setup:expr, $validate:expr) => {{
        let probe = fleet_diorama::app::RenderProbe::new($setup, $validate);
        fleet_diorama::app::run_test(probe).expect("Failed to run the app for an integration test.");
    }};
}

/// The rgba pixel a clear colour turns into in the captured frame.
#[cfg(feature = "integration-tests")]
#[allow(dead_code)]
pub(crate) fn colour_to_pixel(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}
