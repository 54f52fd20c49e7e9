//! In-window debug panel. egui draws it over the finished frame and the
//! render loop applies [`PanelValues`] each frame.

use winit::{event::WindowEvent, window::Window};

use crate::layout;

pub const ELEVATION_RANGE: std::ops::RangeInclusive<f32> = 1.0..=3.0;
pub const ELEVATION_STEP: f64 = 0.1;
pub const LIGHT_INTENSITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;
pub const LIGHT_INTENSITY_STEP: f64 = 0.001;
pub const LIGHT_POSITION_RANGE: std::ops::RangeInclusive<f32> = -10.0..=10.0;
pub const LIGHT_POSITION_STEP: f64 = 0.001;

/// Everything the panel can tweak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelValues {
    pub elevation: f32,
    pub visible: bool,
    pub cloaked: bool,
    pub cast_shadow: bool,
    pub light_intensity: f32,
    pub light_position: [f32; 3],
}

impl Default for PanelValues {
    fn default() -> Self {
        Self {
            elevation: layout::FLEET_BASE_POSITION[1],
            visible: true,
            cloaked: false,
            cast_shadow: true,
            light_intensity: layout::LIGHT_INTENSITY,
            light_position: layout::LIGHT_POSITION,
        }
    }
}

pub struct Panel {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    pub values: PanelValues,
}

impl Panel {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            None,
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                predictable_texture_filtering: false,
            },
        );

        Self {
            ctx,
            state,
            renderer,
            values: PanelValues::default(),
        }
    }

    /// Forwards a winit event to egui. True means egui claimed it, e.g. a
    /// click landed on one of the sliders.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer currently interacts with the panel. Keeps orbit
    /// drags from fighting with slider drags.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input()
    }

    pub fn draw(
        &mut self,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        config: &wgpu::SurfaceConfiguration,
    ) {
        let input = self.state.take_egui_input(window);
        let values = &mut self.values;
        let output = self.ctx.run(input, |ctx| {
            egui::SidePanel::left("debug_panel").show(ctx, |ui| {
                egui::CollapsingHeader::new("Fleet")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.add(
                            egui::Slider::new(&mut values.elevation, ELEVATION_RANGE)
                                .step_by(ELEVATION_STEP)
                                .text("elevation"),
                        );
                        ui.checkbox(&mut values.visible, "visible");
                        ui.checkbox(&mut values.cloaked, "cloaked");
                    });
                egui::CollapsingHeader::new("Light")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.add(
                            egui::Slider::new(&mut values.light_intensity, LIGHT_INTENSITY_RANGE)
                                .step_by(LIGHT_INTENSITY_STEP)
                                .text("intensity"),
                        );
                        for (axis, label) in values.light_position.iter_mut().zip(["x", "y", "z"]) {
                            ui.add(
                                egui::Slider::new(axis, LIGHT_POSITION_RANGE)
                                    .step_by(LIGHT_POSITION_STEP)
                                    .text(label),
                            );
                        }
                    });
                egui::CollapsingHeader::new("Shadow")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.checkbox(&mut values.cast_shadow, "cast shadow");
                    });
            });
        });

        self.state
            .handle_platform_output(window, output.platform_output);

        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        // No paint callbacks are registered, so the returned command buffers
        // are always empty.
        self.renderer
            .update_buffers(device, queue, encoder, &primitives, &screen);
        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Panel Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.renderer
                .render(&mut pass.forget_lifetime(), &primitives, &screen);
        }
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_scene_layout() {
        let values = PanelValues::default();

        assert_eq!(values.elevation, layout::FLEET_BASE_POSITION[1]);
        assert!(values.visible);
        assert!(!values.cloaked);
        assert!(values.cast_shadow);
        assert_eq!(values.light_intensity, layout::LIGHT_INTENSITY);
        assert_eq!(values.light_position, layout::LIGHT_POSITION);
    }

    #[test]
    fn test_defaults_sit_inside_the_slider_ranges() {
        let values = PanelValues::default();

        assert!(ELEVATION_RANGE.contains(&values.elevation));
        assert!(LIGHT_INTENSITY_RANGE.contains(&values.light_intensity));
        for axis in values.light_position {
            assert!(LIGHT_POSITION_RANGE.contains(&axis));
        }
    }

    #[test]
    fn test_slider_ranges_and_steps() {
        assert_eq!(ELEVATION_RANGE, 1.0..=3.0);
        assert_eq!(ELEVATION_STEP, 0.1);
        assert_eq!(LIGHT_INTENSITY_RANGE, 0.0..=1.0);
        assert_eq!(LIGHT_INTENSITY_STEP, 0.001);
        assert_eq!(LIGHT_POSITION_RANGE, -10.0..=10.0);
        assert_eq!(LIGHT_POSITION_STEP, 0.001);
    }
}
