//! Window setup, input routing and the per frame render passes.
//!
//! [`run`] owns the winit event loop. Every redraw applies the panel values,
//! advances the orbit camera and records two passes: a depth only pass into
//! the shadow map, then the colour pass over floor and fleet. The debug panel
//! draws last, straight onto the frame.

use std::{fmt::Debug, iter, sync::Arc};

#[cfg(feature = "integration-tests")]
use instant::Duration;
use instant::Instant;
#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

#[cfg(feature = "integration-tests")]
use crate::panel::PanelValues;
use crate::{
    context::Context,
    data_structures::{fleet::Fleet, floor::Floor, model::DrawModel, texture::Texture},
    panel::Panel,
    render::{Instanced, Render},
    resources,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// The captured frame handed to a [`RenderProbe`], still backed by the
/// mapped readback buffer.
#[cfg(feature = "integration-tests")]
pub type ProbeImage<'a> = image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>;

/// Drives a rendering assertion from a test: an optional scene setup applied
/// before the first frame plus a validation run over every captured frame.
///
/// Returning `Waiting` keeps the loop alive, `Passed` exits it cleanly and
/// `Failed` or an error panics the test.
#[cfg(feature = "integration-tests")]
pub struct RenderProbe {
    setup: Option<Box<dyn FnOnce(&mut PanelValues)>>,
    validate: Box<dyn for<'a> FnMut(u32, &ProbeImage<'a>) -> anyhow::Result<ImageTestResult>>,
}

#[cfg(feature = "integration-tests")]
impl RenderProbe {
    pub fn new<S, V>(setup: S, validate: V) -> Self
    where
        S: FnOnce(&mut PanelValues) + 'static,
        V: for<'a> FnMut(u32, &ProbeImage<'a>) -> anyhow::Result<ImageTestResult> + 'static,
    {
        Self {
            setup: Some(Box::new(setup)),
            validate: Box::new(validate),
        }
    }

    /// A probe that never asserts, so the loop runs like the real app.
    pub fn noop() -> Self {
        Self::new(|_| (), |_, _| Ok(ImageTestResult::Waiting))
    }
}

/// The renderable content of the diorama.
pub struct Scene {
    pub fleet: Fleet,
    pub floor: Floor,
}

impl Scene {
    async fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        let material_layout = resources::texture::diffuse_emissive_layout(device);
        let fleet = Fleet::new(device, queue, &material_layout).await?;
        let floor = Floor::new(device, queue, &material_layout);
        Ok(Self { fleet, floor })
    }

    fn render(&self) -> Render<'_> {
        Render::Composed(vec![
            Render::Opaque(self.floor.render()),
            self.fleet.render(),
        ])
    }
}

/// Application state bundle: GPU context, scene content and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Scene,
    panel: Panel,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = match Context::new(window).await {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let scene = match Scene::new(&ctx.device, &ctx.queue).await {
            Ok(scene) => scene,
            Err(e) => panic!("App initialization failed. Cannot load the scene: {}", e),
        };
        let panel = Panel::new(&ctx.device, ctx.config.format, &ctx.window);
        Self {
            ctx,
            scene,
            panel,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    /// Copies the current panel values into the scene and the light.
    fn apply_panel_values(&mut self) {
        let values = self.panel.values;
        self.scene.fleet.visible = values.visible;
        self.scene.fleet.cloak_enabled = values.cloaked;
        self.scene.fleet.cast_shadow = values.cast_shadow;
        self.scene.fleet.set_elevation(values.elevation);

        let light = &mut self.ctx.light;
        if light.uniform.intensity != values.light_intensity
            || light.uniform.position != values.light_position
        {
            light.uniform.intensity = values.light_intensity;
            light.uniform.set_position(values.light_position);
            self.ctx
                .queue
                .write_buffer(&light.buffer, 0, bytemuck::cast_slice(&[light.uniform]));
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_depth_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Depth Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_with_height(&self) -> (u32, u32) {
        // The img lib requires divisibility of 256...
        let width = self.ctx.config.width;
        let height = self.ctx.config.height;
        let width_offset = 256 - (width % 256);
        let height_offset = 256 - (height % 256);
        (width + width_offset, height + height_offset)
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.get_with_height();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    fn render(
        &mut self,
        #[cfg(feature = "integration-tests")] probe: &mut RenderProbe,
        #[cfg(feature = "integration-tests")] frame: u32,
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] proxy: &winit::event_loop::EventLoopProxy<AppEvent>,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        #[cfg(not(feature = "integration-tests"))]
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(feature = "integration-tests")]
        let (tex, view, depth_view) = {
            let extent3d = self.get_test_3d_extent();
            let tex = self.get_test_texture(extent3d);
            let depth = self.get_test_depth_texture(extent3d);
            let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
            let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
            (tex, view, depth_view)
        };

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        let shadow_casters = self.scene.fleet.render_shadow();
        {
            // The pass runs even with nothing to draw so that turning shadows
            // off clears the map back to fully lit.
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.shadow.texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(&self.ctx.shadow.pipeline);
            for instanced in &shadow_casters {
                shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                shadow_pass.draw_model_depth(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.light.bind_group,
                );
            }
        }

        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        #[cfg(feature = "integration-tests")]
                        view: &depth_view,
                        #[cfg(not(feature = "integration-tests"))]
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            let mut opaques: Vec<Instanced> = Vec::new();
            let mut cloaks: Vec<Instanced> = Vec::new();
            self.scene.render().batch(&mut opaques, &mut cloaks);

            render_pass.set_pipeline(&self.ctx.pipelines.basic);
            render_pass.set_bind_group(3, &self.ctx.shadow.bind_group, &[]);
            for instanced in opaques {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("you attempted to render something with zero instances");
                    continue;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_instanced(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }

            render_pass.set_pipeline(&self.ctx.pipelines.cloak);
            for instanced in cloaks {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("you attempted to render something with zero instances");
                    continue;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_untextured(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        // The panel would cover parts of the captured frame, so the test
        // builds leave it out.
        #[cfg(not(feature = "integration-tests"))]
        self.panel.draw(
            &self.ctx.window,
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &view,
            &self.ctx.config,
        );

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let (width, height) = self.get_with_height();
            let output_buffer_size = (u32_size * width * height) as wgpu::BufferAddress;
            let output_buffer_desc = wgpu::BufferDescriptor {
                size: output_buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: None,
                mapped_at_creation: false,
            };
            let output_buffer = self.ctx.device.create_buffer(&output_buffer_desc);
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(u32_size * width),
                        rows_per_image: Some(height),
                    },
                },
                self.get_test_3d_extent(),
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        {
            let fut_img = async {
                let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
                let buffer_slice = output_buffer.slice(..);
                buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                    tx.send(result).unwrap();
                });
                self.ctx
                    .device
                    .poll(wgpu::PollType::Wait {
                        submission_index: None,
                        timeout: Some(Duration::from_secs(3)),
                    })
                    .unwrap();
                rx.receive().await.unwrap().unwrap();
                let data = buffer_slice.get_mapped_range();
                let (width, height) = self.get_with_height();
                image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, data).unwrap()
            };
            let img: ProbeImage = async_runtime.block_on(fut_img);
            match (probe.validate)(frame, &img) {
                Err(e) => panic!("{}", e),
                Ok(ImageTestResult::Passed) => proxy
                    .send_event(AppEvent::Exit)
                    .expect("All assertions passed but the winit event-loop could not safely exit"),
                Ok(ImageTestResult::Failed) => panic!("Assertion failed"),
                Ok(ImageTestResult::Waiting) => (),
            }
        }

        output.present();
        Ok(())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    last_time: Instant,
    #[cfg(feature = "integration-tests")]
    probe: RenderProbe,
    #[cfg(feature = "integration-tests")]
    frame: u32,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        #[cfg(feature = "integration-tests")] probe: RenderProbe,
    ) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            last_time: Instant::now(),
            #[cfg(feature = "integration-tests")]
            probe,
            #[cfg(feature = "integration-tests")]
            frame: 0,
        }
    }
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(AppState),
    #[allow(dead_code)]
    Exit,
}
impl Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(AppState)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("fleet diorama");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            #[allow(unused_mut)]
            let mut app_state = self.async_runtime.block_on(AppState::new(window));
            #[cfg(feature = "integration-tests")]
            if let Some(setup) = self.probe.setup.take() {
                setup(&mut app_state.panel.values);
            }
            self.state = Some(app_state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let app_state = AppState::new(window).await;
                assert!(proxy.send_event(AppEvent::Initialized(app_state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(mut state) => {
                // This is the message from our wasm `spawn_local`
                // Important: Trigger a resize and redraw now that we are initialized
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            AppEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if !state.panel.wants_pointer() {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // egui gets the first look at every event
        let consumed = state.panel.on_window_event(&state.ctx.window, &event);
        // A release must always reach the controller or a drag could stick to
        // the cursor after it crosses the panel.
        let release = matches!(
            event,
            WindowEvent::MouseInput {
                state: winit::event::ElementState::Released,
                ..
            }
        );
        if !consumed || release {
            state.ctx.camera.controller.handle_window_events(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.apply_panel_values();

                // Update the camera
                state
                    .ctx
                    .camera
                    .controller
                    .update(&mut state.ctx.camera.camera, dt);
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                // Push pending group transforms down to the placements
                state.scene.fleet.update(&state.ctx.queue);

                #[cfg(feature = "integration-tests")]
                {
                    self.frame += 1;
                }

                match state.render(
                    #[cfg(feature = "integration-tests")]
                    &mut self.probe,
                    #[cfg(feature = "integration-tests")]
                    self.frame,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &self.proxy,
                ) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    run_with(
        #[cfg(feature = "integration-tests")]
        RenderProbe::noop(),
    )
}

/// Runs the app under the control of a [`RenderProbe`].
#[cfg(feature = "integration-tests")]
pub fn run_test(probe: RenderProbe) -> anyhow::Result<()> {
    run_with(probe)
}

fn run_with(#[cfg(feature = "integration-tests")] probe: RenderProbe) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<AppEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<AppEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(
        &event_loop,
        #[cfg(feature = "integration-tests")]
        probe,
    );

    event_loop.run_app(&mut app)?;

    Ok(())
}
