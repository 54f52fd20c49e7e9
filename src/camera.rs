//! Orbit camera, projection and the camera uniform.
//!
//! The camera circles a fixed focus point. Dragging with the left mouse
//! button accumulates rotation deltas which the per-frame update consumes
//! gradually, which gives the orbit its inertial feel. Scrolling dollies
//! towards or away from the focus point.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_PITCH: Rad<f32> = Rad(FRAC_PI_2 - 0.01);
const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 60.0;
/// Distance scale applied per scroll line, matching the usual orbit feel.
const ZOOM_STEP: f32 = 0.95;

/// An orbiting camera described by its focus point and spherical coordinates.
#[derive(Debug)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub distance: f32,
}

impl Camera {
    /// Builds the camera from a starting position and the point it orbits.
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        let position = position.into();
        let target = target.into();
        let offset: Vector3<f32> = position - target;
        let distance = offset.magnitude();
        let yaw = Rad(offset.z.atan2(offset.x));
        let pitch = Rad((offset.y / distance).asin());

        Self {
            target,
            yaw,
            pitch,
            distance,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let offset = Vector3::new(
            self.distance * cos_pitch * cos_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * sin_yaw,
        );
        self.target + offset
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }
}

pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Turns mouse input into camera motion.
///
/// Rotation deltas are not applied at once. Every update consumes a fraction
/// and lets the rest decay, so a flick keeps the camera drifting briefly
/// after the button is released. The decay exponent is scaled by the frame
/// time to keep the feel independent of the frame rate.
#[derive(Debug)]
pub struct CameraController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    dragging: bool,
    sensitivity: f32,
    damping: f32,
}

impl CameraController {
    pub fn new(sensitivity: f32, damping: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            dragging: false,
            sensitivity,
            damping,
        }
    }

    /// Raw mouse motion, only honoured while the left button is held.
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        if !self.dragging {
            return;
        }
        self.rotate_horizontal += mouse_dx as f32 * self.sensitivity;
        self.rotate_vertical += mouse_dy as f32 * self.sensitivity;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 100.0,
                };
            }
            _ => (),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        // Dolly immediately, only rotation is damped.
        if self.scroll != 0.0 {
            camera.distance =
                (camera.distance * ZOOM_STEP.powf(self.scroll)).clamp(MIN_DISTANCE, MAX_DISTANCE);
            self.scroll = 0.0;
        }

        let decay = (1.0 - self.damping).powf(dt.as_secs_f32() * 60.0);
        let consumed = 1.0 - decay;
        camera.yaw += Rad(self.rotate_horizontal * consumed);
        camera.pitch += Rad(-self.rotate_vertical * consumed);
        self.rotate_horizontal *= decay;
        self.rotate_vertical *= decay;

        if camera.pitch < -SAFE_PITCH {
            camera.pitch = -SAFE_PITCH;
        } else if camera.pitch > SAFE_PITCH {
            camera.pitch = SAFE_PITCH;
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the render loop needs to drive the camera.
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;

    fn frame() -> Duration {
        Duration::from_secs_f32(1.0 / 60.0)
    }

    #[test]
    fn test_spherical_round_trip() {
        let camera = Camera::new(layout::CAMERA_POSITION, layout::CAMERA_TARGET);
        let position = camera.position();

        assert!((position.x - layout::CAMERA_POSITION[0]).abs() < 1e-4);
        assert!((position.y - layout::CAMERA_POSITION[1]).abs() < 1e-4);
        assert!((position.z - layout::CAMERA_POSITION[2]).abs() < 1e-4);
    }

    #[test]
    fn test_drag_only_registers_while_button_held() {
        let mut controller = CameraController::new(0.004, 0.1);

        controller.handle_mouse(10.0, 0.0);
        assert_eq!(controller.rotate_horizontal, 0.0);

        controller.dragging = true;
        controller.handle_mouse(10.0, 0.0);
        assert!((controller.rotate_horizontal - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_damped_rotation_applies_the_whole_delta() {
        let mut camera = Camera::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0]);
        let start_yaw = camera.yaw;
        let mut controller = CameraController::new(1.0, 0.1);
        controller.rotate_horizontal = 1.0;

        // The flick drains over many frames but no rotation is lost.
        for _ in 0..400 {
            controller.update(&mut camera, frame());
        }

        assert!((camera.yaw.0 - (start_yaw.0 + 1.0)).abs() < 1e-3);
        assert!(controller.rotate_horizontal.abs() < 1e-3);
    }

    #[test]
    fn test_dolly_clamps_to_the_scene() {
        let mut camera = Camera::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0]);
        let mut controller = CameraController::new(0.004, 0.1);

        controller.scroll = 500.0;
        controller.update(&mut camera, frame());
        assert_eq!(camera.distance, MIN_DISTANCE);

        controller.scroll = -500.0;
        controller.update(&mut camera, frame());
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_pitch_never_reaches_the_pole() {
        let mut camera = Camera::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0]);
        let mut controller = CameraController::new(1.0, 0.5);
        controller.rotate_vertical = -100.0;

        controller.update(&mut camera, frame());

        assert!(camera.pitch <= SAFE_PITCH);
        assert!(camera.pitch > Rad(1.0));
    }

    #[test]
    fn test_projection_resize_updates_aspect() {
        let mut projection = Projection::new(100, 100, cgmath::Deg(75.0), 0.1, 100.0);
        projection.resize(200, 100);
        assert_eq!(projection.aspect, 2.0);
    }
}
