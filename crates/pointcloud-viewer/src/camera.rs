use crate::picking::Ray;
use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::{PI, TAU};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Closest the orbit may get to straight up or straight down (radians).
pub const POLAR_EPS: f32 = 1e-3;

const ZOOM_STEP: f32 = 0.95;
const MIN_RADIUS: f32 = 0.01;
const MAX_RADIUS: f32 = 1.0e7;

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The world point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Angle around the world Y axis, measured from +Z towards +X (radians).
    pub azimuth_rad: f32,
    /// Angle from the world +Y axis (radians).
    pub polar_rad: f32,

    // --- Derived (updated by `update()`) ---
    position: Vec3,

    // --- Projection ---
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// A 75° perspective camera at (0, 0, 5) looking at the origin.
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            radius: 5.0,
            azimuth_rad: 0.0,
            polar_rad: 0.5 * PI,
            position: Vec3::ZERO,
            fov_y_rad: 75.0f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        };
        camera.update();
        camera
    }

    /// Recomputes the camera position from the orbit parameters. Must be
    /// called after any of them change.
    pub fn update(&mut self) {
        self.polar_rad = self.polar_rad.clamp(POLAR_EPS, PI - POLAR_EPS);
        self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);

        let (sin_p, cos_p) = self.polar_rad.sin_cos();
        let (sin_a, cos_a) = self.azimuth_rad.sin_cos();
        let offset = Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.radius;
        self.position = self.target + offset;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Aspect ratio follows the drawable size exactly.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Right-handed perspective with a 0..1 depth range, as wgpu expects.
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// World-space ray from the eye through a point in normalized device
    /// coordinates.
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let inv = self.view_proj().inverse();
        let p = inv * Vec4::new(ndc_x, ndc_y, 0.5, 1.0);
        let through = p.truncate() / p.w;
        Ray {
            origin: self.position,
            dir: (through - self.position).normalize(),
        }
    }

    /// Looks straight down at `target` from `distance`, pushing the far plane
    /// out when the scene would otherwise be clipped.
    pub fn frame(&mut self, target: Vec3, distance: f32) {
        self.target = target;
        self.radius = distance;
        self.azimuth_rad = 0.0;
        self.polar_rad = POLAR_EPS;
        self.far = self.far.max(distance * 4.0);
        self.update();
    }
}

/// Mouse-driven orbit controls: left drag orbits, right drag pans, the wheel
/// zooms.
#[derive(Debug, Default)]
pub struct CameraController {
    rotating: bool,
    panning: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles window events and updates the camera. `viewport_height` scales
    /// drags so one full-height drag is one full turn.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera, viewport_height: u32) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                self.on_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor((position.x, position.y), camera, viewport_height);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_mouse = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.on_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    /// Events the overlay consumed. Only button releases get through, so a
    /// drag that ends over the overlay still stops orbiting or panning.
    pub fn handle_overlay_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseInput {
            button,
            state: ElementState::Released,
            ..
        } = event
        {
            self.on_button(*button, false);
        }
    }

    pub fn on_button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right => self.panning = pressed,
            _ => {}
        }
    }

    /// Positive `delta` (wheel up) zooms in.
    pub fn on_scroll(&mut self, delta: f32, camera: &mut Camera) {
        camera.radius *= ZOOM_STEP.powf(delta);
        camera.update();
    }

    pub fn on_cursor(&mut self, xy: (f64, f64), camera: &mut Camera, viewport_height: u32) {
        if let Some(last) = self.last_mouse {
            let h = viewport_height.max(1) as f32;
            let dx = (xy.0 - last.0) as f32;
            let dy = (xy.1 - last.1) as f32;

            if self.rotating {
                camera.azimuth_rad -= TAU * dx / h;
                camera.polar_rad -= TAU * dy / h;
                camera.update();
            } else if self.panning {
                self.pan(dx, dy, camera, h);
            }
        }
        self.last_mouse = Some(xy);
    }

    /// Moves the target in the view plane so the point under the cursor
    /// follows the mouse at the target's depth.
    fn pan(&self, dx: f32, dy: f32, camera: &mut Camera, viewport_height: f32) {
        let view = camera.view();
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();

        let target_distance = camera.radius * (0.5 * camera.fov_y_rad).tan();
        let scale = 2.0 * target_distance / viewport_height;

        camera.target += -right * dx * scale + up * dy * scale;
        camera.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn starts_five_units_out_on_z() {
        let cam = Camera::new(16.0 / 9.0);
        let p = cam.position();
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, 5.0, epsilon = 1e-5);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 1000.0);
    }

    #[test]
    fn aspect_follows_resize_exactly() {
        let mut cam = Camera::new(1.0);
        cam.set_aspect(1280, 720);
        assert_eq!(cam.aspect, 1280.0 / 720.0);
        cam.set_aspect(0, 720);
        assert_eq!(cam.aspect, 1280.0 / 720.0, "minimized windows are ignored");
    }

    #[test]
    fn centre_ray_points_at_target() {
        let cam = Camera::new(1.5);
        let ray = cam.ray_from_ndc(0.0, 0.0);
        assert_abs_diff_eq!(ray.dir.z, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(ray.origin.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn corner_ray_leans_up_and_right() {
        let cam = Camera::new(1.0);
        let ray = cam.ray_from_ndc(1.0, 1.0);
        assert!(ray.dir.x > 0.0 && ray.dir.y > 0.0 && ray.dir.z < 0.0);
        // Half the vertical field of view at the top edge.
        let tan = ray.dir.y / -ray.dir.z;
        assert_abs_diff_eq!(tan, (37.5f32).to_radians().tan(), epsilon = 1e-4);
    }

    #[test]
    fn framing_looks_down_from_above() {
        let mut cam = Camera::new(1.0);
        cam.frame(Vec3::ZERO, 2_000.0);
        let p = cam.position();
        assert_abs_diff_eq!(p.y, 2_000.0, epsilon = 1.0);
        assert!(cam.far >= 2_000.0 * 4.0);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut cam = Camera::new(1.0);
        let mut ctl = CameraController::new();
        ctl.on_button(MouseButton::Left, true);
        ctl.on_cursor((0.0, 0.0), &mut cam, 100);
        ctl.on_cursor((0.0, 1_000.0), &mut cam, 100);
        assert!(cam.polar_rad >= POLAR_EPS && cam.polar_rad <= PI - POLAR_EPS);
    }

    #[test]
    fn drag_without_button_does_nothing() {
        let mut cam = Camera::new(1.0);
        let mut ctl = CameraController::new();
        let before = cam.position();
        ctl.on_cursor((10.0, 10.0), &mut cam, 100);
        ctl.on_cursor((60.0, 40.0), &mut cam, 100);
        assert_eq!(cam.position(), before);
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut cam = Camera::new(1.0);
        let mut ctl = CameraController::new();
        ctl.on_scroll(1.0, &mut cam);
        assert_abs_diff_eq!(cam.radius, 5.0 * 0.95, epsilon = 1e-5);
        ctl.on_scroll(-2.0, &mut cam);
        assert!(cam.radius > 5.0);
    }

    #[test]
    fn right_drag_pans_the_target() {
        let mut cam = Camera::new(1.0);
        let mut ctl = CameraController::new();
        ctl.on_button(MouseButton::Right, true);
        ctl.on_cursor((50.0, 50.0), &mut cam, 100);
        ctl.on_cursor((60.0, 50.0), &mut cam, 100);
        // Dragging right moves the scene right, i.e. the target left.
        assert!(cam.target.x < 0.0);
        assert_abs_diff_eq!(cam.target.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn release_over_overlay_ends_the_drag() {
        let mut cam = Camera::new(1.0);
        let mut ctl = CameraController::new();
        let device_id = unsafe { winit::event::DeviceId::dummy() };
        let mouse = |state| WindowEvent::MouseInput {
            device_id,
            state,
            button: MouseButton::Left,
        };

        ctl.handle_event(&mouse(ElementState::Pressed), &mut cam, 100);
        // A press swallowed by the overlay must not start a drag.
        ctl.handle_overlay_event(&mouse(ElementState::Pressed));
        ctl.handle_overlay_event(&mouse(ElementState::Released));

        let before = cam.position();
        ctl.on_cursor((10.0, 10.0), &mut cam, 100);
        ctl.on_cursor((60.0, 40.0), &mut cam, 100);
        assert_eq!(cam.position(), before);
    }
}
