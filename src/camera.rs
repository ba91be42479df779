//! Free-look camera.
//!
//! [`Camera`] keeps a position plus yaw/pitch angles and derives an
//! orthonormal front/right/up basis from them after every angle change.
//! [`CameraController`] turns winit input into camera calls, [`Projection`]
//! and [`CameraUniform`] prepare the matrices for a shader.

use std::collections::HashSet;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept strictly inside this bound so that `front` never becomes parallel to world up.
pub const PITCH_LIMIT: f32 = 89.9;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 78.0;

/// Direction of a single keyboard movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Initial orientation and tuning of a [`Camera`]. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Vertical field of view.
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    zoom: Deg<f32>,
}

impl Camera {
    /// Camera at `position` looking along `yaw`/`pitch`, tuned by [`CameraConfig::default`].
    pub fn new<P: Into<Point3<f32>>, U: Into<Vector3<f32>>, Y: Into<Deg<f32>>, R: Into<Deg<f32>>>(
        position: P,
        world_up: U,
        yaw: Y,
        pitch: R,
    ) -> Self {
        let config = CameraConfig {
            yaw: yaw.into().0,
            pitch: pitch.into().0,
            ..Default::default()
        };
        Self::with_config(position, world_up, config)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_scalars(
        pos_x: f32,
        pos_y: f32,
        pos_z: f32,
        up_x: f32,
        up_y: f32,
        up_z: f32,
        yaw: f32,
        pitch: f32,
    ) -> Self {
        Self::new(
            (pos_x, pos_y, pos_z),
            (up_x, up_y, up_z),
            Deg(yaw),
            Deg(pitch),
        )
    }

    pub fn with_config<P: Into<Point3<f32>>, U: Into<Vector3<f32>>>(
        position: P,
        world_up: U,
        config: CameraConfig,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            world_up: world_up.into(),
            yaw: Deg(config.yaw),
            pitch: Deg(config.pitch),
            movement_speed: config.movement_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            zoom: Deg(config.zoom),
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn world_up(&self) -> Vector3<f32> {
        self.world_up
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    /// Vertical field of view.
    pub fn zoom(&self) -> Deg<f32> {
        self.zoom
    }

    /// Right-handed look-at from `position` towards `position + front`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Moves `movement_speed * delta_time` units in one direction.
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Turns the camera by mouse offsets (scaled by the sensitivity).
    pub fn process_mouse_movement(&mut self, xoffset: f32, yoffset: f32, constrain_pitch: bool) {
        self.yaw += Deg(xoffset * self.mouse_sensitivity);
        self.pitch += Deg(yoffset * self.mouse_sensitivity);

        if constrain_pitch {
            self.pitch = Deg(self.pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT));
        }

        self.update_vectors();
    }

    /// Scrolling up narrows the field of view.
    pub fn process_mouse_scroll(&mut self, yoffset: f32) {
        self.zoom = Deg((self.zoom.0 - yoffset).clamp(MIN_ZOOM, MAX_ZOOM));
    }

    fn update_vectors(&mut self) {
        let (sin_yaw, cos_yaw) = cgmath::Rad::from(self.yaw).0.sin_cos();
        let (sin_pitch, cos_pitch) = cgmath::Rad::from(self.pitch).0.sin_cos();
        self.front = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::with_config((0.0, 0.0, 0.0), Vector3::unit_y(), CameraConfig::default())
    }
}

/// Perspective projection using the camera's zoom as vertical field of view.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self, fovy: Deg<f32>) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera data as laid out in a uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix(camera.zoom()) * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects winit input and applies it to a [`Camera`] once per frame.
///
/// Held movement keys each apply one [`CameraMovement`] per update, mouse
/// motion and scrolling are accumulated until the next update.
#[derive(Debug, Default)]
pub struct CameraController {
    held: HashSet<CameraMovement>,
    mouse_dx: f32,
    mouse_dy: f32,
    scroll: f32,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key moves the camera.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let movement = match key {
            KeyCode::KeyW | KeyCode::ArrowUp => CameraMovement::Forward,
            KeyCode::KeyS | KeyCode::ArrowDown => CameraMovement::Backward,
            KeyCode::KeyA | KeyCode::ArrowLeft => CameraMovement::Left,
            KeyCode::KeyD | KeyCode::ArrowRight => CameraMovement::Right,
            _ => return false,
        };
        match state {
            ElementState::Pressed => self.held.insert(movement),
            ElementState::Released => self.held.remove(&movement),
        };
        true
    }

    /// Raw mouse delta as reported by `DeviceEvent::MouseMotion` (y grows downwards).
    pub fn process_mouse(&mut self, dx: f64, dy: f64) {
        self.mouse_dx += dx as f32;
        self.mouse_dy -= dy as f32;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
        };
    }

    /// Feeds keyboard and scroll window events. Returns `true` if the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.process_keyboard(*key, *state),
            WindowEvent::MouseWheel { delta, .. } => {
                self.process_scroll(delta);
                true
            }
            _ => false,
        }
    }

    pub fn update_camera(&mut self, camera: &mut Camera, dt: std::time::Duration) {
        let dt = dt.as_secs_f32();
        // fixed order keeps updates deterministic
        for movement in [
            CameraMovement::Forward,
            CameraMovement::Backward,
            CameraMovement::Left,
            CameraMovement::Right,
        ] {
            if self.held.contains(&movement) {
                camera.process_keyboard(movement, dt);
            }
        }

        if self.mouse_dx != 0.0 || self.mouse_dy != 0.0 {
            camera.process_mouse_movement(self.mouse_dx, self.mouse_dy, true);
            self.mouse_dx = 0.0;
            self.mouse_dy = 0.0;
        }
        if self.scroll != 0.0 {
            camera.process_mouse_scroll(self.scroll);
            self.scroll = 0.0;
        }
    }
}
