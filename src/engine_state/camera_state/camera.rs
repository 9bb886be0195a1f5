//! # Camera Implementation
//!
//! A free-flying first-person camera:
//! - `Camera`: position plus yaw/pitch in degrees, with the derived front vector
//! - `CameraView`: the copyable slice of the camera the generation workers need
//! - `Projection`: perspective settings, including the scroll-wheel field of view
//! - `CameraController`: accumulates one frame of input and applies it
//! - `CameraUniform`: packed data for the shaders
//!
//! ## Conventions
//! - Yaw 0 looks along +X, yaw 90 along +Z
//! - Pitch is clamped to ±89 degrees so the view never flips over the pole
//! - Mouse right turns right, mouse up looks up

use cgmath::*;
use web_time::Duration;

use crate::engine_state::PlayerAction;

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// Maps clip-space Z from [-1, 1] to the [0, 1] range WGPU expects.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

/// Starting position of the camera.
pub const INITIAL_POSITION: Point3<f32> = Point3::new(0.0, 0.0, 3.0);
/// Starting yaw in degrees.
pub const INITIAL_YAW: f32 = 50.0;
/// Starting pitch in degrees.
pub const INITIAL_PITCH: f32 = 0.0;
/// Pitch never leaves `[-PITCH_LIMIT, PITCH_LIMIT]` degrees.
pub const PITCH_LIMIT: f32 = 89.0;
/// Degrees turned per unit of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Movement speed without modifiers, units per second.
pub const WALK_SPEED: f32 = 2.5;
/// Movement speed with left shift held.
pub const SPRINT_SPEED: f32 = 10.0;
/// Movement speed with left control held; wins over shift.
pub const FLY_SPEED: f32 = 500.0;

/// Vertical field of view at startup, in degrees.
pub const DEFAULT_FOV: f32 = 90.0;
/// Smallest field of view the scroll wheel reaches.
pub const MIN_FOV: f32 = 1.0;
/// Largest field of view the scroll wheel reaches.
pub const MAX_FOV: f32 = 120.0;
/// Near clipping plane distance.
pub const Z_NEAR: f32 = 0.1;
/// Far clipping plane distance. Fog reaches full strength here.
pub const Z_FAR: f32 = 500.0;

/// Sky color, used for the clear color and as the fog color.
pub const SKY_COLOR: [f32; 3] = [0.082, 0.721, 0.901];

/// Unit vector a camera with the given angles looks along.
pub fn front_from_angles(yaw: Deg<f32>, pitch: Deg<f32>) -> Vector3<f32> {
    let (yaw_sin, yaw_cos) = Rad::from(yaw).0.sin_cos();
    let (pitch_sin, pitch_cos) = Rad::from(pitch).0.sin_cos();
    Vector3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize()
}

/// Where the camera is and where it looks.
///
/// Published once per frame by the render thread and read by every generation worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World-space position
    pub position: Point3<f32>,
    /// Unit forward direction
    pub front: Vector3<f32>,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: INITIAL_POSITION,
            front: front_from_angles(Deg(INITIAL_YAW), Deg(INITIAL_PITCH)),
        }
    }
}

/// A first-person camera in 3D space.
#[derive(Debug)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera {
    /// Creates a camera at `position` looking along the given angles.
    ///
    /// # Arguments
    /// * `position` - Initial position in world space
    /// * `yaw` - Horizontal angle, 0 looks along +X
    /// * `pitch` - Vertical angle, clamped to ±[`PITCH_LIMIT`]
    pub fn new<V: Into<Point3<f32>>>(position: V, yaw: Deg<f32>, pitch: Deg<f32>) -> Self {
        let pitch = Deg(pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT));
        Self {
            position: position.into(),
            yaw,
            pitch,
            front: front_from_angles(yaw, pitch),
            up: Vector3::unit_y(),
        }
    }

    /// Unit forward direction.
    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    /// Unit vector to the camera's right, parallel to the ground.
    pub fn right(&self) -> Vector3<f32> {
        self.front.cross(self.up).normalize()
    }

    /// Turns the camera by a mouse motion delta.
    ///
    /// # Arguments
    /// * `delta_x` - Horizontal motion, positive to the right
    /// * `delta_y` - Vertical motion, positive downwards as reported by the window system
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += Deg(delta_x * MOUSE_SENSITIVITY);
        self.pitch = Deg((self.pitch.0 - delta_y * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT));
        self.front = front_from_angles(self.yaw, self.pitch);
    }

    /// Copy of the position and front vector.
    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position,
            front: self.front,
        }
    }

    /// Calculates the view matrix for this camera.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new(INITIAL_POSITION, Deg(INITIAL_YAW), Deg(INITIAL_PITCH))
    }
}

/// Perspective projection settings.
#[derive(Debug)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view
    fovy: Deg<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new(width: u32, height: u32, fovy: Deg<f32>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy,
            znear,
            zfar,
        }
    }

    /// Updates the projection's aspect ratio for viewport resizing.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Narrows the field of view by `lines` scroll steps, one degree each.
    pub fn zoom(&mut self, lines: f32) {
        self.fovy = Deg((self.fovy.0 - lines).clamp(MIN_FOV, MAX_FOV));
    }

    /// Current vertical field of view.
    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    /// Far clipping plane distance.
    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Calculates the projection matrix in WGPU clip space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Collects one frame of player input and applies it to a camera.
#[derive(Debug, Default)]
pub struct CameraController {
    // Movement direction, -1, 0 or 1 per axis
    amount_forward: f32,
    amount_right: f32,

    sprint: bool,
    fly: bool,

    rotate_horizontal: f32,
    rotate_vertical: f32,

    scroll: f32,
}

impl CameraController {
    /// Creates a controller with no pending input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the player's actions for this frame.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.amount_forward = axis(actions.move_forward, actions.move_backward);
        self.amount_right = axis(actions.move_right, actions.move_left);
        self.sprint = actions.sprint;
        self.fly = actions.fly;

        if let Some((delta_x, delta_y)) = actions.rotate_view {
            self.rotate_horizontal += delta_x as f32;
            self.rotate_vertical += delta_y as f32;
        }
        self.scroll += actions.zoom;
    }

    /// Current movement speed in units per second.
    pub fn speed(&self) -> f32 {
        if self.fly {
            FLY_SPEED
        } else if self.sprint {
            SPRINT_SPEED
        } else {
            WALK_SPEED
        }
    }

    /// Applies the recorded input and clears the one-shot parts of it.
    ///
    /// Mouse motion and scroll are consumed; held movement keys stay recorded until the
    /// next [`CameraController::intake_actions`].
    ///
    /// # Arguments
    /// * `camera` - Camera to move and turn
    /// * `projection` - Projection whose field of view the scroll wheel changes
    /// * `dt` - Time since the last frame
    pub fn update_camera(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        if self.rotate_horizontal != 0.0 || self.rotate_vertical != 0.0 {
            camera.rotate(self.rotate_horizontal, self.rotate_vertical);
            self.rotate_horizontal = 0.0;
            self.rotate_vertical = 0.0;
        }

        let step = self.speed() * dt.as_secs_f32();
        camera.position += camera.front() * self.amount_forward * step;
        camera.position += camera.right() * self.amount_right * step;

        if self.scroll != 0.0 {
            projection.zoom(self.scroll);
            self.scroll = 0.0;
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

/// GPU-friendly representation of camera data for shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // We can't use cgmath with bytemuck directly so we'll have to conver the Matrix4 into a 4x4 f32 array
    view_proj: [[f32; 4]; 4],
    /// xyz: camera position, w: far plane distance
    position: [f32; 4],
    /// rgb: fog color, a unused
    fog_color: [f32; 4],
}

impl CameraUniform {
    /// Creates a new camera uniform with an identity matrix.
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            position: [0.0, 0.0, 0.0, Z_FAR],
            fog_color: [SKY_COLOR[0], SKY_COLOR[1], SKY_COLOR[2], 1.0],
        }
    }

    /// Updates the view-projection matrix and position from the current camera state.
    pub fn update_view_proj_and_pos(&mut self, camera: &Camera, projection: &Projection) {
        let viewproj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = viewproj.into();
        let pos3: [f32; 3] = camera.position.into();

        self.position = [pos3[0], pos3[1], pos3[2], projection.zfar()];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn assert_vec_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < EPSILON, "{:?} != {:?}", a, b);
    }

    #[test]
    fn front_follows_yaw_and_pitch() {
        assert_vec_eq(front_from_angles(Deg(0.0), Deg(0.0)), Vector3::unit_x());
        assert_vec_eq(front_from_angles(Deg(90.0), Deg(0.0)), Vector3::unit_z());
        assert_vec_eq(
            front_from_angles(Deg(0.0), Deg(45.0)),
            Vector3::new(1.0, 1.0, 0.0).normalize(),
        );

        let initial = CameraView::default();
        assert_eq!(initial.position, Point3::new(0.0, 0.0, 3.0));
        assert!((initial.front.magnitude() - 1.0).abs() < EPSILON);
        assert!(initial.front.x > 0.0 && initial.front.z > 0.0);
    }

    #[test]
    fn mouse_look_is_scaled_and_pitch_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));

        camera.rotate(100.0, 0.0);
        assert!((camera.yaw.0 - 10.0).abs() < EPSILON);

        // Moving the mouse up (negative y) looks up.
        camera.rotate(0.0, -50.0);
        assert!((camera.pitch.0 - 5.0).abs() < EPSILON);

        camera.rotate(0.0, -10_000.0);
        assert_eq!(camera.pitch.0, PITCH_LIMIT);
        camera.rotate(0.0, 10_000.0);
        assert_eq!(camera.pitch.0, -PITCH_LIMIT);
        assert!(camera.front().y > -1.0);
    }

    #[test]
    fn control_wins_over_shift() {
        let mut controller = CameraController::new();
        assert_eq!(controller.speed(), WALK_SPEED);

        controller.intake_actions(&PlayerAction {
            sprint: true,
            ..PlayerAction::default()
        });
        assert_eq!(controller.speed(), SPRINT_SPEED);

        controller.intake_actions(&PlayerAction {
            sprint: true,
            fly: true,
            ..PlayerAction::default()
        });
        assert_eq!(controller.speed(), FLY_SPEED);
    }

    #[test]
    fn movement_is_relative_to_the_view() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut projection = Projection::new(960, 540, Deg(DEFAULT_FOV), Z_NEAR, Z_FAR);
        let mut controller = CameraController::new();

        controller.intake_actions(&PlayerAction {
            move_forward: true,
            ..PlayerAction::default()
        });
        controller.update_camera(&mut camera, &mut projection, Duration::from_secs(2));
        assert!((camera.position.x - 2.0 * WALK_SPEED).abs() < EPSILON);

        // Looking along +X, right is +Z.
        controller.intake_actions(&PlayerAction {
            move_right: true,
            ..PlayerAction::default()
        });
        controller.update_camera(&mut camera, &mut projection, Duration::from_secs(1));
        assert!((camera.position.z - WALK_SPEED).abs() < EPSILON);
        assert_eq!(camera.position.y, 0.0);
    }

    #[test]
    fn scrolling_zooms_within_limits() {
        let mut projection = Projection::new(960, 540, Deg(DEFAULT_FOV), Z_NEAR, Z_FAR);
        projection.zoom(10.0);
        assert_eq!(projection.fovy(), Deg(80.0));
        projection.zoom(500.0);
        assert_eq!(projection.fovy(), Deg(MIN_FOV));
        projection.zoom(-500.0);
        assert_eq!(projection.fovy(), Deg(MAX_FOV));
    }

    #[test]
    fn uniform_carries_far_plane_and_fog() {
        let camera = Camera::default();
        let projection = Projection::new(960, 540, Deg(DEFAULT_FOV), Z_NEAR, Z_FAR);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj_and_pos(&camera, &projection);

        assert_eq!(uniform.position, [0.0, 0.0, 3.0, Z_FAR]);
        assert_eq!(&uniform.fog_color[..3], &SKY_COLOR);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
    }
}
