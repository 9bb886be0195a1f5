//! # Camera State Management
//!
//! Ties the free-flying camera to the rest of the engine:
//! - Applies one frame of player input to the camera and projection
//! - Keeps the shader uniform current
//! - Publishes the camera view the generation workers read
//!
//! ## Core Components
//! - `Camera`: position and orientation
//! - `CameraController`: input accumulated for the next update
//! - `CameraUniform`: GPU representation of camera data
//! - `CameraView`: shared with the workers through an [`MtResource`]

use camera::{Camera, CameraController, CameraUniform, CameraView, Projection};
use log::trace;

use crate::core::MtResource;

use super::PlayerAction;

pub mod camera;

/// Camera, controls and the data derived from them.
pub struct CameraState {
    /// The current camera position and orientation
    pub camera: Camera,
    /// GPU-optimized camera data for shaders
    pub camera_uniform: CameraUniform,
    /// Handles player input and camera movement
    pub camera_controller: CameraController,
    /// Latest camera view, read by every generation worker
    view: MtResource<CameraView>,
}

impl CameraState {
    /// Creates the camera at its starting position and publishes its view.
    ///
    /// # Arguments
    /// * `projection` - The initial camera projection settings
    pub fn new(projection: &Projection) -> Self {
        let camera = Camera::default();
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj_and_pos(&camera, projection);
        let view = MtResource::new(camera.view());

        CameraState {
            camera,
            camera_uniform,
            camera_controller: CameraController::new(),
            view,
        }
    }

    /// Handle to the published camera view.
    pub fn shared_view(&self) -> MtResource<CameraView> {
        self.view.clone()
    }

    /// Processes player input actions and updates the camera controller state.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.camera_controller.intake_actions(actions);
    }

    /// Moves the camera by the recorded input, then refreshes the uniform and the
    /// published view.
    ///
    /// # Arguments
    /// * `dt` - Time elapsed since the last update
    /// * `projection` - Current projection, zoomed by the scroll wheel
    ///
    /// # Returns
    /// The uniform to upload for this frame
    pub fn update(&mut self, dt: web_time::Duration, projection: &mut Projection) -> &CameraUniform {
        self.camera_controller
            .update_camera(&mut self.camera, projection, dt);
        self.camera_uniform
            .update_view_proj_and_pos(&self.camera, projection);

        *self.view.get_mut() = self.camera.view();
        trace!("Camera at {:?}", self.camera.position);

        &self.camera_uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera::{DEFAULT_FOV, WALK_SPEED, Z_FAR, Z_NEAR};
    use cgmath::Deg;

    #[test]
    fn update_publishes_the_moved_camera() {
        let mut projection = Projection::new(960, 540, Deg(DEFAULT_FOV), Z_NEAR, Z_FAR);
        let mut camera_state = CameraState::new(&projection);
        let shared = camera_state.shared_view();
        assert_eq!(shared.snapshot(), CameraView::default());

        camera_state.intake_actions(&PlayerAction {
            move_forward: true,
            ..PlayerAction::default()
        });
        camera_state.update(web_time::Duration::from_secs(1), &mut projection);

        let view = shared.snapshot();
        let travelled = view.position - CameraView::default().position;
        assert!((travelled.x - view.front.x * WALK_SPEED).abs() < 1e-4);
        assert!((travelled.z - view.front.z * WALK_SPEED).abs() < 1e-4);
        assert_eq!(view, camera_state.camera.view());
    }

    #[test]
    fn zoom_reaches_the_projection() {
        let mut projection = Projection::new(960, 540, Deg(DEFAULT_FOV), Z_NEAR, Z_FAR);
        let mut camera_state = CameraState::new(&projection);

        camera_state.intake_actions(&PlayerAction {
            zoom: 5.0,
            ..PlayerAction::default()
        });
        camera_state.update(web_time::Duration::ZERO, &mut projection);
        assert_eq!(projection.fovy(), Deg(DEFAULT_FOV - 5.0));

        // Scroll is consumed by the update that applied it.
        camera_state.update(web_time::Duration::ZERO, &mut projection);
        assert_eq!(projection.fovy(), Deg(DEFAULT_FOV - 5.0));
    }
}
