use glam::{Mat4, Vec3};

use crate::input::{FrameInput, LookDelta, Movement};

/// Pitch never reaches +/-90 degrees, where `front` would align with `up`.
pub const PITCH_LIMIT: f32 = 89.0;

/// Converts yaw/pitch in degrees into a unit look direction.
pub fn front_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

/// Free-fly camera: a position plus yaw/pitch from which `front` is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
}

impl CameraState {
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 3.0);
    pub const DEFAULT_YAW: f32 = -90.0;
    pub const DEFAULT_PITCH: f32 = 0.0;

    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self {
            position,
            front: front_from_angles(yaw, pitch),
            up: Vec3::Y,
            yaw,
            pitch,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// Moves along the current basis without touching orientation.
    pub fn translate(&mut self, movement: Movement, speed: f32) {
        self.position += movement.displacement(self.front, self.right(), speed);
    }

    pub fn rotate(&mut self, look: LookDelta) {
        self.yaw += look.yaw;
        self.pitch = (self.pitch + look.pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.front = front_from_angles(self.yaw, self.pitch);
    }

    /// Applies one frame of input: movement first, using last frame's basis,
    /// then the look change.
    pub fn update(&mut self, input: &FrameInput) {
        self.translate(input.movement, input.speed);
        self.rotate(input.look);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POSITION, Self::DEFAULT_YAW, Self::DEFAULT_PITCH)
    }
}

/// Perspective settings; the aspect ratio comes from the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect.max(0.01), self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Projection matrix reused until the viewport size changes.
#[derive(Debug, Clone)]
pub struct ProjectionCache {
    projection: Projection,
    cached: Option<((u32, u32), Mat4)>,
}

impl ProjectionCache {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            cached: None,
        }
    }

    pub fn get(&mut self, width: u32, height: u32) -> Mat4 {
        match self.cached {
            Some((size, matrix)) if size == (width, height) => matrix,
            _ => {
                let matrix = self.projection.matrix(width, height);
                self.cached = Some(((width, height), matrix));
                matrix
            }
        }
    }

    pub fn cached_size(&self) -> Option<(u32, u32)> {
        self.cached.map(|(size, _)| size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_near(actual: Vec3, expected: Vec3, tolerance: f32) {
        assert!(
            (actual - expected).abs().max_element() <= tolerance,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn initial_state_looks_down_negative_z() {
        let camera = CameraState::default();
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.up(), Vec3::Y);
        assert_vec_near(camera.front(), Vec3::NEG_Z, 1e-5);
        assert_vec_near(camera.right(), Vec3::X, 1e-5);
    }

    #[test]
    fn zero_yaw_looks_down_positive_x() {
        assert_vec_near(front_from_angles(0.0, 0.0), Vec3::X, 1e-5);
        assert_vec_near(front_from_angles(-90.0, 0.0), Vec3::NEG_Z, 1e-5);
    }

    #[test]
    fn pitch_is_clamped_for_any_input() {
        let mut camera = CameraState::default();
        for delta in [50.0, 50.0, 1.0e6, -30.0, -1.0e9, -0.5, 1.0e9, 89.0] {
            camera.rotate(LookDelta {
                yaw: 3.0,
                pitch: delta,
            });
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&camera.pitch()));
            assert!((camera.front().length() - 1.0).abs() < 1e-5);
        }
        assert_eq!(camera.pitch(), PITCH_LIMIT);

        camera.rotate(LookDelta {
            yaw: 0.0,
            pitch: 10.0,
        });
        assert_eq!(camera.pitch(), PITCH_LIMIT);
    }

    #[test]
    fn front_stays_unit_length() {
        let mut camera = CameraState::default();
        for step in 0..200 {
            let step = step as f32;
            camera.rotate(LookDelta {
                yaw: (step * 1.7).sin() * 40.0,
                pitch: (step * 0.3).cos() * 25.0,
            });
            assert!((camera.front().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn forward_for_one_second_moves_two_and_a_half_units() {
        let mut camera = CameraState::default();
        camera.update(&FrameInput {
            movement: Movement {
                forward: true,
                ..Movement::default()
            },
            speed: 2.5,
            ..FrameInput::default()
        });
        assert_vec_near(camera.position(), Vec3::new(0.0, 0.0, 0.5), 1e-5);
    }

    #[test]
    fn strafe_uses_right_vector() {
        let mut camera = CameraState::default();
        camera.translate(
            Movement {
                strafe_right: true,
                ..Movement::default()
            },
            1.0,
        );
        assert_vec_near(camera.position(), Vec3::new(1.0, 0.0, 3.0), 1e-5);
        camera.translate(
            Movement {
                strafe_left: true,
                ..Movement::default()
            },
            2.0,
        );
        assert_vec_near(camera.position(), Vec3::new(-1.0, 0.0, 3.0), 1e-5);
    }

    #[test]
    fn movement_uses_front_from_before_the_look_update() {
        let mut camera = CameraState::default();
        camera.update(&FrameInput {
            movement: Movement {
                forward: true,
                ..Movement::default()
            },
            speed: 1.0,
            look: LookDelta {
                yaw: 90.0,
                pitch: 0.0,
            },
            quit: false,
        });
        assert_vec_near(camera.position(), Vec3::new(0.0, 0.0, 2.0), 1e-5);
        assert_vec_near(camera.front(), Vec3::X, 1e-5);
    }

    #[test]
    fn view_matrix_maps_target_onto_negative_z() {
        let camera = CameraState::default();
        let view = camera.view_matrix();
        let target = view.transform_point3(camera.position() + camera.front());
        assert_vec_near(target, Vec3::NEG_Z, 1e-5);
        assert_vec_near(view.transform_point3(camera.position()), Vec3::ZERO, 1e-5);
    }

    #[test]
    fn projection_is_reused_until_resize() {
        let mut cache = ProjectionCache::new(Projection::default());
        assert_eq!(cache.cached_size(), None);
        let first = cache.get(1280, 720);
        assert_eq!(cache.get(1280, 720), first);
        assert_eq!(cache.cached_size(), Some((1280, 720)));

        let resized = cache.get(720, 720);
        assert_ne!(resized, first);
        assert_eq!(resized, Projection::default().matrix(720, 720));
    }

    #[test]
    fn zero_height_viewport_does_not_divide_by_zero() {
        let matrix = Projection::default().matrix(800, 0);
        assert!(matrix.is_finite());
    }
}
