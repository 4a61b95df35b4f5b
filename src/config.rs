use std::path::PathBuf;

use glam::Vec3;
use thiserror::Error;

use crate::camera::{CameraState, Projection};
use crate::input::{InputSampler, KeyBindings};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size must be non-zero, got {width}x{height}")]
    EmptyWindow { width: u32, height: u32 },
    #[error("vertical field of view must be within (0, 180) degrees, got {0}")]
    FieldOfView(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    ClipPlanes { near: f32, far: f32 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Wait for vertical blank before presenting.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Phong Viewer".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            vsync: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub projection: Projection,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: CameraState::DEFAULT_POSITION,
            yaw: CameraState::DEFAULT_YAW,
            pitch: CameraState::DEFAULT_PITCH,
            projection: Projection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlConfig {
    /// World units per second.
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    /// Degrees per pixel of mouse travel.
    pub mouse_sensitivity: f32,
    pub bindings: KeyBindings,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            base_speed: InputSampler::DEFAULT_BASE_SPEED,
            sprint_multiplier: InputSampler::DEFAULT_SPRINT_MULTIPLIER,
            mouse_sensitivity: InputSampler::DEFAULT_SENSITIVITY,
            bindings: KeyBindings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetConfig {
    pub model_path: PathBuf,
    pub shader_path: PathBuf,
    /// Uniform scale applied to the model.
    pub model_scale: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/models/cube/cube.obj"),
            shader_path: PathBuf::from("assets/shaders/basic.shader"),
            model_scale: 0.5,
        }
    }
}

/// Every tunable of the viewer. Paths are relative to the working directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlConfig,
    pub assets: AssetConfig,
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.window.width, self.window.height);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyWindow { width, height });
        }

        let projection = &self.camera.projection;
        if !(projection.fov_y_degrees > 0.0 && projection.fov_y_degrees < 180.0) {
            return Err(ConfigError::FieldOfView(projection.fov_y_degrees));
        }
        if !(projection.near > 0.0 && projection.far > projection.near) {
            return Err(ConfigError::ClipPlanes {
                near: projection.near,
                far: projection.far,
            });
        }

        let controls = &self.controls;
        for (name, value) in [
            ("base speed", controls.base_speed),
            ("sprint multiplier", controls.sprint_multiplier),
            ("mouse sensitivity", controls.mouse_sensitivity),
            ("model scale", self.assets.model_scale),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        Ok(())
    }

    pub fn input_sampler(&self) -> InputSampler {
        let controls = &self.controls;
        InputSampler::new(
            controls.bindings,
            controls.base_speed,
            controls.sprint_multiplier,
            controls.mouse_sensitivity,
        )
    }

    pub fn initial_camera(&self) -> CameraState {
        CameraState::new(self.camera.position, self.camera.yaw, self.camera.pitch)
    }
}
