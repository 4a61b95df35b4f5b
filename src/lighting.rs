use glam::Vec3;
use thiserror::Error;

use crate::uniforms::{UniformSink, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LightingError {
    #[error("{count} point lights requested but the shader holds at most {max}")]
    TooManyPointLights { count: usize, max: usize },
    #[error("{count} spot lights requested but the shader holds at most {max}")]
    TooManySpotLights { count: usize, max: usize },
}

/// Distance falloff: `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
    pub attenuation: Attenuation,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl SpotLight {
    /// Builds a cone from angles in degrees, storing their cosines.
    pub fn from_angles(
        position: Vec3,
        direction: Vec3,
        inner_degrees: f32,
        outer_degrees: f32,
        attenuation: Attenuation,
    ) -> Self {
        Self {
            position,
            direction,
            cut_off: inner_degrees.to_radians().cos(),
            outer_cut_off: outer_degrees.to_radians().cos(),
            attenuation,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
        }
    }
}

/// Number of entries in each light array, pushed once before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightConfig {
    pub point_lights: usize,
    pub spot_lights: usize,
}

/// Lighting and material values fed to the shader every frame.
///
/// The light collections are fixed once built: entries can be edited in place
/// but not added or removed, so the counts pushed by [`configure`] keep
/// matching what [`apply`] writes.
///
/// [`configure`]: RenderParams::configure
/// [`apply`]: RenderParams::apply
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    directional: DirectionalLight,
    point_lights: Vec<PointLight>,
    spot_lights: Vec<SpotLight>,
    shininess: f32,
}

impl RenderParams {
    pub fn new(
        directional: DirectionalLight,
        point_lights: Vec<PointLight>,
        spot_lights: Vec<SpotLight>,
        shininess: f32,
    ) -> Result<Self, LightingError> {
        if point_lights.len() > MAX_POINT_LIGHTS {
            return Err(LightingError::TooManyPointLights {
                count: point_lights.len(),
                max: MAX_POINT_LIGHTS,
            });
        }
        if spot_lights.len() > MAX_SPOT_LIGHTS {
            return Err(LightingError::TooManySpotLights {
                count: spot_lights.len(),
                max: MAX_SPOT_LIGHTS,
            });
        }
        Ok(Self {
            directional,
            point_lights,
            spot_lights,
            shininess,
        })
    }

    /// The viewer's stock lighting: one directional light, one point light and
    /// no spot lights.
    pub fn demo() -> Self {
        Self {
            directional: DirectionalLight {
                direction: Vec3::new(1.2, 1.0, -3.0),
                ambient: Vec3::splat(0.1),
                diffuse: Vec3::splat(0.5),
                specular: Vec3::ONE,
            },
            point_lights: vec![PointLight {
                position: Vec3::new(0.7, 0.2, 2.0),
                ambient: Vec3::splat(0.05),
                diffuse: Vec3::splat(0.8),
                specular: Vec3::ONE,
                attenuation: Attenuation::new(1.0, 0.09, 0.032),
            }],
            spot_lights: Vec::new(),
            shininess: 32.0,
        }
    }

    pub fn light_config(&self) -> LightConfig {
        LightConfig {
            point_lights: self.point_lights.len(),
            spot_lights: self.spot_lights.len(),
        }
    }

    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn point_lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.point_lights
    }

    pub fn spot_lights(&self) -> &[SpotLight] {
        &self.spot_lights
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    /// One-time setup: light counts and the material exponent.
    pub fn configure(&self, sink: &mut impl UniformSink) {
        let config = self.light_config();
        sink.set_int("point_light_count", config.point_lights as i32);
        sink.set_int("spot_light_count", config.spot_lights as i32);
        sink.set_float("shininess", self.shininess);
    }

    /// Per-frame upload of every light entry.
    pub fn apply(&self, sink: &mut impl UniformSink) {
        let dir = &self.directional;
        sink.set_vec3("dir_light.direction", dir.direction);
        sink.set_vec3("dir_light.ambient", dir.ambient);
        sink.set_vec3("dir_light.diffuse", dir.diffuse);
        sink.set_vec3("dir_light.specular", dir.specular);

        for (index, light) in self.point_lights.iter().enumerate() {
            let prefix = format!("point_lights[{index}]");
            sink.set_vec3(&format!("{prefix}.position"), light.position);
            sink.set_vec3(&format!("{prefix}.ambient"), light.ambient);
            sink.set_vec3(&format!("{prefix}.diffuse"), light.diffuse);
            sink.set_vec3(&format!("{prefix}.specular"), light.specular);
            set_attenuation(sink, &prefix, &light.attenuation);
        }

        for (index, light) in self.spot_lights.iter().enumerate() {
            let prefix = format!("spot_lights[{index}]");
            sink.set_vec3(&format!("{prefix}.position"), light.position);
            sink.set_vec3(&format!("{prefix}.direction"), light.direction);
            sink.set_float(&format!("{prefix}.cut_off"), light.cut_off);
            sink.set_float(&format!("{prefix}.outer_cut_off"), light.outer_cut_off);
            set_attenuation(sink, &prefix, &light.attenuation);
            sink.set_vec3(&format!("{prefix}.ambient"), light.ambient);
            sink.set_vec3(&format!("{prefix}.diffuse"), light.diffuse);
            sink.set_vec3(&format!("{prefix}.specular"), light.specular);
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::demo()
    }
}

fn set_attenuation(sink: &mut impl UniformSink, prefix: &str, attenuation: &Attenuation) {
    sink.set_float(&format!("{prefix}.constant"), attenuation.constant);
    sink.set_float(&format!("{prefix}.linear"), attenuation.linear);
    sink.set_float(&format!("{prefix}.quadratic"), attenuation.quadratic);
}
