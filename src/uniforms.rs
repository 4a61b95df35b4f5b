//! CPU-side staging of the shader's uniform block.
//!
//! Values are written by name, the way a GL program is fed, and land in a
//! `#[repr(C)]` struct whose layout mirrors `FrameUniform` in the WGSL shader.
//! The whole block is uploaded once per frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::warn;

/// Capacity of the `point_lights` array declared by the shader.
pub const MAX_POINT_LIGHTS: usize = 4;
/// Capacity of the `spot_lights` array declared by the shader.
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Destination for named uniform writes.
pub trait UniformSink {
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: Mat4);
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
    /// inner cosine, outer cosine, unused, unused
    pub cutoff: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    /// x holds the shininess exponent.
    pub material: [f32; 4],
    /// x: point lights in use, y: spot lights in use.
    pub light_counts: [u32; 4],
    pub dir_light: DirLightUniform,
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub spot_lights: [SpotLightUniform; MAX_SPOT_LIGHTS],
}

impl Default for FrameUniform {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model: identity,
            view: identity,
            projection: identity,
            normal: identity,
            ..Zeroable::zeroed()
        }
    }
}

impl FrameUniform {
    pub fn point_light_count(&self) -> u32 {
        self.light_counts[0]
    }

    pub fn spot_light_count(&self) -> u32 {
        self.light_counts[1]
    }

    pub fn shininess(&self) -> f32 {
        self.material[0]
    }

    fn vec3_slot(&mut self, name: &str) -> Option<&mut [f32; 4]> {
        let slot = match parse_uniform_name(name)? {
            UniformName::Plain("view_pos") => &mut self.view_pos,
            UniformName::Field {
                group: "dir_light",
                field,
            } => match field {
                "direction" => &mut self.dir_light.direction,
                "ambient" => &mut self.dir_light.ambient,
                "diffuse" => &mut self.dir_light.diffuse,
                "specular" => &mut self.dir_light.specular,
                _ => return None,
            },
            UniformName::Indexed {
                array: "point_lights",
                index,
                field,
            } => {
                let light = self.point_lights.get_mut(index)?;
                match field {
                    "position" => &mut light.position,
                    "ambient" => &mut light.ambient,
                    "diffuse" => &mut light.diffuse,
                    "specular" => &mut light.specular,
                    _ => return None,
                }
            }
            UniformName::Indexed {
                array: "spot_lights",
                index,
                field,
            } => {
                let light = self.spot_lights.get_mut(index)?;
                match field {
                    "position" => &mut light.position,
                    "direction" => &mut light.direction,
                    "ambient" => &mut light.ambient,
                    "diffuse" => &mut light.diffuse,
                    "specular" => &mut light.specular,
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(slot)
    }

    fn float_slot(&mut self, name: &str) -> Option<&mut f32> {
        let slot = match parse_uniform_name(name)? {
            UniformName::Plain("shininess") => &mut self.material[0],
            UniformName::Indexed {
                array: "point_lights",
                index,
                field,
            } => {
                let light = self.point_lights.get_mut(index)?;
                attenuation_slot(&mut light.attenuation, field)?
            }
            UniformName::Indexed {
                array: "spot_lights",
                index,
                field,
            } => {
                let light = self.spot_lights.get_mut(index)?;
                match field {
                    "cut_off" => &mut light.cutoff[0],
                    "outer_cut_off" => &mut light.cutoff[1],
                    _ => attenuation_slot(&mut light.attenuation, field)?,
                }
            }
            _ => return None,
        };
        Some(slot)
    }
}

fn attenuation_slot<'a>(attenuation: &'a mut [f32; 4], field: &str) -> Option<&'a mut f32> {
    match field {
        "constant" => Some(&mut attenuation[0]),
        "linear" => Some(&mut attenuation[1]),
        "quadratic" => Some(&mut attenuation[2]),
        _ => None,
    }
}

impl UniformSink for FrameUniform {
    fn set_int(&mut self, name: &str, value: i32) {
        let slot = match name {
            "point_light_count" => &mut self.light_counts[0],
            "spot_light_count" => &mut self.light_counts[1],
            _ => return ignored(name),
        };
        *slot = value.max(0) as u32;
    }

    fn set_float(&mut self, name: &str, value: f32) {
        match self.float_slot(name) {
            Some(slot) => *slot = value,
            None => ignored(name),
        }
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        match self.vec3_slot(name) {
            Some(slot) => *slot = value.extend(0.0).into(),
            None => ignored(name),
        }
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        match name {
            "model" => {
                self.model = value.to_cols_array_2d();
                let normal = Mat3::from_mat4(value).inverse().transpose();
                self.normal = Mat4::from_mat3(normal).to_cols_array_2d();
            }
            "view" => self.view = value.to_cols_array_2d(),
            "projection" => self.projection = value.to_cols_array_2d(),
            _ => ignored(name),
        }
    }
}

fn ignored(name: &str) {
    warn!("shader has no uniform named {name}; value ignored");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniformName<'a> {
    Plain(&'a str),
    Field {
        group: &'a str,
        field: &'a str,
    },
    Indexed {
        array: &'a str,
        index: usize,
        field: &'a str,
    },
}

/// Splits `name`, `group.field` and `array[index].field`.
fn parse_uniform_name(name: &str) -> Option<UniformName<'_>> {
    let Some((head, field)) = name.split_once('.') else {
        return Some(UniformName::Plain(name));
    };
    match head.split_once('[') {
        Some((array, rest)) => {
            let index = rest.strip_suffix(']')?.parse::<usize>().ok()?;
            Some(UniformName::Indexed {
                array,
                index,
                field,
            })
        }
        None => Some(UniformName::Field { group: head, field }),
    }
}
