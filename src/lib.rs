//! Free-fly Phong viewer.
//!
//! Camera control, uniform staging and asset parsing are plain CPU code and
//! can be driven without a window. [`render`] and [`app`] put them on screen
//! with wgpu and winit.

pub mod app;
pub mod camera;
pub mod config;
pub mod frame;
pub mod input;
pub mod lighting;
pub mod obj;
pub mod render;
pub mod shader;
pub mod uniforms;

pub use app::run;
pub use camera::{CameraState, Projection, ProjectionCache};
pub use config::{ConfigError, DemoConfig};
pub use frame::{FrameClock, FrameContext, FrameMatrices};
pub use input::{FrameInput, InputSampler, KeyBindings, KeyCode, NamedKey, WindowInput, WindowState};
pub use lighting::{LightConfig, LightingError, RenderParams};
pub use obj::{load_mtl_from_str, load_obj_from_str, ObjMaterial, ObjMesh, ObjModel};
pub use render::{Model, Renderer};
pub use shader::{ShaderError, ShaderSource, ShaderStage};
pub use uniforms::{FrameUniform, UniformSink};
