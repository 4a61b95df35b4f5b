pub mod model;
pub mod renderer;
pub mod texture;

pub use model::Model;
pub use renderer::Renderer;
pub use texture::Texture;
