pub mod image_buffer;
pub mod mesh;

pub use image_buffer::ImageBuffer;
pub use mesh::{Material, Mesh, MeshComponent};
