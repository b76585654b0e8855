pub mod obj_writer;
pub mod report;

pub use obj_writer::{write_mtl, write_obj, write_obj_files};
pub use report::write_layout;
