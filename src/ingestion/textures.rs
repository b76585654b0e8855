use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{BakeError, Result};
use crate::types::{ImageBuffer, Mesh};

/// Decode the diffuse texture of every referenced, textured material.
///
/// Paths are resolved relative to `base_dir`. Textures that fail to load are
/// logged and left out of the result, so packing later reports the material
/// as missing its image.
pub fn load_diffuse_images(mesh: &Mesh, base_dir: &Path) -> BTreeMap<String, ImageBuffer> {
    mesh.textured_materials()
        .par_iter()
        .filter_map(|(name, material)| {
            let texture = material.diffuse_texture()?;
            match load_texture(&base_dir.join(texture)) {
                Ok(image) => Some((name.to_string(), image)),
                Err(e) => {
                    warn!(material = %name, texture, "Failed to load texture: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Read and decode one image file into RGBA8.
pub fn load_texture(path: &Path) -> Result<ImageBuffer> {
    let img = image::open(path).map_err(|e| {
        BakeError::Input(format!("Failed to decode texture {}: {e}", path.display()))
    })?;

    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "Loaded texture"
    );

    Ok(ImageBuffer::from(img.to_rgba8()))
}
