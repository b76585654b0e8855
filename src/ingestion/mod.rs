pub mod obj_loader;
pub mod split;
pub mod textures;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::types::{ImageBuffer, Mesh};

/// Result of the ingestion stage.
#[derive(Debug)]
pub struct IngestionResult {
    pub mesh: Mesh,
    /// Decoded diffuse image per material name.
    pub images: BTreeMap<String, ImageBuffer>,
    pub stats: IngestionStats,
}

/// Statistics about the ingested data.
#[derive(Debug)]
pub struct IngestionStats {
    pub total_vertices: usize,
    pub total_triangles: usize,
    pub component_count: usize,
    pub material_count: usize,
    pub textured_material_count: usize,
    pub decoded_texture_count: usize,
    pub duplicated_vertices: usize,
    pub has_normals: bool,
}

/// Run the full ingestion stage.
pub fn ingest(config: &BakeConfig) -> Result<IngestionResult> {
    // 1. Validate input
    if !config.input.exists() {
        return Err(BakeError::Input(format!(
            "Input file not found: {}",
            config.input.display()
        )));
    }
    check_extension(&config.input)?;
    info!(path = %config.input.display(), "Loading OBJ");

    // 2. Parse geometry and materials
    let mut mesh = obj_loader::load_obj(&config.input)?;

    // 3. One texture coordinate per material
    let duplicated_vertices = split::split_shared_vertices(&mut mesh);

    // 4. Decode diffuse textures
    let base_dir = config.input.parent().unwrap_or_else(|| Path::new("."));
    let images = textures::load_diffuse_images(&mesh, base_dir);

    let stats = compute_stats(&mesh, &images, duplicated_vertices);
    debug!(
        vertices = stats.total_vertices,
        triangles = stats.total_triangles,
        components = stats.component_count,
        textures = stats.decoded_texture_count,
        "Ingestion stats"
    );

    Ok(IngestionResult {
        mesh,
        images,
        stats,
    })
}

/// Only Wavefront OBJ input is supported.
fn check_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if ext == "obj" {
        Ok(())
    } else {
        Err(BakeError::Input(format!("Unsupported file format: .{ext}")))
    }
}

/// Compute summary statistics for an ingested mesh.
pub fn compute_stats(
    mesh: &Mesh,
    images: &BTreeMap<String, ImageBuffer>,
    duplicated_vertices: usize,
) -> IngestionStats {
    IngestionStats {
        total_vertices: mesh.vertex_count(),
        total_triangles: mesh.triangle_count(),
        component_count: mesh.components.len(),
        material_count: mesh.materials.len(),
        textured_material_count: mesh.textured_materials().len(),
        decoded_texture_count: images.len(),
        duplicated_vertices,
        has_normals: mesh.has_normals(),
    }
}
