use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::export;
use crate::ingestion::{self, IngestionStats};
use crate::packing::{self, Atlas, PackOutput};

/// Summary of a completed bake.
#[derive(Debug)]
pub struct BakeSummary {
    pub materials_packed: usize,
    /// `None` when the mesh had no textured materials.
    pub atlas_size: Option<(u32, u32)>,
    pub duplicated_vertices: usize,
    pub duration: Duration,
}

/// Pipeline orchestrator: ingest, pack, export.
pub struct Pipeline;

impl Pipeline {
    /// Run the full bake.
    pub fn run(config: &BakeConfig) -> Result<BakeSummary> {
        let start = Instant::now();

        info!(input = %config.input.display(), "Starting bake");

        info!("Stage 1/3: Ingestion");
        let ingested = ingestion::ingest(config)?;
        let stats = ingested.stats;

        info!("Stage 2/3: Packing");
        let atlas_texture = atlas_reference(config)?;
        let output = packing::pack_textures(
            ingested.mesh,
            ingested.images,
            &atlas_texture,
            &config.atlas,
        )?;

        let summary = BakeSummary {
            materials_packed: output.atlas.as_ref().map_or(0, |a| a.layout.tiles.len()),
            atlas_size: output
                .atlas
                .as_ref()
                .map(|a| (a.layout.width, a.layout.height)),
            duplicated_vertices: stats.duplicated_vertices,
            duration: Duration::ZERO,
        };

        if config.dry_run {
            info!("--dry-run: skipping output");
            print_dry_run_summary(&stats, &output);
        } else {
            info!("Stage 3/3: Export");
            Self::export(config, output)?;
        }

        let duration = start.elapsed();
        info!(
            materials = summary.materials_packed,
            elapsed = ?duration,
            "Bake complete"
        );

        Ok(BakeSummary { duration, ..summary })
    }

    fn export(config: &BakeConfig, output: PackOutput) -> Result<()> {
        for path in [
            &config.output_mesh,
            &config.output_material,
            &config.output_atlas,
        ] {
            create_parent(path)?;
        }

        if let Some(Atlas { image, layout }) = output.atlas {
            let (width, height) = image.dimensions();
            let rgba = image.into_rgba_image().ok_or_else(|| {
                BakeError::Output(format!("atlas buffer does not match {width}x{height}"))
            })?;
            rgba.save_with_format(&config.output_atlas, config.atlas.format.image_format())?;
            info!(
                path = %config.output_atlas.display(),
                width,
                height,
                "Wrote texture atlas"
            );

            if let Some(report) = &config.report {
                export::write_layout(&layout, report)?;
                info!(path = %report.display(), "Wrote atlas report");
            }
        }

        export::write_obj_files(&output.mesh, &config.output_mesh, &config.output_material)?;
        info!(
            mesh = %config.output_mesh.display(),
            material = %config.output_material.display(),
            "Wrote OBJ + MTL"
        );
        Ok(())
    }
}

/// How the baked MTL refers to the atlas: by file name when both share a
/// directory, otherwise by the atlas path as given.
fn atlas_reference(config: &BakeConfig) -> Result<String> {
    let atlas = &config.output_atlas;
    if atlas.parent() == config.output_material.parent() {
        atlas
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| BakeError::Output(format!("invalid atlas path: {}", atlas.display())))
    } else {
        Ok(atlas.display().to_string())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Print what a bake would produce.
fn print_dry_run_summary(stats: &IngestionStats, output: &PackOutput) {
    println!("=== Dry Run Summary ===");
    println!("  Components: {}", stats.component_count);
    println!("  Vertices:   {}", stats.total_vertices);
    println!("  Triangles:  {}", stats.total_triangles);
    println!("  Normals:    {}", if stats.has_normals { "yes" } else { "no" });
    println!("  Materials:  {}", stats.material_count);
    println!(
        "  Textures:   {} decoded / {} referenced",
        stats.decoded_texture_count, stats.textured_material_count
    );
    println!("  Split:      {} vertices duplicated", stats.duplicated_vertices);
    match &output.atlas {
        Some(atlas) => {
            println!(
                "  Atlas:      {}x{} ({} tiles)",
                atlas.layout.width,
                atlas.layout.height,
                atlas.layout.tiles.len()
            );
            for tile in &atlas.layout.tiles {
                println!(
                    "    {:<24} {}x{} at ({}, {})",
                    tile.material, tile.width, tile.height, tile.x, tile.y
                );
            }
        }
        None => println!("  Atlas:      none (no textured materials)"),
    }
}
