pub mod remap;
pub mod scheduler;
pub mod stitcher;
pub mod tile;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AtlasConfig;
use crate::error::{BakeError, Result};
use crate::types::{ImageBuffer, Mesh};

pub use remap::{remap_texcoords, UvTransform};
pub use scheduler::PackingScheduler;
pub use stitcher::stitch_atlas;
pub use tile::{TileId, TileKind, TileNode, TileTree};

/// Where one material's texture ended up in the atlas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedTile {
    pub material: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of quads above the leaf in the packing tree.
    pub depth: usize,
    /// `[offset_u, offset_v, scale_u, scale_v]` of the UV remap.
    pub uv_transform: [f64; 4],
}

/// Description of a finished atlas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    /// Texture path now referenced by every packed material.
    pub texture: String,
    pub tiles: Vec<PlacedTile>,
}

/// The combined texture and its layout.
#[derive(Debug)]
pub struct Atlas {
    pub image: ImageBuffer,
    pub layout: AtlasLayout,
}

/// Result of packing a mesh's textures.
#[derive(Debug)]
pub struct PackOutput {
    pub mesh: Mesh,
    /// `None` when no referenced material had a diffuse texture.
    pub atlas: Option<Atlas>,
}

/// Pack the diffuse textures of every referenced material into one atlas.
///
/// `images` holds the decoded diffuse image per material name; a textured
/// material without an entry fails with `MissingImageData`. On success each
/// packed material's diffuse texture is replaced by `atlas_texture` and the
/// mesh's texture coordinates are rewritten into atlas space. Meshes without
/// textured materials are returned untouched.
pub fn pack_textures(
    mut mesh: Mesh,
    mut images: BTreeMap<String, ImageBuffer>,
    atlas_texture: &str,
    config: &AtlasConfig,
) -> Result<PackOutput> {
    let mut tree = TileTree::new();
    let material_tiles: BTreeMap<String, TileId> = mesh
        .textured_materials()
        .into_iter()
        .map(|(name, _)| {
            let image = images.remove(name).unwrap_or_default();
            (name.to_string(), tree.add_leaf(name, image))
        })
        .collect();

    let heads: Vec<TileId> = material_tiles.values().copied().collect();
    let mut scheduler = PackingScheduler::new(heads);
    let Some(root) = scheduler.build(&mut tree)? else {
        info!("No textured materials in use, mesh passed through unchanged");
        return Ok(PackOutput { mesh, atlas: None });
    };

    let image = stitch_atlas(&mut tree, root, config.background)?;
    let remapped = remap_texcoords(&mut mesh, &tree, root, &material_tiles)?;

    let mut tiles = Vec::with_capacity(material_tiles.len());
    for (name, &leaf) in &material_tiles {
        tiles.push(place_tile(&tree, root, name, leaf)?);

        if let Some(material) = mesh.materials.get_mut(name) {
            material.texture_diffuse = Some(atlas_texture.to_string());
        }
    }

    info!(
        materials = tiles.len(),
        rounds = scheduler.rounds(),
        width = image.width(),
        height = image.height(),
        texcoords = remapped,
        "Texture atlas built"
    );

    let layout = AtlasLayout {
        width: image.width(),
        height: image.height(),
        texture: atlas_texture.to_string(),
        tiles,
    };
    Ok(PackOutput {
        mesh,
        atlas: Some(Atlas { image, layout }),
    })
}

/// Describe where `leaf` landed under `root`.
fn place_tile(tree: &TileTree, root: TileId, material: &str, leaf: TileId) -> Result<PlacedTile> {
    let (x, y) = tree.locate(root, leaf, (0, 0)).ok_or_else(|| {
        BakeError::InconsistentTreeGeometry(format!(
            "tile of material '{material}' is not reachable from the atlas root"
        ))
    })?;
    let (width, height) = tree.node(leaf).exact_size();
    let t = remap::leaf_transform(tree, root, leaf)?;
    let depth = tree.depth(leaf);
    debug!(material, x, y, width, height, depth, "Placed tile");
    Ok(PlacedTile {
        material: material.to_string(),
        x,
        y,
        width,
        height,
        depth,
        uv_transform: [t.offset.x, t.offset.y, t.scale.x, t.scale.y],
    })
}
