use std::collections::BTreeMap;

use glam::{DVec2, Vec2};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{BakeError, Result};
use crate::types::Mesh;

use super::tile::{TileId, TileTree};

/// Label used in conflict reports for components without a material.
const NO_MATERIAL: &str = "<none>";

/// Affine map from a material's local `[0,1]²` UV space into atlas UV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub offset: DVec2,
    pub scale: DVec2,
}

impl UvTransform {
    pub const IDENTITY: Self = Self {
        offset: DVec2::ZERO,
        scale: DVec2::ONE,
    };

    /// Transform for a tile of `exact` pixels placed at `offset` in an atlas of `atlas` pixels.
    pub fn from_placement(offset: (u32, u32), exact: (u32, u32), atlas: (u32, u32)) -> Self {
        let atlas = DVec2::new(atlas.0 as f64, atlas.1 as f64);
        Self {
            offset: DVec2::new(offset.0 as f64, offset.1 as f64) / atlas,
            scale: DVec2::new(exact.0 as f64, exact.1 as f64) / atlas,
        }
    }

    pub fn apply(&self, uv: Vec2) -> Vec2 {
        (self.offset + uv.as_dvec2() * self.scale).as_vec2()
    }
}

/// Compute the atlas transform for `leaf` from its placement under `root`.
pub fn leaf_transform(tree: &TileTree, root: TileId, leaf: TileId) -> Result<UvTransform> {
    let root_node = tree.node(root);
    let atlas = (root_node.size_x, root_node.size_y);
    if atlas.0 == 0 || atlas.1 == 0 {
        return Err(BakeError::InconsistentTreeGeometry(format!(
            "root tile has zero extent {}x{}",
            atlas.0, atlas.1
        )));
    }
    let offset = tree.locate(root, leaf, (0, 0)).ok_or_else(|| {
        BakeError::InconsistentTreeGeometry(format!(
            "leaf {} not reachable from root",
            leaf.index()
        ))
    })?;
    Ok(UvTransform::from_placement(
        offset,
        tree.node(leaf).exact_size(),
        atlas,
    ))
}

/// Rewrite every texture coordinate used by a packed material into atlas space.
///
/// Each coordinate may belong to one material only; a coordinate referenced
/// by two different materials, at least one of them packed, is rejected before
/// anything is modified. Returns the number of coordinates rewritten.
pub fn remap_texcoords(
    mesh: &mut Mesh,
    tree: &TileTree,
    root: TileId,
    material_tiles: &BTreeMap<String, TileId>,
) -> Result<usize> {
    let transforms = material_tiles
        .iter()
        .map(|(name, &leaf)| Ok((name.as_str(), leaf_transform(tree, root, leaf)?)))
        .collect::<Result<BTreeMap<&str, UvTransform>>>()?;

    if mesh.texcoords.is_empty() {
        warn!("Mesh has no texture coordinates, nothing to remap");
        return Ok(0);
    }

    let mut owners: Vec<Option<&str>> = vec![None; mesh.texcoords.len()];
    for component in &mesh.components {
        let material = component.material.as_deref().unwrap_or(NO_MATERIAL);
        for &index in component.faces.iter().flatten() {
            let slot = owners.get_mut(index as usize).ok_or_else(|| {
                BakeError::Input(format!(
                    "component '{}' references texture coordinate {index} of {}",
                    component.name,
                    mesh.texcoords.len()
                ))
            })?;
            match *slot {
                None => *slot = Some(material),
                Some(owner) if owner == material => {}
                Some(owner) => {
                    if transforms.contains_key(owner) || transforms.contains_key(material) {
                        return Err(BakeError::UnresolvedSharedCoordinate {
                            index,
                            first: owner.to_string(),
                            second: material.to_string(),
                        });
                    }
                }
            }
        }
    }

    let per_coord: Vec<Option<UvTransform>> = owners
        .iter()
        .map(|owner| owner.and_then(|m| transforms.get(m).copied()))
        .collect();
    let remapped = per_coord.iter().filter(|t| t.is_some()).count();

    mesh.texcoords
        .par_iter_mut()
        .zip(per_coord.par_iter())
        .for_each(|(uv, transform)| {
            if let Some(t) = transform {
                *uv = t.apply(*uv);
            }
        });

    debug!(
        materials = transforms.len(),
        texcoords = remapped,
        "Texture coordinates remapped"
    );
    Ok(remapped)
}
