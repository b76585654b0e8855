use rayon::prelude::*;
use tracing::debug;

use crate::error::{BakeError, Result};
use crate::types::ImageBuffer;
use crate::types::image_buffer::CHANNELS;

use super::tile::{TileId, TileTree};

/// A leaf's absolute rectangle inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    leaf: TileId,
    x: u32,
    y: u32,
    height: u32,
}

/// Composite every leaf under `root` into one atlas image.
///
/// All leaves must hold decoded pixels; this is checked before any copying.
/// Source images are released from the tree once the atlas is built.
pub fn stitch_atlas(tree: &mut TileTree, root: TileId, background: [u8; 4]) -> Result<ImageBuffer> {
    let leaves = tree.leaves(root);

    for &leaf in &leaves {
        let node = tree.node(leaf);
        if !node.image().is_some_and(ImageBuffer::is_loaded) {
            return Err(BakeError::MissingImageData {
                material: node.label().unwrap_or_default().to_string(),
            });
        }
    }

    tree.check_geometry(root)?;

    let root_node = tree.node(root);
    let (atlas_w, atlas_h) = (root_node.size_x, root_node.size_y);

    let placements = leaves
        .iter()
        .map(|&leaf| {
            let (x, y) = tree.locate(root, leaf, (0, 0)).ok_or_else(|| {
                BakeError::InconsistentTreeGeometry(format!(
                    "leaf {} not reachable from root",
                    leaf.index()
                ))
            })?;
            let (width, height) = tree.node(leaf).exact_size();
            if x + width > atlas_w || y + height > atlas_h {
                return Err(BakeError::InconsistentTreeGeometry(format!(
                    "leaf {} ({width}x{height} at {x},{y}) exceeds atlas {atlas_w}x{atlas_h}",
                    leaf.index()
                )));
            }
            Ok(Placement {
                leaf,
                x,
                y,
                height,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut atlas = ImageBuffer::filled(atlas_w, atlas_h, background);
    let stride = atlas_w as usize * CHANNELS;
    if stride > 0 {
        let tree: &TileTree = tree;
        atlas
            .pixels_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| copy_row(tree, &placements, y as u32, row));
    }

    debug!(
        width = atlas_w,
        height = atlas_h,
        leaves = placements.len(),
        "Atlas stitched"
    );

    for &leaf in &leaves {
        tree.release_image(leaf);
    }

    Ok(atlas)
}

/// Fill one atlas row from every placement that covers it.
fn copy_row(tree: &TileTree, placements: &[Placement], y: u32, row: &mut [u8]) {
    for p in placements {
        if y < p.y || y >= p.y + p.height {
            continue;
        }
        let Some(src) = tree.node(p.leaf).image().and_then(|img| img.row(y - p.y)) else {
            continue;
        };
        let start = p.x as usize * CHANNELS;
        row[start..start + src.len()].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::scheduler::PackingScheduler;

    fn solid(w: u32, h: u32, v: u8) -> ImageBuffer {
        ImageBuffer::filled(w, h, [v, v, v, 255])
    }

    #[test]
    fn single_leaf_atlas_is_unchanged() {
        let mut tree = TileTree::new();
        let img = ImageBuffer::from(image::RgbaImage::from_fn(16, 16, |x, y| {
            image::Rgba([x as u8, y as u8, 7, 255])
        }));
        let leaf = tree.add_leaf("only", img.clone());

        let atlas = stitch_atlas(&mut tree, leaf, [0; 4]).unwrap();
        assert_eq!(atlas, img);
    }

    #[test]
    fn leaves_land_at_their_offsets() {
        let mut tree = TileTree::new();
        let a = tree.add_leaf("a", solid(4, 4, 10));
        let b = tree.add_leaf("b", solid(2, 3, 20));
        let root = PackingScheduler::new(vec![a, b]).build(&mut tree).unwrap().unwrap();

        let bg = [1, 2, 3, 4];
        let atlas = stitch_atlas(&mut tree, root, bg).unwrap();
        // b is smaller so it sorts first: b at (0,0), a at (4,0); atlas 8x8
        assert_eq!(atlas.dimensions(), (8, 8));
        assert_eq!(atlas.pixel(0, 0), Some([20, 20, 20, 255]));
        assert_eq!(atlas.pixel(1, 2), Some([20, 20, 20, 255]));
        assert_eq!(atlas.pixel(0, 3), Some(bg));
        assert_eq!(atlas.pixel(2, 0), Some(bg));
        assert_eq!(atlas.pixel(4, 0), Some([10, 10, 10, 255]));
        assert_eq!(atlas.pixel(7, 3), Some([10, 10, 10, 255]));
        assert_eq!(atlas.pixel(7, 7), Some(bg));
    }

    #[test]
    fn sources_are_released_after_stitching() {
        let mut tree = TileTree::new();
        let a = tree.add_leaf("a", solid(2, 2, 1));
        let b = tree.add_leaf("b", solid(2, 2, 2));
        let root = PackingScheduler::new(vec![a, b]).build(&mut tree).unwrap().unwrap();

        stitch_atlas(&mut tree, root, [0; 4]).unwrap();
        assert!(!tree.node(a).image().unwrap().is_loaded());
        assert_eq!(tree.node(a).exact_size(), (2, 2));
    }

    #[test]
    fn missing_image_fails_before_copying() {
        let mut tree = TileTree::new();
        let a = tree.add_leaf("loaded", solid(2, 2, 1));
        let b = tree.add_leaf("ghost", ImageBuffer::default());
        let root = PackingScheduler::new(vec![a, b]).build(&mut tree).unwrap().unwrap();

        let err = stitch_atlas(&mut tree, root, [0; 4]).unwrap_err();
        match err {
            BakeError::MissingImageData { material } => assert_eq!(material, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
        // Nothing was consumed.
        assert!(tree.node(a).image().unwrap().is_loaded());
    }
}
