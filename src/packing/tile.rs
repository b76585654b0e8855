use crate::error::{BakeError, Result};
use crate::types::ImageBuffer;

/// Handle to a node in a [`TileTree`]. Ids are handed out in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(usize);

impl TileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a tile holds.
#[derive(Debug, Clone)]
pub enum TileKind {
    /// One source texture.
    Leaf {
        /// Identity used in diagnostics (the material name).
        label: String,
        image: ImageBuffer,
        exact_width: u32,
        exact_height: u32,
    },
    /// Up to four children in a 2x2 grid.
    ///
    /// Slots: 0 = top-left, 1 = top-right, 2 = bottom-left, 3 = bottom-right.
    /// `offsets[i]` is the pixel offset of `children[i]` from the quad's origin.
    Quad {
        children: [Option<TileId>; 4],
        offsets: [(u32, u32); 4],
    },
}

/// A node of the packing hierarchy.
#[derive(Debug, Clone)]
pub struct TileNode {
    pub size_x: u32,
    pub size_y: u32,
    /// Navigational back-reference, set when the node is adopted by a quad.
    pub parent: Option<TileId>,
    pub kind: TileKind,
}

impl TileNode {
    pub fn max_size(&self) -> u32 {
        self.size_x.max(self.size_y)
    }

    pub fn area(&self) -> u64 {
        self.size_x as u64 * self.size_y as u64
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TileKind::Leaf { .. })
    }

    /// Dimensions of the content actually occupied by this tile.
    pub fn exact_size(&self) -> (u32, u32) {
        match &self.kind {
            TileKind::Leaf {
                exact_width,
                exact_height,
                ..
            } => (*exact_width, *exact_height),
            TileKind::Quad { .. } => (self.size_x, self.size_y),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            TileKind::Leaf { label, .. } => Some(label),
            TileKind::Quad { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&ImageBuffer> {
        match &self.kind {
            TileKind::Leaf { image, .. } => Some(image),
            TileKind::Quad { .. } => None,
        }
    }
}

/// Arena owning every tile of one packing run.
///
/// Quads refer to their children by [`TileId`]; each child is adopted by at
/// most one quad for the lifetime of the tree.
#[derive(Debug, Clone, Default)]
pub struct TileTree {
    nodes: Vec<TileNode>,
}

impl TileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TileId) -> &TileNode {
        &self.nodes[id.0]
    }

    /// Add a leaf sized exactly to its image.
    pub fn add_leaf(&mut self, label: impl Into<String>, image: ImageBuffer) -> TileId {
        let (w, h) = image.dimensions();
        let id = TileId(self.nodes.len());
        self.nodes.push(TileNode {
            size_x: w,
            size_y: h,
            parent: None,
            kind: TileKind::Leaf {
                label: label.into(),
                image,
                exact_width: w,
                exact_height: h,
            },
        });
        id
    }

    /// Combine 1 to 4 head tiles into a new quad, filling slots in order.
    ///
    /// Each member is given a power-of-two square cell sized to its longest
    /// side, and the quad is the power-of-two square enclosing its 2x2 grid of
    /// cells. With two or more members the side is twice the largest cell.
    pub fn add_quad(&mut self, members: &[TileId]) -> Result<TileId> {
        if members.is_empty() || members.len() > 4 {
            return Err(BakeError::InconsistentTreeGeometry(format!(
                "a quad holds 1 to 4 tiles, got {}",
                members.len()
            )));
        }
        if let Some(adopted) = members.iter().find(|m| self.nodes[m.0].parent.is_some()) {
            return Err(BakeError::InconsistentTreeGeometry(format!(
                "tile {} already has a parent",
                adopted.0
            )));
        }

        let mut children = [None; 4];
        let mut cells = [0u32; 4];
        for (slot, &member) in members.iter().enumerate() {
            children[slot] = Some(member);
            cells[slot] = square_side(self.nodes[member.0].max_size())?;
        }

        let col0 = cells[0].max(cells[2]);
        let col1 = cells[1].max(cells[3]);
        let row0 = cells[0].max(cells[1]);
        let row1 = cells[2].max(cells[3]);
        let offsets = [(0, 0), (col0, 0), (0, row0), (col0, row0)];
        let extent = col0
            .checked_add(col1)
            .zip(row0.checked_add(row1))
            .map(|(width, height)| width.max(height))
            .ok_or_else(|| {
                BakeError::InconsistentTreeGeometry(format!(
                    "quad grid {col0}+{col1} x {row0}+{row1} exceeds the addressable atlas size"
                ))
            })?;
        let side = square_side(extent)?;

        let id = TileId(self.nodes.len());
        for &member in members {
            self.nodes[member.0].parent = Some(id);
        }
        self.nodes.push(TileNode {
            size_x: side,
            size_y: side,
            parent: None,
            kind: TileKind::Quad { children, offsets },
        });
        Ok(id)
    }

    /// Absolute offset of `target` within the subtree rooted at `from`,
    /// where `from` itself sits at `offset`.
    pub fn locate(&self, from: TileId, target: TileId, offset: (u32, u32)) -> Option<(u32, u32)> {
        match &self.node(from).kind {
            TileKind::Leaf { .. } => (from == target).then_some(offset),
            TileKind::Quad { children, offsets } => children
                .iter()
                .zip(offsets)
                .filter_map(|(child, off)| child.map(|c| (c, off)))
                .find_map(|(child, &(dx, dy))| {
                    self.locate(child, target, (offset.0 + dx, offset.1 + dy))
                }),
        }
    }

    /// All leaves under `root`, in slot order.
    pub fn leaves(&self, root: TileId) -> Vec<TileId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                TileKind::Leaf { .. } => out.push(id),
                TileKind::Quad { children, .. } => {
                    stack.extend(children.iter().rev().flatten());
                }
            }
        }
        out
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: TileId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Verify that every quad under `root` contains its children without overlap.
    pub fn check_geometry(&self, root: TileId) -> Result<()> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            let TileKind::Quad { children, offsets } = &node.kind else {
                continue;
            };

            let rects: Vec<(TileId, u32, u32, u32, u32)> = children
                .iter()
                .zip(offsets)
                .filter_map(|(child, &(x, y))| {
                    child.map(|c| {
                        let n = self.node(c);
                        (c, x, y, n.size_x, n.size_y)
                    })
                })
                .collect();

            for &(child, x, y, w, h) in &rects {
                if self.node(child).parent != Some(id) {
                    return Err(BakeError::InconsistentTreeGeometry(format!(
                        "tile {} is not parented to quad {}",
                        child.0, id.0
                    )));
                }
                if x as u64 + w as u64 > node.size_x as u64 || y as u64 + h as u64 > node.size_y as u64 {
                    return Err(BakeError::InconsistentTreeGeometry(format!(
                        "tile {} ({w}x{h} at {x},{y}) overflows quad {} ({}x{})",
                        child.0, id.0, node.size_x, node.size_y
                    )));
                }
                stack.push(child);
            }

            for (i, a) in rects.iter().enumerate() {
                for b in &rects[i + 1..] {
                    if rects_overlap((a.1, a.2, a.3, a.4), (b.1, b.2, b.3, b.4)) {
                        return Err(BakeError::InconsistentTreeGeometry(format!(
                            "tiles {} and {} overlap inside quad {}",
                            a.0.0, b.0.0, id.0
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop a leaf's pixel data once it has been composited.
    pub fn release_image(&mut self, id: TileId) {
        if let TileKind::Leaf { image, .. } = &mut self.nodes[id.0].kind {
            *image = ImageBuffer::default();
        }
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, id: TileId) -> &mut TileNode {
        &mut self.nodes[id.0]
    }
}

/// Smallest power-of-two side that holds `extent` pixels; zero stays zero.
///
/// With every cell rounded this way, adding a tile at least as large as every
/// packed tile never shrinks the root.
fn square_side(extent: u32) -> Result<u32> {
    match extent {
        0 => Ok(0),
        _ => extent.checked_next_power_of_two().ok_or_else(|| {
            BakeError::InconsistentTreeGeometry(format!(
                "extent {extent} exceeds the addressable atlas size"
            ))
        }),
    }
}

/// Whether two `(x, y, w, h)` rectangles share any pixel.
pub(crate) fn rects_overlap(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    if aw == 0 || ah == 0 || bw == 0 || bh == 0 {
        return false;
    }
    ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
}
