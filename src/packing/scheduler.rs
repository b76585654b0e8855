use tracing::debug;

use crate::error::{BakeError, Result};

use super::tile::{TileId, TileTree};

/// Reduces a set of head tiles to a single root by repeatedly merging all
/// tiles of the current smallest size into quads.
pub struct PackingScheduler {
    heads: Vec<TileId>,
    rounds: usize,
}

impl PackingScheduler {
    pub fn new(heads: Vec<TileId>) -> Self {
        Self { heads, rounds: 0 }
    }

    /// Number of merge rounds performed so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run the merge loop to completion.
    ///
    /// Returns `None` when there were no heads to pack.
    pub fn build(&mut self, tree: &mut TileTree) -> Result<Option<TileId>> {
        while self.heads.len() > 1 {
            self.merge_round(tree)?;
        }
        debug!(rounds = self.rounds, nodes = tree.len(), "Tile tree built");
        Ok(self.heads.pop())
    }

    /// One round: sort heads, gather the smallest size class and replace it
    /// with quads of up to four members each.
    fn merge_round(&mut self, tree: &mut TileTree) -> Result<()> {
        self.heads
            .sort_by_key(|&id| (tree.node(id).max_size(), id));

        let smallest = tree.node(self.heads[0]).max_size();
        let mut take = self
            .heads
            .iter()
            .take_while(|&&id| tree.node(id).max_size() == smallest)
            .count();

        // A lone tile cannot merge with itself; pull in the next size class.
        if take == 1 {
            let next = tree.node(self.heads[1]).max_size();
            take += self.heads[1..]
                .iter()
                .take_while(|&&id| tree.node(id).max_size() == next)
                .count();
        }

        let candidates: Vec<TileId> = self.heads.drain(..take).collect();
        let mut groups: Vec<&[TileId]> = candidates.chunks(4).collect();

        // Leave a trailing singleton for the next round instead of wrapping it alone.
        if groups.len() > 1 && groups.last().is_some_and(|g| g.len() == 1) {
            if let Some(rest) = groups.pop() {
                self.heads.extend_from_slice(rest);
            }
        }

        for group in groups {
            let quad = tree.add_quad(group)?;
            let node = tree.node(quad);
            debug!(
                round = self.rounds,
                quad = quad.index(),
                members = group.len(),
                size_x = node.size_x,
                size_y = node.size_y,
                "Merged tiles"
            );
            self.heads.push(quad);
        }

        self.rounds += 1;
        if self.rounds > tree.len() {
            return Err(BakeError::InconsistentTreeGeometry(format!(
                "merge loop did not converge after {} rounds",
                self.rounds
            )));
        }
        Ok(())
    }
}
