use crate::quad::Quad;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);
    pub const EXIT: BlockId = BlockId(1);

    pub fn is_sentinel(self) -> bool {
        self == Self::ENTRY || self == Self::EXIT
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            BlockId::ENTRY => f.write_str("entry"),
            BlockId::EXIT => f.write_str("exit"),
            BlockId(n) => write!(f, "block{}", n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub quads: Vec<Quad>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            quads: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }

    pub fn add_quad(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn first_quad(&self) -> Option<&Quad> {
        self.quads.first()
    }

    pub fn last_quad(&self) -> Option<&Quad> {
        self.quads.last()
    }

    pub fn last_quad_mut(&mut self) -> Option<&mut Quad> {
        self.quads.last_mut()
    }

    pub fn add_successor(&mut self, block: BlockId) {
        if !self.successors.contains(&block) {
            self.successors.push(block);
        }
    }

    pub fn add_predecessor(&mut self, block: BlockId) {
        if !self.predecessors.contains(&block) {
            self.predecessors.push(block);
        }
    }

    /// Swaps `old` for `new` at the same position. Returns false when `old` is not a successor.
    pub fn replace_successor(&mut self, old: BlockId, new: BlockId) -> bool {
        replace_in(&mut self.successors, old, new)
    }

    pub fn replace_predecessor(&mut self, old: BlockId, new: BlockId) -> bool {
        replace_in(&mut self.predecessors, old, new)
    }

    /// The successor reached when the block's conditional branch is not taken.
    pub fn fallthrough_successor(&self) -> Option<BlockId> {
        match self.last_quad().and_then(Quad::branch_target) {
            Some(target) => self.successors.iter().copied().find(|&s| s != target),
            None => self.successors.first().copied(),
        }
    }
}

fn replace_in(edges: &mut [BlockId], old: BlockId, new: BlockId) -> bool {
    match edges.iter_mut().find(|edge| **edge == old) {
        Some(edge) => {
            *edge = new;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::{Condition, Operand, QuadId, QuadKind};

    #[test]
    fn test_replace_successor_keeps_order() {
        let mut block = BasicBlock::new(BlockId(2));
        block.add_successor(BlockId(3));
        block.add_successor(BlockId(4));

        assert!(block.replace_successor(BlockId(3), BlockId(9)));
        assert_eq!(block.successors, vec![BlockId(9), BlockId(4)]);
        assert!(!block.replace_successor(BlockId(3), BlockId(10)));
    }

    #[test]
    fn test_fallthrough_is_not_the_branch_target() {
        let mut block = BasicBlock::new(BlockId(2));
        block.add_quad(Quad::new(
            QuadId(1),
            QuadKind::IfCmp {
                lhs: Operand::reg("R0"),
                rhs: Operand::null(),
                cond: Condition::Eq,
                target: BlockId(3),
            },
        ));
        block.add_successor(BlockId(3));
        block.add_successor(BlockId(4));

        assert_eq!(block.fallthrough_successor(), Some(BlockId(4)));
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(BlockId::ENTRY.to_string(), "entry");
        assert_eq!(BlockId::EXIT.to_string(), "exit");
        assert_eq!(BlockId(5).to_string(), "block5");
        assert!(BlockId::EXIT.is_sentinel());
    }
}
