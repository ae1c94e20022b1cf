/*! Assemble a `ControlFlowGraph` block by block.
 *
 * Quads get ids in push order starting at 1, blocks get ids after the two sentinels. Mistakes are
 * collected as the graph is assembled and reported together by `build`.
 */

use crate::block::{BasicBlock, BlockId};
use crate::cfg::{ControlFlowGraph, MethodInfo};
use crate::quad::{Quad, QuadId, QuadKind, Register};
use crate::{FlowError, Result};
use indexmap::IndexMap;

pub struct CfgBuilder {
    method: MethodInfo,
    blocks: IndexMap<BlockId, BasicBlock>,
    next_quad_id: u32,
    next_block_id: u32,
    errors: Vec<String>,
}

impl CfgBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let mut blocks = IndexMap::new();
        blocks.insert(BlockId::ENTRY, BasicBlock::new(BlockId::ENTRY));
        blocks.insert(BlockId::EXIT, BasicBlock::new(BlockId::EXIT));

        Self {
            method: MethodInfo::new(name),
            blocks,
            next_quad_id: 1,
            next_block_id: 2,
            errors: Vec::new(),
        }
    }

    pub fn param(&mut self, name: impl Into<String>) -> &mut Self {
        self.method.params.push(Register::new(name));
        self
    }

    pub fn block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn push(&mut self, block: BlockId, kind: QuadKind) -> QuadId {
        let id = QuadId(self.next_quad_id);
        self.next_quad_id += 1;

        if block.is_sentinel() {
            self.errors
                .push(format!("quad {} pushed into sentinel block {}", id, block));
        }
        match self.blocks.get_mut(&block) {
            Some(b) => b.add_quad(Quad::new(id, kind)),
            None => self
                .errors
                .push(format!("quad {} pushed into unknown block {}", id, block)),
        }
        id
    }

    pub fn edge(&mut self, from: BlockId, to: BlockId) -> &mut Self {
        if !self.blocks.contains_key(&from) || !self.blocks.contains_key(&to) {
            self.errors
                .push(format!("edge {} -> {} names an unknown block", from, to));
            return self;
        }
        if let Some(b) = self.blocks.get_mut(&from) {
            b.add_successor(to);
        }
        if let Some(b) = self.blocks.get_mut(&to) {
            b.add_predecessor(from);
        }
        self
    }

    pub fn build(self) -> Result<ControlFlowGraph> {
        let mut errors = self.errors;

        if self.blocks[&BlockId::ENTRY].successors.is_empty() {
            errors.push("entry has no successor".to_string());
        }
        if !self.blocks[&BlockId::ENTRY].predecessors.is_empty() {
            errors.push("entry has a predecessor".to_string());
        }
        if !self.blocks[&BlockId::EXIT].successors.is_empty() {
            errors.push("exit has a successor".to_string());
        }

        for block in self.blocks.values() {
            errors.extend(Self::check_block(block));
        }

        if !errors.is_empty() {
            return Err(FlowError::MalformedCfg(errors.join("; ")));
        }

        Ok(ControlFlowGraph::from_parts(
            self.method,
            self.blocks,
            self.next_quad_id,
            self.next_block_id,
        ))
    }

    fn check_block(block: &BasicBlock) -> Vec<String> {
        let mut errors = Vec::new();
        let last = block.quads.len().saturating_sub(1);

        for (idx, quad) in block.quads.iter().enumerate() {
            if quad.is_control_transfer() && idx != last {
                errors.push(format!(
                    "{} transfers control but is not last in {}",
                    quad.id, block.id
                ));
            }
            if let Some(target) = quad.branch_target() {
                if !block.successors.contains(&target) {
                    errors.push(format!(
                        "{} branches to {} which is not a successor of {}",
                        quad.id, target, block.id
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::Operand;

    #[test]
    fn test_ids_follow_push_order() {
        let mut b = CfgBuilder::new("ids");
        let body = b.block();
        let first = b.push(
            body,
            QuadKind::Move {
                dst: "R1".into(),
                src: Operand::int(1),
            },
        );
        let second = b.push(body, QuadKind::Return { value: None });
        b.edge(BlockId::ENTRY, body).edge(body, BlockId::EXIT);

        let cfg = b.build().unwrap();
        assert_eq!((first, second), (QuadId(1), QuadId(2)));
        assert_eq!(body, BlockId(2));
        assert_eq!(cfg.max_quad_id(), QuadId(2));
    }

    #[test]
    fn test_branch_target_must_be_successor() {
        let mut b = CfgBuilder::new("bad_goto");
        let body = b.block();
        let elsewhere = b.block();
        b.push(body, QuadKind::Goto { target: elsewhere });
        b.edge(BlockId::ENTRY, body).edge(body, BlockId::EXIT);

        let err = b.build().unwrap_err();
        assert!(matches!(err, FlowError::MalformedCfg(msg) if msg.contains("not a successor")));
    }

    #[test]
    fn test_rejects_quad_in_sentinel_and_missing_entry_edge() {
        let mut b = CfgBuilder::new("sentinel");
        b.push(BlockId::EXIT, QuadKind::Nop);

        let err = b.build().unwrap_err();
        let FlowError::MalformedCfg(msg) = err else {
            panic!("expected MalformedCfg");
        };
        assert!(msg.contains("sentinel"));
        assert!(msg.contains("entry has no successor"));
    }

    #[test]
    fn test_return_must_end_block() {
        let mut b = CfgBuilder::new("early_return");
        let body = b.block();
        b.push(body, QuadKind::Return { value: None });
        b.push(body, QuadKind::Nop);
        b.edge(BlockId::ENTRY, body).edge(body, BlockId::EXIT);

        assert!(b.build().is_err());
    }
}
