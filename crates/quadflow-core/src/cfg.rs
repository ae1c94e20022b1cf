use crate::block::{BasicBlock, BlockId};
use crate::quad::{Quad, QuadId, Register};
use crate::{FlowError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<Register>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }
}

/// Blocks of one method. `BlockId::ENTRY` and `BlockId::EXIT` are always present and empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    method: MethodInfo,
    blocks: IndexMap<BlockId, BasicBlock>,
    next_quad_id: u32,
    next_block_id: u32,
}

impl ControlFlowGraph {
    pub fn new(method: MethodInfo) -> Self {
        let mut blocks = IndexMap::new();
        blocks.insert(BlockId::ENTRY, BasicBlock::new(BlockId::ENTRY));
        blocks.insert(BlockId::EXIT, BasicBlock::new(BlockId::EXIT));

        Self {
            method,
            blocks,
            next_quad_id: 1,
            next_block_id: 2,
        }
    }

    pub(crate) fn from_parts(
        method: MethodInfo,
        blocks: IndexMap<BlockId, BasicBlock>,
        next_quad_id: u32,
        next_block_id: u32,
    ) -> Self {
        Self {
            method,
            blocks,
            next_quad_id,
            next_block_id,
        }
    }

    pub fn method(&self) -> &MethodInfo {
        &self.method
    }

    pub fn name(&self) -> &str {
        &self.method.name
    }

    pub fn params(&self) -> &[Register] {
        &self.method.params
    }

    pub fn entry(&self) -> &BasicBlock {
        &self.blocks[&BlockId::ENTRY]
    }

    pub fn exit(&self) -> &BasicBlock {
        &self.blocks[&BlockId::EXIT]
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut BasicBlock> {
        self.blocks.get_mut(&id).ok_or(FlowError::UnknownBlock(id))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Highest quad id in use or handed out so far, including quads added straight to a block.
    pub fn max_quad_id(&self) -> QuadId {
        let handed_out = QuadId(self.next_quad_id.saturating_sub(1));
        self.blocks
            .values()
            .flat_map(|block| block.quads.iter())
            .map(|quad| quad.id)
            .fold(handed_out, QuadId::max)
    }

    /// An id above every quad currently in the graph and every id handed out before.
    pub fn new_quad_id(&mut self) -> QuadId {
        let id = QuadId(self.max_quad_id().0 + 1);
        self.next_quad_id = id.0 + 1;
        id
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        if !self.blocks.contains_key(&to) {
            return Err(FlowError::UnknownBlock(to));
        }
        self.block_mut(from)?.add_successor(to);
        self.block_mut(to)?.add_predecessor(from);
        Ok(())
    }

    /// Blocks reachable from the entry sentinel, in reverse postorder.
    pub fn block_order(&self) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        let mut stack = vec![(BlockId::ENTRY, false)];

        while let Some((block, finished)) = stack.pop() {
            if finished {
                postorder.push(block);
                continue;
            }
            if !visited.insert(block) {
                continue;
            }

            stack.push((block, true));
            if let Some(b) = self.blocks.get(&block) {
                for &succ in b.successors.iter().rev() {
                    if !visited.contains(&succ) {
                        stack.push((succ, false));
                    }
                }
            }
        }

        postorder.reverse();
        postorder
    }

    /// Quads of reachable blocks in program order.
    pub fn quads(&self) -> impl Iterator<Item = &Quad> + '_ {
        self.block_order()
            .into_iter()
            .filter_map(move |id| self.blocks.get(&id))
            .flat_map(|block| block.quads.iter())
    }

    pub fn quad(&self, id: QuadId) -> Option<&Quad> {
        self.blocks
            .values()
            .flat_map(|block| block.quads.iter())
            .find(|quad| quad.id == id)
    }

    pub fn locate(&self, id: QuadId) -> Result<(BlockId, usize)> {
        self.blocks
            .values()
            .find_map(|block| {
                block
                    .quads
                    .iter()
                    .position(|quad| quad.id == id)
                    .map(|idx| (block.id, idx))
            })
            .ok_or(FlowError::UnknownQuad(id))
    }

    /// Every register a reachable quad defines or uses, plus the method parameters.
    pub fn registers(&self) -> BTreeSet<Register> {
        let mut registers: BTreeSet<Register> = self.method.params.iter().cloned().collect();
        for quad in self.quads() {
            registers.extend(quad.defined_registers().into_iter().cloned());
            registers.extend(quad.used_registers().into_iter().cloned());
        }
        registers
    }

    pub fn quad_edges(&self) -> QuadEdges {
        QuadEdges::build(self)
    }
}

/// Quad-level neighbours of a CFG snapshot. `None` stands for the virtual entry (in predecessor
/// lists) or the virtual exit (in successor lists).
#[derive(Debug, Clone, Default)]
pub struct QuadEdges {
    order: Vec<QuadId>,
    predecessors: HashMap<QuadId, Vec<Option<QuadId>>>,
    successors: HashMap<QuadId, Vec<Option<QuadId>>>,
    exit_predecessors: Vec<Option<QuadId>>,
    entry_successors: Vec<Option<QuadId>>,
}

impl QuadEdges {
    fn build(cfg: &ControlFlowGraph) -> Self {
        let block_order = cfg.block_order();
        let reachable: HashSet<BlockId> = block_order.iter().copied().collect();
        let mut edges = Self::default();

        for block in block_order.iter().filter_map(|id| cfg.block(*id)) {
            let count = block.quads.len();
            for (idx, quad) in block.quads.iter().enumerate() {
                let preds = if idx == 0 {
                    Self::incoming(cfg, &reachable, &block.predecessors)
                } else {
                    vec![Some(block.quads[idx - 1].id)]
                };
                let succs = if idx + 1 == count {
                    Self::outgoing(cfg, &reachable, &block.successors)
                } else {
                    vec![Some(block.quads[idx + 1].id)]
                };

                edges.order.push(quad.id);
                edges.predecessors.insert(quad.id, preds);
                edges.successors.insert(quad.id, succs);
            }
        }

        edges.exit_predecessors = Self::incoming(cfg, &reachable, &cfg.exit().predecessors);
        edges.entry_successors = Self::outgoing(cfg, &reachable, &cfg.entry().successors);
        edges
    }

    /// Last quads of `blocks`, looking through empty blocks.
    fn incoming(
        cfg: &ControlFlowGraph,
        reachable: &HashSet<BlockId>,
        blocks: &[BlockId],
    ) -> Vec<Option<QuadId>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<BlockId> = blocks.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !reachable.contains(&id) || !seen.insert(id) {
                continue;
            }
            if id == BlockId::ENTRY {
                push_unique(&mut found, None);
                continue;
            }
            let Some(block) = cfg.block(id) else { continue };
            match block.last_quad() {
                Some(quad) => push_unique(&mut found, Some(quad.id)),
                None => stack.extend(block.predecessors.iter().rev()),
            }
        }

        found
    }

    /// First quads of `blocks`, looking through empty blocks.
    fn outgoing(
        cfg: &ControlFlowGraph,
        reachable: &HashSet<BlockId>,
        blocks: &[BlockId],
    ) -> Vec<Option<QuadId>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<BlockId> = blocks.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !reachable.contains(&id) || !seen.insert(id) {
                continue;
            }
            if id == BlockId::EXIT {
                push_unique(&mut found, None);
                continue;
            }
            let Some(block) = cfg.block(id) else { continue };
            match block.first_quad() {
                Some(quad) => push_unique(&mut found, Some(quad.id)),
                None => stack.extend(block.successors.iter().rev()),
            }
        }

        found
    }

    pub fn order(&self) -> &[QuadId] {
        &self.order
    }

    pub fn predecessors(&self, quad: QuadId) -> &[Option<QuadId>] {
        self.predecessors
            .get(&quad)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, quad: QuadId) -> &[Option<QuadId>] {
        self.successors
            .get(&quad)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Quads whose successors include the virtual exit. `None` means the entry reaches the exit
    /// without passing through a quad.
    pub fn exit_predecessors(&self) -> &[Option<QuadId>] {
        &self.exit_predecessors
    }

    pub fn entry_successors(&self) -> &[Option<QuadId>] {
        &self.entry_successors
    }
}

fn push_unique(found: &mut Vec<Option<QuadId>>, item: Option<QuadId>) {
    if !found.contains(&item) {
        found.push(item);
    }
}
