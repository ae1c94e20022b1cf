//! Full-sweep iterative fixpoint solver.
//!
//! Forward analyses start with every `out` at top and sweep quads in program order. Backward
//! analyses start with every `in` at top and sweep in reverse program order. The boundary fact
//! opposite the analysis' starting point (`exit` for forward, `entry` for backward) is recomputed
//! once per sweep, after all quads. Iteration stops after the first sweep that changes nothing.

use super::flow::Analysis;
use super::lattice::DataflowFact;
use crate::cfg::{ControlFlowGraph, QuadEdges};
use crate::quad::{Quad, QuadId};
use crate::Result;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    /// Sweeps run, including the final one that changed nothing.
    pub sweeps: usize,
    pub quads: usize,
}

pub struct FlowSolver<A: Analysis> {
    analysis: A,
}

impl<A: Analysis> FlowSolver<A> {
    pub fn new(analysis: A) -> Self {
        Self { analysis }
    }

    /// Runs `analysis` over `cfg` and hands it back with its final state.
    pub fn run(analysis: A, cfg: &mut ControlFlowGraph) -> Result<(A, SolveStats)> {
        let mut solver = Self::new(analysis);
        let stats = solver.visit_cfg(cfg)?;
        Ok((solver.into_analysis(), stats))
    }

    /// Swaps in a new analysis, returning the previous one.
    pub fn register_analysis(&mut self, analysis: A) -> A {
        std::mem::replace(&mut self.analysis, analysis)
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    pub fn into_analysis(self) -> A {
        self.analysis
    }

    pub fn visit_cfg(&mut self, cfg: &mut ControlFlowGraph) -> Result<SolveStats> {
        self.analysis.preprocess(cfg)?;

        let cfg: &ControlFlowGraph = cfg;
        let edges = cfg.quad_edges();
        let quads: Vec<&Quad> = cfg.quads().collect();

        debug!(
            analysis = self.analysis.name(),
            method = cfg.name(),
            forward = self.analysis.is_forward(),
            quads = quads.len(),
            "solving"
        );

        let sweeps = if self.analysis.is_forward() {
            self.solve_forward(&quads, &edges)
        } else {
            self.solve_backward(&quads, &edges)
        };
        let stats = SolveStats {
            sweeps,
            quads: quads.len(),
        };

        debug!(
            analysis = self.analysis.name(),
            method = cfg.name(),
            sweeps = stats.sweeps,
            "fixpoint reached"
        );

        self.analysis.postprocess(cfg)?;
        Ok(stats)
    }

    fn solve_forward(&mut self, quads: &[&Quad], edges: &QuadEdges) -> usize {
        let analysis = &mut self.analysis;
        let top = analysis.top();
        for quad in quads {
            analysis.set_out(quad.id, &top);
        }
        let entry = analysis.get_entry();

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut changed = 0usize;

            for quad in quads {
                let new_in = meet_over(analysis, edges.predecessors(quad.id), &entry, |a, id| {
                    a.get_out(id)
                });
                let in_changed = new_in != analysis.get_in(quad.id);
                analysis.set_in(quad.id, &new_in);

                let old_out = analysis.get_out(quad.id);
                analysis.process_quad(quad);
                let out_changed = old_out != analysis.get_out(quad.id);

                if in_changed || out_changed {
                    trace!(quad = %quad, sweep = sweeps, "facts changed");
                    changed += 1;
                }
            }

            let new_exit = meet_over(analysis, edges.exit_predecessors(), &entry, |a, id| {
                a.get_out(id)
            });
            if new_exit != analysis.get_exit() {
                changed += 1;
            }
            analysis.set_exit(&new_exit);

            debug!(sweep = sweeps, changed, "forward sweep");
            if changed == 0 {
                return sweeps;
            }
        }
    }

    fn solve_backward(&mut self, quads: &[&Quad], edges: &QuadEdges) -> usize {
        let analysis = &mut self.analysis;
        let top = analysis.top();
        for quad in quads {
            analysis.set_in(quad.id, &top);
        }
        let exit = analysis.get_exit();

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut changed = 0usize;

            for quad in quads.iter().rev() {
                let new_out = meet_over(analysis, edges.successors(quad.id), &exit, |a, id| {
                    a.get_in(id)
                });
                let out_changed = new_out != analysis.get_out(quad.id);
                analysis.set_out(quad.id, &new_out);

                let old_in = analysis.get_in(quad.id);
                analysis.process_quad(quad);
                let in_changed = old_in != analysis.get_in(quad.id);

                if in_changed || out_changed {
                    trace!(quad = %quad, sweep = sweeps, "facts changed");
                    changed += 1;
                }
            }

            let new_entry = meet_over(analysis, edges.entry_successors(), &exit, |a, id| {
                a.get_in(id)
            });
            if new_entry != analysis.get_entry() {
                changed += 1;
            }
            analysis.set_entry(&new_entry);

            debug!(sweep = sweeps, changed, "backward sweep");
            if changed == 0 {
                return sweeps;
            }
        }
    }
}

/// Meet of `read(n)` over `neighbours`, with `boundary` standing in for the virtual entry/exit.
fn meet_over<A: Analysis>(
    analysis: &A,
    neighbours: &[Option<QuadId>],
    boundary: &A::Fact,
    read: impl Fn(&A, QuadId) -> A::Fact,
) -> A::Fact {
    let mut acc = analysis.top();
    for neighbour in neighbours {
        match neighbour {
            Some(id) => acc.meet_with(&read(analysis, *id)),
            None => acc.meet_with(boundary),
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::flow::FactTable;
    use crate::analysis::lattice::{MeetPolicy, VarSet};
    use crate::block::BlockId;
    use crate::builder::CfgBuilder;
    use crate::quad::{Operand, QuadKind, Register};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    /// Records which registers have been assigned on some path; counts transfer calls.
    struct Assigned {
        universe: Arc<BTreeSet<Register>>,
        facts: FactTable<VarSet>,
        forward: bool,
        transfers: usize,
        postprocessed: bool,
    }

    impl Assigned {
        fn new(forward: bool) -> Self {
            Self {
                universe: Arc::new(BTreeSet::new()),
                facts: FactTable::default(),
                forward,
                transfers: 0,
                postprocessed: false,
            }
        }
    }

    impl Analysis for Assigned {
        type Fact = VarSet;

        fn name(&self) -> &'static str {
            "assigned"
        }

        fn is_forward(&self) -> bool {
            self.forward
        }

        fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()> {
            self.universe = Arc::new(cfg.registers());
            self.facts = FactTable::allocate(cfg, &self.top());
            Ok(())
        }

        fn new_fact(&self) -> VarSet {
            VarSet::empty(self.universe.clone(), MeetPolicy::Union)
        }

        fn facts(&self) -> &FactTable<VarSet> {
            &self.facts
        }

        fn facts_mut(&mut self) -> &mut FactTable<VarSet> {
            &mut self.facts
        }

        fn process_quad(&mut self, quad: &Quad) {
            self.transfers += 1;
            let (mut val, write_out) = if self.forward {
                (self.get_in(quad.id), true)
            } else {
                (self.get_out(quad.id), false)
            };
            for def in quad.defined_registers() {
                val.insert(def.clone());
            }
            if write_out {
                self.set_out(quad.id, &val);
            } else {
                self.set_in(quad.id, &val);
            }
        }

        fn postprocess(&mut self, _cfg: &ControlFlowGraph) -> Result<()> {
            self.postprocessed = true;
            Ok(())
        }
    }

    /// `R1 = 0; loop: if R1 == 10 goto done; R1 = R1 + 1; goto loop; done: return R1`
    fn counting_loop() -> ControlFlowGraph {
        let mut b = CfgBuilder::new("count");
        let init = b.block();
        let head = b.block();
        let body = b.block();
        let done = b.block();

        b.push(
            init,
            QuadKind::Move {
                dst: "R1".into(),
                src: Operand::int(0),
            },
        );
        b.push(
            head,
            QuadKind::IfCmp {
                lhs: Operand::reg("R1"),
                rhs: Operand::int(10),
                cond: crate::quad::Condition::Eq,
                target: done,
            },
        );
        b.push(
            body,
            QuadKind::Binary {
                op: crate::quad::BinaryOp::Add,
                dst: "R1".into(),
                lhs: Operand::reg("R1"),
                rhs: Operand::int(1),
            },
        );
        b.push(body, QuadKind::Goto { target: head });
        b.push(
            done,
            QuadKind::Return {
                value: Some(Operand::reg("R1")),
            },
        );

        b.edge(BlockId::ENTRY, init)
            .edge(init, head)
            .edge(head, body)
            .edge(head, done)
            .edge(body, head)
            .edge(done, BlockId::EXIT);
        b.build().unwrap()
    }

    #[test]
    fn test_forward_reaches_fixpoint_and_sets_exit() {
        let mut cfg = counting_loop();
        let (analysis, stats) = FlowSolver::run(Assigned::new(true), &mut cfg).unwrap();

        assert!(analysis.postprocessed);
        assert!(stats.sweeps >= 2);
        assert_eq!(stats.quads, 5);
        assert_eq!(analysis.get_exit().to_string(), "[R1]");
        assert_eq!(analysis.get_in(QuadId(2)).to_string(), "[R1]");
        assert_eq!(analysis.get_entry().to_string(), "[]");
    }

    #[test]
    fn test_backward_recomputes_entry() {
        let mut cfg = counting_loop();
        let (analysis, _) = FlowSolver::run(Assigned::new(false), &mut cfg).unwrap();

        // backwards, "assigned later on some path"
        assert_eq!(analysis.get_entry().to_string(), "[R1]");
        assert_eq!(analysis.get_out(QuadId(5)).to_string(), "[]");
        assert_eq!(analysis.get_in(QuadId(2)).to_string(), "[R1]");
    }

    #[test]
    fn test_extra_sweep_confirms_fixpoint() {
        let mut cfg = counting_loop();
        let (analysis, stats) = FlowSolver::run(Assigned::new(true), &mut cfg).unwrap();
        assert_eq!(analysis.transfers, stats.sweeps * stats.quads);
    }

    #[test]
    fn test_register_analysis_returns_previous() {
        let mut solver = FlowSolver::new(Assigned::new(true));
        let previous = solver.register_analysis(Assigned::new(false));
        assert!(previous.is_forward());
        assert!(!solver.analysis().is_forward());
    }
}
