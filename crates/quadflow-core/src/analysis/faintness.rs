use super::flow::{Analysis, FactTable};
use super::lattice::VarSet;
use super::liveness::Liveness;
use super::report::FlowReport;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Operator, Quad};
use crate::Result;
use tracing::debug;

/// Faint registers: those whose value can only ever flow into other faint registers.
///
/// Solved as "strong" liveness, backward with meet = ∪, where a `Move` or `Binary` only makes its
/// operands live if its destination is live afterwards. Every other operator, `Unary` included,
/// always makes its operands live. Once the fixpoint is reached each fact is replaced by its
/// complement, so the reported sets are the faint registers.
#[derive(Debug, Default)]
pub struct Faintness {
    liveness: Liveness,
    live: Option<FactTable<VarSet>>,
}

impl Faintness {
    pub fn new() -> Self {
        Self::default()
    }

    /// The strong-liveness facts as they stood before complementing.
    pub fn live_facts(&self) -> Option<&FactTable<VarSet>> {
        self.live.as_ref()
    }

    pub fn report(&self) -> Option<&FlowReport> {
        self.liveness.report()
    }

    pub fn into_report(self) -> Option<FlowReport> {
        self.liveness.into_report()
    }
}

impl Analysis for Faintness {
    type Fact = VarSet;

    fn name(&self) -> &'static str {
        "faintness"
    }

    fn is_forward(&self) -> bool {
        false
    }

    fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()> {
        self.live = None;
        self.liveness.preprocess(cfg)
    }

    fn new_fact(&self) -> VarSet {
        self.liveness.new_fact()
    }

    fn facts(&self) -> &FactTable<VarSet> {
        self.liveness.facts()
    }

    fn facts_mut(&mut self) -> &mut FactTable<VarSet> {
        self.liveness.facts_mut()
    }

    fn process_quad(&mut self, quad: &Quad) {
        let mut val = self.get_out(quad.id);
        let defs = quad.defined_registers();

        // must be checked before the kill below removes the destination
        let uses_are_live = match quad.operator() {
            Operator::Move | Operator::Binary => defs.iter().any(|def| val.contains(def)),
            _ => true,
        };

        val.remove_all(defs);
        if uses_are_live {
            for reg in quad.used_registers() {
                val.insert(reg.clone());
            }
        }
        self.set_in(quad.id, &val);
    }

    fn postprocess(&mut self, cfg: &ControlFlowGraph) -> Result<()> {
        self.live = Some(self.liveness.facts().clone());
        self.liveness.facts_mut().for_each_mut(|fact| fact.complement());

        debug!(
            method = cfg.name(),
            registers = self.liveness.universe().len(),
            "complemented strong liveness"
        );
        self.liveness.postprocess(cfg)
    }
}
