use super::flow::{Analysis, FactTable};
use super::lattice::{MeetPolicy, VarSet};
use super::report::FlowReport;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Quad, Register};
use crate::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Registers whose current value may still be read. Backward, may, meet = ∪.
#[derive(Debug, Default)]
pub struct Liveness {
    universe: Arc<BTreeSet<Register>>,
    facts: FactTable<VarSet>,
    report: Option<FlowReport>,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn universe(&self) -> &BTreeSet<Register> {
        &self.universe
    }

    pub fn report(&self) -> Option<&FlowReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<FlowReport> {
        self.report
    }
}

impl Analysis for Liveness {
    type Fact = VarSet;

    fn name(&self) -> &'static str {
        "liveness"
    }

    fn is_forward(&self) -> bool {
        false
    }

    fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()> {
        self.universe = Arc::new(cfg.registers());
        self.facts = FactTable::allocate(cfg, &self.top());
        self.report = None;
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
        let mut val = self.get_out(quad.id);
        val.remove_all(quad.defined_registers());
        for reg in quad.used_registers() {
            val.insert(reg.clone());
        }
        self.set_in(quad.id, &val);
    }

    fn postprocess(&mut self, cfg: &ControlFlowGraph) -> Result<()> {
        self.report = Some(FlowReport::from_table(cfg.name(), &self.facts));
        Ok(())
    }
}
