use super::flow::{Analysis, FactTable};
use super::lattice::{DefSet, MeetPolicy};
use super::report::FlowReport;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Quad, QuadId, Register};
use crate::Result;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Which definitions (quads that define a register) may reach each point.
///
/// Forward, may, meet = ∪. A quad kills every other definition of the registers it defines and
/// generates itself.
#[derive(Debug, Default)]
pub struct ReachingDefs {
    universe: Arc<BTreeSet<QuadId>>,
    defs_of: HashMap<Register, BTreeSet<QuadId>>,
    facts: FactTable<DefSet>,
    report: Option<FlowReport>,
}

impl ReachingDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quads defining `reg`. A register nobody defines has no definitions, not an error.
    pub fn definitions_of(&self, reg: &Register) -> impl Iterator<Item = QuadId> + '_ {
        self.defs_of.get(reg).into_iter().flatten().copied()
    }

    pub fn report(&self) -> Option<&FlowReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<FlowReport> {
        self.report
    }
}

impl Analysis for ReachingDefs {
    type Fact = DefSet;

    fn name(&self) -> &'static str {
        "reaching-definitions"
    }

    fn is_forward(&self) -> bool {
        true
    }

    fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()> {
        let mut defs_of: HashMap<Register, BTreeSet<QuadId>> = HashMap::new();
        for quad in cfg.quads() {
            for reg in quad.defined_registers() {
                defs_of.entry(reg.clone()).or_default().insert(quad.id);
            }
        }

        self.universe = Arc::new(defs_of.values().flatten().copied().collect());
        self.defs_of = defs_of;
        self.facts = FactTable::allocate(cfg, &self.top());
        self.report = None;

        debug!(
            method = cfg.name(),
            definitions = self.universe.len(),
            registers = self.defs_of.len(),
            "reaching definitions prepared"
        );
        Ok(())
    }

    fn new_fact(&self) -> DefSet {
        DefSet::empty(self.universe.clone(), MeetPolicy::Union)
    }

    fn facts(&self) -> &FactTable<DefSet> {
        &self.facts
    }

    fn facts_mut(&mut self) -> &mut FactTable<DefSet> {
        &mut self.facts
    }

    fn process_quad(&mut self, quad: &Quad) {
        let mut val = self.get_in(quad.id);
        for reg in quad.defined_registers() {
            if let Some(killed) = self.defs_of.get(reg) {
                val.remove_all(killed);
            }
        }
        if quad.defines_anything() {
            val.insert(quad.id);
        }
        self.set_out(quad.id, &val);
    }

    fn postprocess(&mut self, cfg: &ControlFlowGraph) -> Result<()> {
        self.report = Some(FlowReport::from_table(cfg.name(), &self.facts));
        Ok(())
    }
}
