use super::flow::{Analysis, FactTable};
use super::lattice::{MeetPolicy, VarSet};
use super::report::NullCheckReport;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Quad, QuadId, Register};
use crate::transform::{materialize_null_checks, MaterializeStats};
use crate::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Registers known to be non-null at each point, and the null checks that are therefore
/// redundant.
///
/// Forward, must, meet = ∩. Parameters may be null on entry; every other register starts out
/// non-null. Any definition makes a register possibly null again, and a null check makes its
/// register non-null afterwards.
#[derive(Debug, Default)]
pub struct NullCheckAnalysis {
    materialize: bool,
    universe: Arc<BTreeSet<Register>>,
    facts: FactTable<VarSet>,
    redundant: BTreeSet<QuadId>,
    materialized: Option<MaterializeStats>,
    report: Option<NullCheckReport>,
}

impl NullCheckAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite compare-to-null branches into explicit null checks before solving.
    pub fn with_materialization(mut self, enabled: bool) -> Self {
        self.materialize = enabled;
        self
    }

    pub fn redundant_checks(&self) -> impl Iterator<Item = QuadId> + '_ {
        self.redundant.iter().copied()
    }

    pub fn is_redundant(&self, quad: QuadId) -> bool {
        self.redundant.contains(&quad)
    }

    /// What the materialization pre-pass did, if it ran.
    pub fn materialized(&self) -> Option<&MaterializeStats> {
        self.materialized.as_ref()
    }

    pub fn report(&self) -> Option<&NullCheckReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<NullCheckReport> {
        self.report
    }
}

impl Analysis for NullCheckAnalysis {
    type Fact = VarSet;

    fn name(&self) -> &'static str {
        "null-check"
    }

    fn is_forward(&self) -> bool {
        true
    }

    fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()> {
        self.materialized = if self.materialize {
            Some(materialize_null_checks(cfg)?)
        } else {
            None
        };

        self.universe = Arc::new(cfg.registers());
        self.facts = FactTable::allocate(cfg, &self.top());
        self.redundant.clear();
        self.report = None;

        let mut entry = self.top();
        entry.remove_all(cfg.params());
        self.set_entry(&entry);

        debug!(
            method = cfg.name(),
            registers = self.universe.len(),
            params = cfg.params().len(),
            "null-check analysis prepared"
        );
        Ok(())
    }

    fn new_fact(&self) -> VarSet {
        VarSet::empty(self.universe.clone(), MeetPolicy::Intersection)
    }

    fn facts(&self) -> &FactTable<VarSet> {
        &self.facts
    }

    fn facts_mut(&mut self) -> &mut FactTable<VarSet> {
        &mut self.facts
    }

    fn process_quad(&mut self, quad: &Quad) {
        let mut val = self.get_in(quad.id);
        val.remove_all(quad.defined_registers());

        if let Some(checked) = quad.null_checked_register() {
            if val.contains(checked) {
                self.redundant.insert(quad.id);
            } else {
                self.redundant.remove(&quad.id);
            }
            val.insert(checked.clone());
        }
        self.set_out(quad.id, &val);
    }

    fn postprocess(&mut self, cfg: &ControlFlowGraph) -> Result<()> {
        self.report = Some(NullCheckReport {
            method: cfg.name().to_string(),
            redundant: self.redundant.iter().copied().collect(),
        });
        Ok(())
    }
}
