use super::lattice::DataflowFact;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Quad, QuadId};
use crate::Result;

/// Per-quad `in`/`out` facts plus the facts of the virtual entry and exit.
///
/// Slots are indexed by quad id and only exist for quads the CFG's program order visits.
#[derive(Debug, Clone)]
pub struct FactTable<F> {
    in_facts: Vec<Option<F>>,
    out_facts: Vec<Option<F>>,
    entry: Option<F>,
    exit: Option<F>,
}

impl<F> Default for FactTable<F> {
    fn default() -> Self {
        Self {
            in_facts: Vec::new(),
            out_facts: Vec::new(),
            entry: None,
            exit: None,
        }
    }
}

impl<F: DataflowFact> FactTable<F> {
    /// Sizes the table past the largest quad id and fills every visited slot with a copy of
    /// `initial`.
    pub fn allocate(cfg: &ControlFlowGraph, initial: &F) -> Self {
        let len = cfg
            .quads()
            .map(|quad| quad.id)
            .fold(cfg.max_quad_id(), QuadId::max)
            .index()
            + 1;
        let mut table = Self {
            in_facts: vec![None; len],
            out_facts: vec![None; len],
            entry: Some(initial.clone()),
            exit: Some(initial.clone()),
        };

        for quad in cfg.quads() {
            let idx = quad.id.index();
            table.in_facts[idx] = Some(initial.clone());
            table.out_facts[idx] = Some(initial.clone());
        }

        table
    }

    pub fn in_fact(&self, id: QuadId) -> Option<&F> {
        self.in_facts.get(id.index()).and_then(Option::as_ref)
    }

    pub fn out_fact(&self, id: QuadId) -> Option<&F> {
        self.out_facts.get(id.index()).and_then(Option::as_ref)
    }

    pub fn in_fact_mut(&mut self, id: QuadId) -> Option<&mut F> {
        self.in_facts.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn out_fact_mut(&mut self, id: QuadId) -> Option<&mut F> {
        self.out_facts.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn entry(&self) -> Option<&F> {
        self.entry.as_ref()
    }

    pub fn exit(&self) -> Option<&F> {
        self.exit.as_ref()
    }

    pub fn set_in(&mut self, id: QuadId, value: &F) {
        store(&mut self.in_facts, id, value);
    }

    pub fn set_out(&mut self, id: QuadId, value: &F) {
        store(&mut self.out_facts, id, value);
    }

    pub fn set_entry(&mut self, value: &F) {
        match &mut self.entry {
            Some(entry) => entry.copy_from(value),
            None => self.entry = Some(value.clone()),
        }
    }

    pub fn set_exit(&mut self, value: &F) {
        match &mut self.exit {
            Some(exit) => exit.copy_from(value),
            None => self.exit = Some(value.clone()),
        }
    }

    /// Ids with allocated facts, ascending.
    pub fn ids(&self) -> impl Iterator<Item = QuadId> + '_ {
        self.in_facts
            .iter()
            .enumerate()
            .filter(|(_, fact)| fact.is_some())
            .map(|(idx, _)| QuadId(idx as u32))
    }

    /// `(id, in, out)` for every allocated quad, ascending by id.
    pub fn rows(&self) -> impl Iterator<Item = (QuadId, &F, &F)> + '_ {
        self.in_facts
            .iter()
            .zip(&self.out_facts)
            .enumerate()
            .filter_map(|(idx, (i, o))| Some((QuadId(idx as u32), i.as_ref()?, o.as_ref()?)))
    }

    /// Applies `f` to every allocated fact, including entry and exit.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut F)) {
        self.in_facts
            .iter_mut()
            .chain(self.out_facts.iter_mut())
            .flatten()
            .for_each(&mut f);
        self.entry.iter_mut().for_each(&mut f);
        self.exit.iter_mut().for_each(&mut f);
    }
}

/// Writes into a slot `allocate` created. Quads outside program order have no slot.
fn store<F: DataflowFact>(slots: &mut Vec<Option<F>>, id: QuadId, value: &F) {
    let idx = id.index();
    debug_assert!(
        slots.get(idx).map_or(false, Option::is_some),
        "no fact slot for quad {}",
        id
    );
    if idx >= slots.len() {
        slots.resize(idx + 1, None);
    }
    match &mut slots[idx] {
        Some(slot) => slot.copy_from(value),
        None => slots[idx] = Some(value.clone()),
    }
}

/// One dataflow problem, driven by [`super::FlowSolver`].
///
/// The solver touches facts only through the `get_*`/`set_*` accessors and `new_fact`; lattice
/// internals stay private to the analysis.
pub trait Analysis {
    type Fact: DataflowFact;

    fn name(&self) -> &'static str;

    fn is_forward(&self) -> bool;

    /// Builds the universe and allocates the fact table. May rewrite `cfg`; the solver does not
    /// mutate it afterwards.
    fn preprocess(&mut self, cfg: &mut ControlFlowGraph) -> Result<()>;

    /// A fresh fact over this analysis' universe. Its contents are unspecified; callers set it.
    fn new_fact(&self) -> Self::Fact;

    fn facts(&self) -> &FactTable<Self::Fact>;

    fn facts_mut(&mut self) -> &mut FactTable<Self::Fact>;

    /// Applies the transfer function to `quad`, reading `in` and writing `out` when forward, the
    /// other way round when backward.
    fn process_quad(&mut self, quad: &Quad);

    fn postprocess(&mut self, cfg: &ControlFlowGraph) -> Result<()>;

    fn top(&self) -> Self::Fact {
        let mut fact = self.new_fact();
        fact.set_to_top();
        fact
    }

    fn get_in(&self, quad: QuadId) -> Self::Fact {
        debug_assert!(
            self.facts().in_fact(quad).is_some(),
            "no fact slot for quad {}",
            quad
        );
        self.facts()
            .in_fact(quad)
            .cloned()
            .unwrap_or_else(|| self.top())
    }

    fn get_out(&self, quad: QuadId) -> Self::Fact {
        debug_assert!(
            self.facts().out_fact(quad).is_some(),
            "no fact slot for quad {}",
            quad
        );
        self.facts()
            .out_fact(quad)
            .cloned()
            .unwrap_or_else(|| self.top())
    }

    fn get_entry(&self) -> Self::Fact {
        debug_assert!(self.facts().entry().is_some(), "fact table not allocated");
        self.facts().entry().cloned().unwrap_or_else(|| self.top())
    }

    fn get_exit(&self) -> Self::Fact {
        debug_assert!(self.facts().exit().is_some(), "fact table not allocated");
        self.facts().exit().cloned().unwrap_or_else(|| self.top())
    }

    fn set_in(&mut self, quad: QuadId, value: &Self::Fact) {
        self.facts_mut().set_in(quad, value);
    }

    fn set_out(&mut self, quad: QuadId, value: &Self::Fact) {
        self.facts_mut().set_out(quad, value);
    }

    fn set_entry(&mut self, value: &Self::Fact) {
        self.facts_mut().set_entry(value);
    }

    fn set_exit(&mut self, value: &Self::Fact) {
        self.facts_mut().set_exit(value);
    }
}
