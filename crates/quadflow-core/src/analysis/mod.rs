/*! Iterative dataflow analysis over quad CFGs.
 *
 * An analysis owns a universe and a table of set facts, one `in` and one `out` per quad. The solver
 * sweeps the whole method until a sweep changes nothing, then lets the analysis turn its facts into a
 * report. Reaching definitions, liveness, faint registers and redundant null checks all share this
 * machinery and differ only in direction, meet and transfer function.
 */

pub mod faintness;
pub mod flow;
pub mod lattice;
pub mod liveness;
pub mod null_check;
pub mod reaching_defs;
pub mod report;
pub mod solver;

pub use faintness::Faintness;
pub use flow::{Analysis, FactTable};
pub use lattice::{DataflowFact, DefSet, MeetPolicy, SetFact, VarSet};
pub use liveness::Liveness;
pub use null_check::NullCheckAnalysis;
pub use reaching_defs::ReachingDefs;
pub use report::{FactRow, FlowReport, NullCheckReport};
pub use solver::{FlowSolver, SolveStats};
