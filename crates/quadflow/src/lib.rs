/*! Dataflow analysis over quad CFGs, in one import.
 *
 * Build a method with `CfgBuilder`, hand an analysis to `FlowSolver`, and write the resulting report
 * with a `ReportEmitter`.
 */

pub use quadflow_core as core;
pub use quadflow_emit as emit;

pub use quadflow_core::{
    materialize_null_checks, Analysis, BlockId, CfgBuilder, ControlFlowGraph, Faintness,
    FlowError, FlowReport, FlowSolver, Liveness, NullCheckAnalysis, NullCheckReport, Quad,
    QuadId, QuadKind, ReachingDefs, Register, Result, SolveStats,
};

pub use quadflow_emit::{Emitter, EmitterConfig, OutputFormat, ReportEmitter};
