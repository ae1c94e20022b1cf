/*! Quad IR, control-flow graphs and iterative dataflow analysis.
 *
 * A method is a graph of basic blocks holding quads. Analyses attach one lattice fact before and
 * after every quad and a solver sweeps the graph until nothing changes. Reaching definitions,
 * liveness, faintness and redundant null checks are built on the same machinery.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod cfg;
pub mod quad;
pub mod transform;

pub use analysis::{
    Analysis, DataflowFact, DefSet, FactRow, FactTable, Faintness, FlowReport, FlowSolver,
    Liveness, MeetPolicy, NullCheckAnalysis, NullCheckReport, ReachingDefs, SetFact, SolveStats,
    VarSet,
};
pub use block::{BasicBlock, BlockId};
pub use builder::CfgBuilder;
pub use cfg::{ControlFlowGraph, MethodInfo, QuadEdges};
pub use quad::{
    BinaryOp, Condition, Constant, Operand, Operator, Quad, QuadId, QuadKind, Register, UnaryOp,
};
pub use transform::{materialize_null_checks, MaterializeStats};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Malformed CFG: {0}")]
    MalformedCfg(String),
    #[error("No null-check quad to use as a template in method {method}")]
    MissingNullCheckTemplate { method: String },
    #[error("Unknown quad: {0}")]
    UnknownQuad(QuadId),
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
}

pub type Result<T> = std::result::Result<T, FlowError>;
