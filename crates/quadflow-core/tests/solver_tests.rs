use pretty_assertions::assert_eq;
use quadflow_core::{
    Analysis, BinaryOp, BlockId, CfgBuilder, Condition, ControlFlowGraph, Faintness, FlowSolver,
    Liveness, NullCheckAnalysis, Operand, QuadId, QuadKind, ReachingDefs, SolveStats,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn zero(var: &str) -> QuadKind {
    QuadKind::Move {
        dst: var.into(),
        src: Operand::int(0),
    }
}

fn increment(var: &str) -> QuadKind {
    QuadKind::Binary {
        op: BinaryOp::Add,
        dst: var.into(),
        lhs: Operand::reg(var),
        rhs: Operand::int(1),
    }
}

fn exit_when_ten(var: &str, target: BlockId) -> QuadKind {
    QuadKind::IfCmp {
        lhs: Operand::reg(var),
        rhs: Operand::int(10),
        cond: Condition::Eq,
        target,
    }
}

/// Three nested counting loops over `i`, `j` and `k`; returns `i`.
fn nested_loops() -> ControlFlowGraph {
    let mut b = CfgBuilder::new("nested");
    let init_i = b.block();
    let head_i = b.block();
    let init_j = b.block();
    let head_j = b.block();
    let init_k = b.block();
    let head_k = b.block();
    let body_k = b.block();
    let latch_j = b.block();
    let latch_i = b.block();
    let done = b.block();

    b.push(init_i, zero("i")); // 1
    b.push(head_i, exit_when_ten("i", done)); // 2
    b.push(init_j, zero("j")); // 3
    b.push(head_j, exit_when_ten("j", latch_i)); // 4
    b.push(init_k, zero("k")); // 5
    b.push(head_k, exit_when_ten("k", latch_j)); // 6
    b.push(body_k, increment("k")); // 7
    b.push(body_k, QuadKind::Goto { target: head_k }); // 8
    b.push(latch_j, increment("j")); // 9
    b.push(latch_j, QuadKind::Goto { target: head_j }); // 10
    b.push(latch_i, increment("i")); // 11
    b.push(latch_i, QuadKind::Goto { target: head_i }); // 12
    b.push(
        done,
        QuadKind::Return {
            value: Some(Operand::reg("i")),
        },
    ); // 13

    b.edge(BlockId::ENTRY, init_i)
        .edge(init_i, head_i)
        .edge(head_i, init_j)
        .edge(head_i, done)
        .edge(init_j, head_j)
        .edge(head_j, init_k)
        .edge(head_j, latch_i)
        .edge(init_k, head_k)
        .edge(head_k, body_k)
        .edge(head_k, latch_j)
        .edge(body_k, head_k)
        .edge(latch_j, head_j)
        .edge(latch_i, head_i)
        .edge(done, BlockId::EXIT);
    b.build().unwrap()
}

fn assert_bounded(stats: SolveStats) {
    assert_eq!(stats.quads, 13);
    assert!(stats.sweeps >= 2, "needs a confirming sweep: {:?}", stats);
    assert!(stats.sweeps <= stats.quads + 2, "too many sweeps: {:?}", stats);
}

#[test]
fn test_nested_loops_terminate_for_every_analysis() {
    init_tracing();

    let (rd, stats) = FlowSolver::run(ReachingDefs::new(), &mut nested_loops()).unwrap();
    assert_bounded(stats);
    assert_eq!(rd.get_in(QuadId(13)).to_string(), "[1, 3, 5, 7, 9, 11]");
    assert_eq!(rd.get_in(QuadId(6)).to_string(), "[1, 3, 5, 7, 9, 11]");
    assert_eq!(rd.get_in(QuadId(4)).to_string(), "[1, 3, 5, 7, 9, 11]");

    let (live, stats) = FlowSolver::run(Liveness::new(), &mut nested_loops()).unwrap();
    assert_bounded(stats);
    assert_eq!(live.get_entry().to_string(), "[]");
    assert_eq!(live.get_in(QuadId(6)).to_string(), "[i, j, k]");

    let (faint, stats) = FlowSolver::run(Faintness::new(), &mut nested_loops()).unwrap();
    assert_bounded(stats);
    assert_eq!(faint.get_entry().to_string(), "[i, j, k]");
    assert_eq!(faint.get_in(QuadId(13)).to_string(), "[j, k]");

    let (nc, stats) = FlowSolver::run(NullCheckAnalysis::new(), &mut nested_loops()).unwrap();
    assert_bounded(stats);
    assert_eq!(nc.redundant_checks().count(), 0);
    assert_eq!(nc.report().unwrap().to_string(), "nested");
}

#[test]
fn test_visit_cfg_reuses_solver() {
    let mut solver = FlowSolver::new(ReachingDefs::new());
    let first = solver.visit_cfg(&mut nested_loops()).unwrap();
    let second = solver.visit_cfg(&mut nested_loops()).unwrap();
    assert_eq!(first, second);

    let previous = solver.register_analysis(ReachingDefs::new());
    assert!(previous.report().is_some());
    assert!(solver.analysis().report().is_none());
}
