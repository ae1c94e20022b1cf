//! Graphs assembled block by block through `ControlFlowGraph`, without `CfgBuilder`.

use pretty_assertions::assert_eq;
use quadflow_core::{
    Analysis, BlockId, Condition, ControlFlowGraph, FlowSolver, MethodInfo, NullCheckAnalysis,
    Operand, Quad, QuadId, QuadKind, ReachingDefs, Register,
};

/// `if (R0 == null) return; check R0; T1 = R0.next; return T1`, quads numbered by hand.
fn hand_built() -> ControlFlowGraph {
    let mut method = MethodInfo::new("direct");
    method.params.push(Register::new("R0"));
    let mut cfg = ControlFlowGraph::new(method);

    let head = cfg.create_block();
    let body = cfg.create_block();
    let bail = cfg.create_block();

    let quads = [
        (
            head,
            QuadKind::IfCmp {
                lhs: Operand::reg("R0"),
                rhs: Operand::null(),
                cond: Condition::Eq,
                target: bail,
            },
        ),
        (
            body,
            QuadKind::NullCheck {
                guard: None,
                checked: "R0".into(),
            },
        ),
        (
            body,
            QuadKind::GetField {
                dst: "T1".into(),
                base: Operand::reg("R0"),
                field: "next".to_string(),
            },
        ),
        (
            body,
            QuadKind::Return {
                value: Some(Operand::reg("T1")),
            },
        ),
        (bail, QuadKind::Return { value: None }),
    ];
    for (n, (block, kind)) in quads.into_iter().enumerate() {
        cfg.block_mut(block)
            .unwrap()
            .add_quad(Quad::new(QuadId(n as u32 + 1), kind));
    }

    cfg.add_edge(BlockId::ENTRY, head).unwrap();
    cfg.add_edge(head, body).unwrap();
    cfg.add_edge(head, bail).unwrap();
    cfg.add_edge(body, BlockId::EXIT).unwrap();
    cfg.add_edge(bail, BlockId::EXIT).unwrap();
    cfg
}

#[test]
fn test_hand_built_graph_reports_its_quads() {
    let cfg = hand_built();
    assert_eq!(cfg.max_quad_id(), QuadId(5));
    assert_eq!(cfg.quads().count(), 5);
}

#[test]
fn test_reaching_defs_on_hand_built_graph() {
    let mut cfg = hand_built();
    let (rd, stats) = FlowSolver::run(ReachingDefs::new(), &mut cfg).unwrap();

    assert_eq!(stats.quads, 5);
    assert_eq!(rd.get_in(QuadId(4)).to_string(), "[3]");
    assert_eq!(rd.get_in(QuadId(5)).to_string(), "[]");
    assert_eq!(rd.get_exit().to_string(), "[3]");
}

#[test]
fn test_materialized_check_gets_an_unused_id() {
    let mut cfg = hand_built();
    let analysis = NullCheckAnalysis::new().with_materialization(true);
    let (nc, _) = FlowSolver::run(analysis, &mut cfg).unwrap();

    assert_eq!(nc.report().unwrap().to_string(), "direct 2");

    let inserted = cfg.block(BlockId(5)).unwrap();
    assert_eq!(inserted.quads.len(), 1);
    assert_eq!(inserted.quads[0].id, QuadId(6));
    assert_eq!(cfg.locate(QuadId(1)).unwrap(), (BlockId(2), 0));
    assert_eq!(cfg.max_quad_id(), QuadId(6));
}
