use crate::block::BlockId;
use crate::cfg::ControlFlowGraph;
use crate::quad::{Condition, Operator, Quad, QuadId, QuadKind, Register};
use crate::{FlowError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeStats {
    /// Compare-to-null branches found.
    pub sites: usize,
    /// Null-check blocks inserted.
    pub inserted: usize,
    /// Sites left alone: conditions other than `==`/`!=`, or both edges to the same block.
    pub skipped: usize,
}

/// One `if v == null` / `if v != null` branch and the edge on which `v` is known non-null.
#[derive(Debug)]
struct RewriteSite {
    from: BlockId,
    branch: QuadId,
    checked: Register,
    non_null: BlockId,
    retarget: bool,
}

/// Puts an explicit null check of `v` on the non-null edge of every branch comparing `v` to null.
///
/// The inserted quads are clones of the method's first null check with `v` substituted, so the
/// method must already contain one when any such branch exists.
pub fn materialize_null_checks(cfg: &mut ControlFlowGraph) -> Result<MaterializeStats> {
    let mut stats = MaterializeStats::default();
    let sites = collect_sites(cfg, &mut stats);
    if sites.is_empty() {
        return Ok(stats);
    }

    let template = cfg
        .quads()
        .find(|quad| quad.operator() == Operator::NullCheck)
        .map(|quad| quad.kind.clone())
        .ok_or_else(|| FlowError::MissingNullCheckTemplate {
            method: cfg.name().to_string(),
        })?;

    for site in sites {
        insert_check(cfg, &template, site)?;
        stats.inserted += 1;
    }

    debug!(
        method = cfg.name(),
        sites = stats.sites,
        inserted = stats.inserted,
        skipped = stats.skipped,
        "materialized null checks"
    );
    Ok(stats)
}

fn collect_sites(cfg: &ControlFlowGraph, stats: &mut MaterializeStats) -> Vec<RewriteSite> {
    let mut sites = Vec::new();

    for block in cfg.block_order().into_iter().filter_map(|id| cfg.block(id)) {
        for quad in &block.quads {
            let Some((reg, cond)) = quad.compares_to_null() else {
                continue;
            };
            stats.sites += 1;

            let site = match (block.fallthrough_successor(), quad.branch_target()) {
                (Some(fallthrough), Some(target)) => match cond {
                    Condition::Eq => Some((fallthrough, false)),
                    Condition::Ne => Some((target, true)),
                    _ => None,
                },
                _ => None,
            };

            match site {
                Some((non_null, retarget)) => sites.push(RewriteSite {
                    from: block.id,
                    branch: quad.id,
                    checked: reg.clone(),
                    non_null,
                    retarget,
                }),
                None => {
                    stats.skipped += 1;
                    debug!(quad = %quad, block = %block.id, "skipping null comparison");
                }
            }
        }
    }

    sites
}

fn insert_check(cfg: &mut ControlFlowGraph, template: &QuadKind, site: RewriteSite) -> Result<()> {
    let mut kind = template.clone();
    if let QuadKind::NullCheck { checked, .. } = &mut kind {
        *checked = site.checked.clone();
    }
    let check = Quad::new(cfg.new_quad_id(), kind);
    let check_id = check.id;

    let block = cfg.create_block();
    {
        let new_block = cfg.block_mut(block)?;
        new_block.add_quad(check);
        new_block.add_predecessor(site.from);
        new_block.add_successor(site.non_null);
    }

    let from = cfg.block_mut(site.from)?;
    from.replace_successor(site.non_null, block);
    if site.retarget {
        if let Some(branch) = from.last_quad_mut() {
            branch.set_branch_target(block);
        }
    }
    cfg.block_mut(site.non_null)?
        .replace_predecessor(site.from, block);

    debug!(
        branch = %site.branch,
        check = %check_id,
        register = %site.checked,
        block = %block,
        "inserted null check"
    );
    Ok(())
}
