//! Best-fit selection for one slot window. Three passes with strict
//! tie-breaks: a singleton with an exact capacity match, then the first
//! singleton with enough capacity in `(sequence, id)` order, then greedy
//! combinations over combinability edges ranked by size, waste, and
//! max-sequence.

use ulid::Ulid;

use crate::graph::ResourceGraph;
use crate::model::Span;

use super::EngineError;
use super::capacity::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Perfect,
    Sufficient,
    Combination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected resources, sorted `(sequence asc, id asc)`.
    pub resources: Vec<Ulid>,
    pub kind: SelectionKind,
}

struct Combo {
    members: Vec<Ulid>,
    waste: u32,
    max_sequence: u32,
}

/// Pick the resource(s) covering `requested` units in `window`, or None
/// when the pool cannot. Never errors on an unviable slot — only on
/// invalid input.
pub fn select(
    snapshot: &Snapshot,
    graph: &ResourceGraph,
    pool: &[Ulid],
    window: &Span,
    requested: u32,
) -> Result<Option<Selection>, EngineError> {
    if requested == 0 {
        return Err(EngineError::InvalidRequest(
            "requested capacity must be at least 1",
        ));
    }
    let mut ordered: Vec<Ulid> = pool
        .iter()
        .filter(|id| snapshot.contains(id))
        .copied()
        .collect();
    if ordered.is_empty() {
        return Err(EngineError::InvalidRequest("empty candidate pool"));
    }
    ordered.sort_by_key(|id| snapshot.get(id).expect("pool filtered").resource.sort_key());
    ordered.dedup();

    let remaining: Vec<(Ulid, u32)> = ordered
        .iter()
        .map(|id| (*id, snapshot.remaining_self(id, window)))
        .collect();

    // Pass 1: first singleton whose remaining capacity matches exactly.
    for &(id, rem) in &remaining {
        if rem == requested {
            return Ok(Some(Selection {
                resources: vec![id],
                kind: SelectionKind::Perfect,
            }));
        }
    }

    // Pass 2: first singleton with enough capacity. Smallest sequence wins,
    // not smallest surplus.
    for &(id, rem) in &remaining {
        if rem >= requested {
            return Ok(Some(Selection {
                resources: vec![id],
                kind: SelectionKind::Sufficient,
            }));
        }
    }

    // Pass 3: one greedy candidate per anchor, accumulating the anchor's
    // closed neighborhood (restricted to the pool) in `(sequence, id)`
    // order. A resource with nothing left can neither anchor nor join.
    let mut best: Option<Combo> = None;
    for &(anchor, anchor_rem) in &remaining {
        if anchor_rem == 0 {
            continue;
        }
        let hood = graph.closed_neighborhood(anchor);
        let mut acc = anchor_rem;
        let mut members = vec![anchor];
        for &(id, rem) in &remaining {
            if acc >= requested {
                break;
            }
            if id == anchor || rem == 0 || !hood.contains(&id) {
                continue;
            }
            acc += rem;
            members.push(id);
        }
        if acc < requested {
            continue;
        }
        let waste = acc - requested;
        let max_sequence = members
            .iter()
            .map(|id| snapshot.get(id).expect("member from pool").resource.sequence)
            .max()
            .unwrap_or(0);
        let better = match &best {
            None => true,
            Some(b) => {
                (members.len(), waste, max_sequence) < (b.members.len(), b.waste, b.max_sequence)
            }
        };
        if better {
            best = Some(Combo { members, waste, max_sequence });
        }
    }

    Ok(best.map(|b| {
        let mut resources = b.members;
        resources.sort_by_key(|id| snapshot.get(id).expect("member from pool").resource.sort_key());
        Selection { resources, kind: SelectionKind::Combination }
    }))
}
