//! Single-line update detection.
//!
//! Per hunk, every (removed, inserted) cross pair passing the weighted
//! content+context similarity becomes a node. Two nodes conflict when
//! their line pairings cross; the node with the most conflicts (ties
//! broken by highest cost) is evicted until the set is conflict-free.

use crate::candidates::Candidate;
use crate::line_index::Hunk;
use crate::similarity::{weighted_line_sim, BlockMode};
use crate::BdiffOptions;

struct Node {
    src: usize,
    dest: usize,
    /// 1 - synthetic similarity.
    cost: f64,
    conflicts: Vec<usize>,
}

/// Enumerate single-line update candidates across all hunks.
pub(crate) fn find_update_candidates(
    src_all: &[&str],
    dest_all: &[&str],
    hunks: &[Hunk],
    opts: &BdiffOptions,
) -> Vec<Candidate> {
    let mut out = Vec::new();

    for hunk in hunks {
        if hunk.src.is_empty() || hunk.dest.is_empty() {
            continue;
        }

        let mut nodes: Vec<Node> = Vec::new();
        for &r_line in &hunk.src {
            for &i_line in &hunk.dest {
                let (accepted, sim) = weighted_line_sim(r_line, i_line, src_all, dest_all, opts);
                if accepted {
                    nodes.push(Node {
                        src: r_line,
                        dest: i_line,
                        cost: 1.0 - sim,
                        conflicts: Vec::new(),
                    });
                }
            }
        }

        for a in 0..nodes.len() {
            for b in 0..nodes.len() {
                if a == b {
                    continue;
                }
                let dr = nodes[b].src as i64 - nodes[a].src as i64;
                let di = nodes[b].dest as i64 - nodes[a].dest as i64;
                if dr * di < 0 {
                    nodes[a].conflicts.push(b);
                }
            }
        }

        // Evict the most-conflicted node (ties: highest cost) until the
        // remaining pairings are non-crossing.
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        sort_by_conflicts(&mut order, &nodes);
        while !order.is_empty() {
            let last = *order.last().expect("order is non-empty");
            if !nodes[last].conflicts.is_empty() {
                order.pop();
                for node in &mut nodes {
                    node.conflicts.retain(|&c| c != last);
                }
            }
            if order.iter().all(|&id| nodes[id].conflicts.is_empty()) {
                break;
            }
            sort_by_conflicts(&mut order, &nodes);
        }

        order.sort_by_key(|&id| nodes[id].src);
        for &id in &order {
            let node = &nodes[id];
            out.push(Candidate {
                mode: BlockMode::Update,
                src_start: node.src,
                dest_start: node.dest,
                block_length: 1,
                indent_diff: 0,
                move_type: None,
                updates: Vec::new(),
                context_similarity: None,
                relative_distance: 0.0,
                edit_actions: 1,
                weight: 1.0 + node.cost / 10.0,
            });
        }
    }

    out
}

fn sort_by_conflicts(order: &mut [usize], nodes: &[Node]) {
    order.sort_by(|&a, &b| {
        nodes[a]
            .conflicts
            .len()
            .cmp(&nodes[b].conflicts.len())
            .then(nodes[a].cost.total_cmp(&nodes[b].cost))
    });
}
