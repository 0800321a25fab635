//! Myers diff algorithm implementation.
//!
//! Greedy shortest-edit-script search over the (old, new) edit graph,
//! after Myers' "An O(ND) Difference Algorithm and Its Variations"
//! (1986). Per edit cost the search records the furthest row reached on
//! each diagonal; backtracking over the per-cost snapshots recovers the
//! operation sequence, and a cursor walk turns it into indexed edits.

use super::{common_affixes, line_hash, push_all_deletes, push_all_inserts, Edit, EditOp};

/// Compute a diff using the Myers algorithm.
pub fn diff(old: &[&str], new: &[&str]) -> Vec<Edit> {
    if old.is_empty() && new.is_empty() {
        return Vec::new();
    }
    if old.is_empty() {
        let mut edits = Vec::with_capacity(new.len());
        push_all_inserts(&mut edits, new.len(), 0, 0);
        return edits;
    }
    if new.is_empty() {
        let mut edits = Vec::with_capacity(old.len());
        push_all_deletes(&mut edits, old.len(), 0, 0);
        return edits;
    }

    let (prefix_len, suffix_len) = common_affixes(old, new);
    let old_mid = &old[prefix_len..old.len() - suffix_len];
    let new_mid = &new[prefix_len..new.len() - suffix_len];

    let mut edits = Vec::with_capacity(old.len() + new.len());
    for i in 0..prefix_len {
        edits.push(Edit {
            op: EditOp::Equal,
            old_index: i,
            new_index: i,
        });
    }

    let ops = shortest_edit_ops(old_mid, new_mid);
    edits.extend(ops_to_edits(&ops, prefix_len, prefix_len));

    for i in 0..suffix_len {
        edits.push(Edit {
            op: EditOp::Equal,
            old_index: old.len() - suffix_len + i,
            new_index: new.len() - suffix_len + i,
        });
    }

    edits
}

/// Furthest-reaching row per diagonal of the edit graph. The diagonal
/// index `row - col` may be negative, so lookups are centered.
#[derive(Clone)]
struct Frontier {
    reach: Vec<usize>,
    center: isize,
}

impl Frontier {
    fn new(max_cost: usize) -> Self {
        Self {
            reach: vec![0; 2 * max_cost + 1],
            center: max_cost as isize,
        }
    }

    fn reach_on(&self, diag: isize) -> usize {
        self.reach[(self.center + diag) as usize]
    }

    fn advance(&mut self, diag: isize, row: usize) {
        self.reach[(self.center + diag) as usize] = row;
    }
}

/// True when the cheapest way onto `diag` at this cost comes from the
/// diagonal above, consuming a line of `new`. Updating diagonals in
/// place is sound: a cost level only reads the neighboring diagonals,
/// which belong to the previous level by parity.
fn enters_from_above(frontier: &Frontier, diag: isize, cost: isize) -> bool {
    diag == -cost || (diag != cost && frontier.reach_on(diag - 1) < frontier.reach_on(diag + 1))
}

/// Find the operation sequence of a shortest edit script.
fn shortest_edit_ops(old: &[&str], new: &[&str]) -> Vec<EditOp> {
    let n = old.len();
    let m = new.len();

    if n == 0 {
        return vec![EditOp::Insert; m];
    }
    if m == 0 {
        return vec![EditOp::Delete; n];
    }

    // Hash once so the diagonal run comparison is O(1) with a collision
    // re-check.
    let old_h: Vec<u64> = old.iter().map(|l| line_hash(l)).collect();
    let new_h: Vec<u64> = new.iter().map(|l| line_hash(l)).collect();

    let max_cost = n + m;
    let mut frontier = Frontier::new(max_cost);
    let mut snapshots: Vec<Frontier> = Vec::new();

    for cost in 0..=max_cost as isize {
        let mut diag = -cost;
        while diag <= cost {
            let mut row = if enters_from_above(&frontier, diag, cost) {
                frontier.reach_on(diag + 1)
            } else {
                frontier.reach_on(diag - 1) + 1
            };
            let mut col = (row as isize - diag) as usize;

            // Ride the free diagonal while the lines keep matching.
            while row < n && col < m && old_h[row] == new_h[col] && old[row] == new[col] {
                row += 1;
                col += 1;
            }

            frontier.advance(diag, row);

            if row >= n && col >= m {
                snapshots.push(frontier);
                return backtrack_ops(&snapshots, n, m);
            }

            diag += 2;
        }
        snapshots.push(frontier.clone());
    }

    // The all-delete/all-insert path costs exactly max_cost.
    unreachable!("edit path search exceeded its cost bound")
}

/// Recover the operation sequence from the per-cost snapshots, walking
/// from the bottom-right corner of the edit graph back to the origin.
fn backtrack_ops(snapshots: &[Frontier], n: usize, m: usize) -> Vec<EditOp> {
    let mut ops = Vec::with_capacity(n + m);
    let mut row = n;
    let mut col = m;

    for cost in (1..snapshots.len() as isize).rev() {
        let before = &snapshots[(cost - 1) as usize];
        let diag = row as isize - col as isize;
        let from_above = enters_from_above(before, diag, cost);
        let prev_diag = if from_above { diag + 1 } else { diag - 1 };
        let prev_row = before.reach_on(prev_diag);
        let prev_col = (prev_row as isize - prev_diag) as usize;

        while row > prev_row && col > prev_col {
            ops.push(EditOp::Equal);
            row -= 1;
            col -= 1;
        }
        if from_above {
            ops.push(EditOp::Insert);
            col -= 1;
        } else {
            ops.push(EditOp::Delete);
            row -= 1;
        }
    }

    // Whatever remains lies on the zero-cost diagonal.
    while row > 0 && col > 0 {
        ops.push(EditOp::Equal);
        row -= 1;
        col -= 1;
    }

    ops.reverse();
    ops
}

/// Materialize indexed edits from an operation sequence by walking a
/// cursor through each side.
fn ops_to_edits(ops: &[EditOp], old_offset: usize, new_offset: usize) -> Vec<Edit> {
    let mut edits = Vec::with_capacity(ops.len());
    let mut old_cursor = 0;
    let mut new_cursor = 0;
    for &op in ops {
        edits.push(Edit {
            op,
            old_index: old_offset + old_cursor,
            new_index: new_offset + new_cursor,
        });
        match op {
            EditOp::Equal => {
                old_cursor += 1;
                new_cursor += 1;
            }
            EditOp::Delete => old_cursor += 1,
            EditOp::Insert => new_cursor += 1,
        }
    }
    edits
}
