//! Candidate assignment and conflict slicing.
//!
//! Source-overlapping candidates share an assignment row (pure copies
//! never do: a copy does not consume its source) and
//! destination-overlapping candidates share a column. Kuhn-Munkres picks
//! one minimum-cost cell per row/column pair; in each assigned cell the
//! minimum-weight candidate wins. Losers overlapping a winner are sliced
//! into residual blocks that re-enter the next round, until no residual
//! survives.

use crate::candidates::{block_weight, Candidate};
use crate::hungarian::{self, CostMatrix};
use crate::similarity::{context_similarity, pure_block_len, BlockMode};
use crate::{BdiffOptions, MoveType};

/// Sentinel cost for cells with no candidate.
const NO_CANDIDATE_COST: f64 = 1000.0;

/// Lifecycle of a candidate during one assignment round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandState {
    Unassigned,
    Assigned,
    Deleted,
    Sliced,
}

/// A candidate queued for (re-)assignment, carrying the state it left
/// the previous round with (used only for duplicate elimination).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pending {
    pub cand: Candidate,
    pub state: CandState,
}

impl Pending {
    pub fn fresh(cand: Candidate) -> Self {
        Self {
            cand,
            state: CandState::Unassigned,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    cand: Candidate,
    row: usize,
    col: usize,
    state: CandState,
}

/// Overlap relation of a winner's range against a loser's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    /// Identical ranges.
    Equal,
    /// The winner lies inside the loser.
    Cover,
    /// The loser lies inside the winner.
    Inner,
    /// The loser starts before the winner and overlaps its head.
    Up,
    /// The loser extends past the winner's tail.
    Down,
}

fn judge_overlap(
    assigned_start: usize,
    assigned_len: usize,
    other_start: usize,
    other_len: usize,
) -> Option<Overlap> {
    let assigned_end = assigned_start + assigned_len;
    let other_end = other_start + other_len;
    if assigned_start == other_start && assigned_len == other_len {
        Some(Overlap::Equal)
    } else if assigned_start >= other_start && assigned_end <= other_end {
        Some(Overlap::Cover)
    } else if assigned_start <= other_start && assigned_end >= other_end {
        Some(Overlap::Inner)
    } else if other_start <= assigned_start && assigned_start <= other_end - 1 {
        Some(Overlap::Up)
    } else if assigned_start <= other_start && other_start <= assigned_end - 1 {
        Some(Overlap::Down)
    } else {
        None
    }
}

fn ranges_overlap(a_start: usize, a_len: usize, b_start: usize, b_len: usize) -> bool {
    !(a_start + a_len - 1 < b_start || a_start > b_start + b_len - 1)
}

/// Run one assignment round. Returns the winning candidates and the
/// residual set to feed into the next round.
pub(crate) fn assign_round(
    pending: Vec<Pending>,
    src_all: &[&str],
    dest_all: &[&str],
    opts: &BdiffOptions,
) -> (Vec<Candidate>, Vec<Pending>) {
    // Duplicate candidates (same fields and carried state) collapse to
    // their first occurrence.
    let mut deduped: Vec<Pending> = Vec::new();
    for p in pending {
        if !deduped.contains(&p) {
            deduped.push(p);
        }
    }

    let mut slots: Vec<Slot> = deduped
        .into_iter()
        .map(|p| Slot {
            cand: p.cand,
            row: usize::MAX,
            col: usize::MAX,
            state: CandState::Unassigned,
        })
        .collect();

    // Row grouping over source ranges (pure copies stay solo).
    slots.sort_by_key(|s| s.cand.src_start);
    let mut row_groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..slots.len() {
        let mut joined = None;
        'groups: for (gi, group) in row_groups.iter().enumerate() {
            for &j in group {
                let a = &slots[i].cand;
                let b = &slots[j].cand;
                if ranges_overlap(a.src_start, a.block_length, b.src_start, b.block_length)
                    && a.mode != BlockMode::Copy
                    && b.mode != BlockMode::Copy
                {
                    joined = Some((gi, slots[j].row));
                    break 'groups;
                }
            }
        }
        match joined {
            Some((gi, row)) => {
                slots[i].row = row;
                row_groups[gi].push(i);
            }
            None => {
                slots[i].row = row_groups.len();
                row_groups.push(vec![i]);
            }
        }
    }
    let row_count = row_groups.len();

    // Column grouping over destination ranges.
    slots.sort_by_key(|s| s.cand.dest_start);
    let mut col_groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..slots.len() {
        let mut joined = None;
        'groups: for (gi, group) in col_groups.iter().enumerate() {
            for &j in group {
                let a = &slots[i].cand;
                let b = &slots[j].cand;
                if ranges_overlap(a.dest_start, a.block_length, b.dest_start, b.block_length) {
                    joined = Some((gi, slots[j].col));
                    break 'groups;
                }
            }
        }
        match joined {
            Some((gi, col)) => {
                slots[i].col = col;
                col_groups[gi].push(i);
            }
            None => {
                slots[i].col = col_groups.len();
                col_groups.push(vec![i]);
            }
        }
    }
    let col_count = col_groups.len();

    let mut matrix = CostMatrix::new(row_count, col_count, NO_CANDIDATE_COST);
    for slot in &slots {
        matrix.minimize(slot.row, slot.col, slot.cand.weight);
    }
    let assignments = hungarian::solve(&matrix);

    let mut match_indices: Vec<usize> = Vec::new();
    let mut remain: Vec<Slot> = Vec::new();

    for &(arow, acol) in &assignments {
        // The cell's minimum-weight unassigned candidate wins; a sentinel
        // cell selects nothing.
        let mut best_weight = (src_all.len() * 2) as f64;
        let mut winner = None;
        for (i, slot) in slots.iter().enumerate() {
            if slot.state == CandState::Unassigned
                && slot.row == arow
                && slot.col == acol
                && slot.cand.weight < best_weight
            {
                winner = Some(i);
                best_weight = slot.cand.weight;
            }
        }
        let Some(widx) = winner else { continue };
        slots[widx].state = CandState::Assigned;
        match_indices.push(widx);
        let win = slots[widx].cand.clone();

        for i in 0..slots.len() {
            if slots[i].state != CandState::Unassigned {
                continue;
            }
            if slots[i].row == arow && slots[i].col == acol && slots[i].cand.mode != BlockMode::Update
            {
                continue;
            }
            if slots[i].row != arow {
                continue;
            }

            let loser = slots[i].cand.clone();
            match judge_overlap(
                win.src_start,
                win.block_length,
                loser.src_start,
                loser.block_length,
            ) {
                Some(Overlap::Equal) | Some(Overlap::Inner) => {
                    slots[i].state = CandState::Deleted;
                }
                None => {
                    slots[i].state = CandState::Sliced;
                    remain.push(Slot {
                        cand: loser,
                        row: slots[i].row,
                        col: slots[i].col,
                        state: CandState::Sliced,
                    });
                }
                Some(Overlap::Cover) => {
                    slots[i].state = CandState::Sliced;
                    let up_len = win.src_start - loser.src_start;
                    push_residual(
                        &mut remain,
                        &slots[i],
                        make_src_residual(
                            &loser,
                            loser.src_start,
                            loser.dest_start,
                            up_len,
                            loser.src_start,
                            win.src_start,
                            src_all,
                            dest_all,
                            opts,
                        ),
                    );
                    let win_end = win.src_start + win.block_length;
                    let down_len = loser.src_start + loser.block_length - win_end;
                    push_residual(
                        &mut remain,
                        &slots[i],
                        make_src_residual(
                            &loser,
                            win_end,
                            loser.dest_start + (win_end - loser.src_start),
                            down_len,
                            win_end,
                            win_end + down_len,
                            src_all,
                            dest_all,
                            opts,
                        ),
                    );
                }
                Some(Overlap::Up) => {
                    slots[i].state = CandState::Sliced;
                    let up_len = win.src_start - loser.src_start;
                    push_residual(
                        &mut remain,
                        &slots[i],
                        make_src_residual(
                            &loser,
                            loser.src_start,
                            loser.dest_start,
                            up_len,
                            loser.src_start,
                            win.src_start,
                            src_all,
                            dest_all,
                            opts,
                        ),
                    );
                }
                Some(Overlap::Down) => {
                    slots[i].state = CandState::Sliced;
                    let win_end = win.src_start + win.block_length;
                    let down_len = loser.src_start + loser.block_length - win_end;
                    push_residual(
                        &mut remain,
                        &slots[i],
                        make_src_residual(
                            &loser,
                            win_end,
                            loser.dest_start + (win_end - loser.src_start),
                            down_len,
                            win_end,
                            win_end + down_len,
                            src_all,
                            dest_all,
                            opts,
                        ),
                    );
                }
            }
        }
    }

    // Candidates left untouched in an assigned column survive to the
    // destination-side pass.
    for &(_, acol) in &assignments {
        for slot in &slots {
            let keepable = match slot.cand.mode {
                BlockMode::Copy => slot.cand.block_length >= opts.min_copy_block_length,
                BlockMode::Move | BlockMode::Update => true,
            };
            if slot.state == CandState::Unassigned && slot.col == acol && keepable {
                let duplicate = remain.iter().any(|r| {
                    r.cand == slot.cand
                        && r.state == slot.state
                        && r.row == slot.row
                        && r.col == slot.col
                });
                if !duplicate {
                    remain.push(slot.clone());
                }
            }
        }
    }

    // Destination-side pass: slice survivors against the winners that
    // share their column.
    let mut final_remain: Vec<Pending> = Vec::new();
    for rm in &remain {
        for &widx in &match_indices {
            let win_slot = &slots[widx];
            let win = &win_slot.cand;
            if rm.state == CandState::Deleted || rm.col != win_slot.col {
                continue;
            }
            if !(rm.row != win_slot.row
                || (win.mode == BlockMode::Update && rm.cand.mode == BlockMode::Update))
            {
                continue;
            }

            match judge_overlap(
                win.dest_start,
                win.block_length,
                rm.cand.dest_start,
                rm.cand.block_length,
            ) {
                Some(Overlap::Equal) | Some(Overlap::Inner) => continue,
                None => final_remain.push(Pending {
                    cand: rm.cand.clone(),
                    state: rm.state,
                }),
                Some(Overlap::Cover) => {
                    let up_len = win.dest_start - rm.cand.dest_start;
                    if let Some(res) = make_dest_residual(
                        &rm.cand,
                        rm.cand.src_start,
                        rm.cand.dest_start,
                        up_len,
                        rm.cand.dest_start,
                        win.dest_start,
                        src_all,
                        dest_all,
                        opts,
                    ) {
                        final_remain.push(Pending::fresh(res));
                    }
                    let win_end = win.dest_start + win.block_length;
                    let down_len = rm.cand.dest_start + rm.cand.block_length - win_end;
                    if let Some(res) = make_dest_residual(
                        &rm.cand,
                        rm.cand.src_start + (win_end - rm.cand.dest_start),
                        win_end,
                        down_len,
                        win_end,
                        win_end + down_len,
                        src_all,
                        dest_all,
                        opts,
                    ) {
                        final_remain.push(Pending::fresh(res));
                    }
                }
                Some(Overlap::Up) => {
                    let up_len = win.dest_start - rm.cand.dest_start;
                    if let Some(res) = make_dest_residual(
                        &rm.cand,
                        rm.cand.src_start,
                        rm.cand.dest_start,
                        up_len,
                        rm.cand.dest_start,
                        win.dest_start,
                        src_all,
                        dest_all,
                        opts,
                    ) {
                        final_remain.push(Pending::fresh(res));
                    }
                }
                Some(Overlap::Down) => {
                    let win_end = win.dest_start + win.block_length;
                    let down_len = rm.cand.dest_start + rm.cand.block_length - win_end;
                    if let Some(res) = make_dest_residual(
                        &rm.cand,
                        rm.cand.src_start + (win_end - rm.cand.dest_start),
                        win_end,
                        down_len,
                        win_end,
                        win_end + down_len,
                        src_all,
                        dest_all,
                        opts,
                    ) {
                        final_remain.push(Pending::fresh(res));
                    }
                }
            }
        }
    }

    let matches = match_indices
        .into_iter()
        .map(|i| slots[i].cand.clone())
        .collect();
    (matches, final_remain)
}

fn push_residual(remain: &mut Vec<Slot>, loser_slot: &Slot, residual: Option<Candidate>) {
    if let Some(cand) = residual {
        remain.push(Slot {
            cand,
            row: loser_slot.row,
            col: loser_slot.col,
            state: CandState::Unassigned,
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn make_src_residual(
    loser: &Candidate,
    src_start: usize,
    dest_start: usize,
    length: usize,
    update_lo: usize,
    update_hi: usize,
    src_all: &[&str],
    dest_all: &[&str],
    opts: &BdiffOptions,
) -> Option<Candidate> {
    make_residual(
        loser, src_start, dest_start, length, update_lo, update_hi, false, src_all, dest_all, opts,
    )
}

#[allow(clippy::too_many_arguments)]
fn make_dest_residual(
    loser: &Candidate,
    src_start: usize,
    dest_start: usize,
    length: usize,
    update_lo: usize,
    update_hi: usize,
    src_all: &[&str],
    dest_all: &[&str],
    opts: &BdiffOptions,
) -> Option<Candidate> {
    make_residual(
        loser, src_start, dest_start, length, update_lo, update_hi, true, src_all, dest_all, opts,
    )
}

/// Build the residual of a sliced loser, if its pure length clears the
/// threshold for its mode. The residual inherits indentation, move type
/// and relative distance; its edit-action count restarts from the mode
/// baseline (update 1, move 2, copy 3) plus the indent penalty plus the
/// inherited updates that fall inside the residual range.
#[allow(clippy::too_many_arguments)]
fn make_residual(
    loser: &Candidate,
    src_start: usize,
    dest_start: usize,
    length: usize,
    update_lo: usize,
    update_hi: usize,
    filter_dest_side: bool,
    src_all: &[&str],
    dest_all: &[&str],
    opts: &BdiffOptions,
) -> Option<Candidate> {
    if length == 0 {
        return None;
    }
    let pure = pure_block_len(
        length, src_start, src_all, dest_start, dest_all, loser.mode, opts,
    );
    let survives = match loser.mode {
        BlockMode::Move => pure >= opts.min_move_block_length,
        BlockMode::Copy => pure >= opts.min_copy_block_length,
        BlockMode::Update => false,
    };
    if !survives {
        return None;
    }

    let mut edit_actions: u32 = match loser.mode {
        BlockMode::Update => 1,
        BlockMode::Move => 2,
        BlockMode::Copy => 3,
    };
    if loser.indent_diff != 0
        && (loser.mode == BlockMode::Copy
            || (loser.mode == BlockMode::Move && loser.move_type != Some(MoveType::Horizontal)))
    {
        edit_actions += 1;
    }
    let updates: Vec<(usize, usize)> = loser
        .updates
        .iter()
        .filter(|&&(src, dest)| {
            let key = if filter_dest_side { dest } else { src };
            key >= update_lo && key < update_hi
        })
        .copied()
        .collect();
    edit_actions += updates.len() as u32;

    let ctx = context_similarity(src_start, dest_start, length, src_all, dest_all);
    Some(Candidate {
        mode: loser.mode,
        src_start,
        dest_start,
        block_length: length,
        indent_diff: loser.indent_diff,
        move_type: loser.move_type,
        updates,
        context_similarity: Some(ctx),
        relative_distance: loser.relative_distance,
        edit_actions,
        weight: block_weight(edit_actions, length, ctx, loser.relative_distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(mode: BlockMode, src: usize, dest: usize, len: usize, weight: f64) -> Candidate {
        Candidate {
            mode,
            src_start: src,
            dest_start: dest,
            block_length: len,
            indent_diff: 0,
            move_type: (mode == BlockMode::Move).then_some(MoveType::Down),
            updates: Vec::new(),
            context_similarity: Some(1.0),
            relative_distance: 0.0,
            edit_actions: 2,
            weight,
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line number {i} body")).collect()
    }

    #[test]
    fn overlap_classes() {
        assert_eq!(judge_overlap(3, 2, 3, 2), Some(Overlap::Equal));
        assert_eq!(judge_overlap(3, 2, 1, 6), Some(Overlap::Cover));
        assert_eq!(judge_overlap(1, 6, 3, 2), Some(Overlap::Inner));
        assert_eq!(judge_overlap(3, 4, 1, 4), Some(Overlap::Up));
        assert_eq!(judge_overlap(1, 4, 3, 4), Some(Overlap::Down));
        assert_eq!(judge_overlap(1, 2, 5, 2), None);
    }

    #[test]
    fn lighter_candidate_wins_cell() {
        let owned: Vec<String> = lines(20);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        let a = block(BlockMode::Move, 2, 5, 2, 1.1);
        let b = block(BlockMode::Move, 2, 5, 2, 2.3);
        let pending = vec![Pending::fresh(a.clone()), Pending::fresh(b)];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches, vec![a]);
        // The heavier same-cell loser contributes nothing further.
        assert!(remain.is_empty());
    }

    #[test]
    fn disjoint_rows_both_win() {
        let owned: Vec<String> = lines(30);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        let a = block(BlockMode::Move, 2, 10, 2, 1.2);
        let b = block(BlockMode::Move, 6, 20, 3, 1.4);
        let pending = vec![Pending::fresh(a.clone()), Pending::fresh(b.clone())];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches.len(), 2);
        assert!(matches.contains(&a) && matches.contains(&b));
        assert!(remain.is_empty());
    }

    #[test]
    fn covering_loser_is_sliced_into_tail() {
        let owned: Vec<String> = lines(30);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        // Winner and loser share a destination column; the loser's longer
        // destination range is sliced against the winner's, leaving the
        // tail (dest 14-17, mapped back to src 22-25) for the next round.
        let winner = block(BlockMode::Move, 5, 12, 2, 1.0);
        let loser = block(BlockMode::Move, 20, 12, 6, 2.0);
        let pending = vec![Pending::fresh(winner.clone()), Pending::fresh(loser)];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches, vec![winner]);
        assert_eq!(remain.len(), 1);
        let res = &remain[0].cand;
        assert_eq!(res.src_start, 22);
        assert_eq!(res.dest_start, 14);
        assert_eq!(res.block_length, 4);
        assert_eq!(res.edit_actions, 2);
    }

    #[test]
    fn residual_below_minimum_is_dropped() {
        let owned: Vec<String> = lines(30);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        // Loser spans 5-7, winner takes 5-6: the 1-line tail dies against
        // min_move_block_length = 2.
        let winner = block(BlockMode::Move, 5, 20, 2, 1.0);
        let loser = block(BlockMode::Move, 5, 12, 3, 2.0);
        let pending = vec![Pending::fresh(winner), Pending::fresh(loser)];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches.len(), 1);
        assert!(remain.is_empty());
    }

    #[test]
    fn copies_do_not_share_rows() {
        let owned: Vec<String> = lines(30);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        // Two copies of the same source to different destinations: both
        // may win because copies never consume the source.
        let a = block(BlockMode::Copy, 3, 10, 2, 1.5);
        let b = block(BlockMode::Copy, 3, 20, 2, 1.6);
        let pending = vec![Pending::fresh(a.clone()), Pending::fresh(b.clone())];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches.len(), 2);
        assert!(remain.is_empty());
    }

    #[test]
    fn duplicate_candidates_collapse() {
        let owned: Vec<String> = lines(20);
        let all: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
        let a = block(BlockMode::Move, 2, 5, 2, 1.1);
        let pending = vec![Pending::fresh(a.clone()), Pending::fresh(a.clone())];
        let (matches, remain) = assign_round(pending, &all, &all, &BdiffOptions::default());
        assert_eq!(matches, vec![a]);
        assert!(remain.is_empty());
    }
}
