//! Move and copy candidate generation.
//!
//! Every (inserted, non-kept-source) line pair seeds a candidate block
//! that is greedily extended while content matches (optionally allowing
//! per-line updates at Levenshtein >= 0.6) and the indentation delta
//! stays constant. Blank destination lines are exempt from the indent
//! rule; blank-blank pairs retro-extend an accepted block upward.

use std::collections::{BTreeMap, HashSet};

use crate::line_index::{LineRecord, Origin, TraceTok};
use crate::similarity::{
    context_similarity, is_pure_punctuation, levenshtein_ratio, BlockMode,
};
use crate::{BdiffOptions, MoveType};

/// A candidate block competing in the assignment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub mode: BlockMode,
    pub src_start: usize,
    pub dest_start: usize,
    pub block_length: usize,
    /// dest indent minus src indent, constant across the block.
    pub indent_diff: i64,
    /// Set for moves only.
    pub move_type: Option<MoveType>,
    /// (src_line, dest_line) pairs with mismatched content in the block.
    pub updates: Vec<(usize, usize)>,
    /// None for single-line update candidates (scored by W-BESTI instead).
    pub context_similarity: Option<f64>,
    pub relative_distance: f64,
    pub edit_actions: u32,
    pub weight: f64,
}

/// Minimum Levenshtein ratio for a mismatched line pair to stay inside a
/// block as an intra-block update.
const BLOCK_UPDATE_RATIO: f64 = 0.6;

/// Enumerate move candidates. Kept source lines cannot participate: a
/// move consumes its source.
pub(crate) fn find_move_candidates(
    src_index: &BTreeMap<usize, LineRecord>,
    dest_index: &BTreeMap<usize, LineRecord>,
    src_all: &[&str],
    dest_all: &[&str],
    trace: &[TraceTok],
    opts: &BdiffOptions,
) -> Vec<Candidate> {
    let mut mappings = Vec::new();
    let mut checked: HashSet<(usize, usize)> = HashSet::new();

    for (&added_line, added_rec) in dest_index.iter() {
        if added_rec.text.is_empty() {
            continue;
        }

        for (&seed_src, seed_rec) in src_index.iter() {
            if seed_rec.text.is_empty()
                || checked.contains(&(seed_src, added_line))
                || seed_rec.origin == Origin::Kept
            {
                continue;
            }
            checked.insert((seed_src, added_line));

            let indent_diff = added_rec.indent.width - seed_rec.indent.width;
            let mut src_start = seed_src;
            let mut dest_start = added_line;
            let mut cur_src = seed_src;
            let mut cur_dest = added_line;
            let mut block_length = 0usize;
            let mut pure_len = 0usize;
            let mut edit_actions = 2u32;
            let mut m_updates: Vec<(usize, usize)> = Vec::new();

            loop {
                let (Some(s), Some(d)) = (src_index.get(&cur_src), dest_index.get(&cur_dest))
                else {
                    break;
                };
                if s.origin != Origin::Removed {
                    break;
                }
                let content_ok = s.text == d.text
                    || (opts.count_mv_block_update
                        && levenshtein_ratio(&s.text, &d.text) >= BLOCK_UPDATE_RATIO);
                let indent_ok = d.text.is_empty()
                    || d.indent.width - s.indent.width == indent_diff;
                if !content_ok || !indent_ok {
                    break;
                }

                if opts.count_mv_block_update && s.text != d.text {
                    edit_actions += 1;
                    m_updates.push((cur_src, cur_dest));
                }
                if !s.text.is_empty()
                    && !d.text.is_empty()
                    && (opts.pure_mv_block_contain_punc
                        || !(is_pure_punctuation(&s.text) && is_pure_punctuation(&d.text)))
                {
                    pure_len += 1;
                }
                checked.insert((cur_src, cur_dest));
                cur_src += 1;
                cur_dest += 1;
                block_length += 1;
            }

            if block_length == 0 || pure_len < opts.min_move_block_length {
                continue;
            }
            let joined: String = (src_start..src_start + block_length)
                .map(|l| src_index[&l].text.as_str())
                .collect();
            if is_pure_punctuation(&joined) {
                continue;
            }

            retro_extend_blanks(
                src_index,
                dest_index,
                true,
                &mut src_start,
                &mut dest_start,
                &mut block_length,
            );

            let src_hunk = src_index[&src_start].hunk;
            let dest_hunk = dest_index[&dest_start].hunk;
            let move_type = if src_hunk == dest_hunk {
                MoveType::Horizontal
            } else if src_hunk < dest_hunk {
                MoveType::Down
            } else {
                MoveType::Up
            };
            // A same-hunk move with no indent shift is a null edit.
            if move_type == MoveType::Horizontal && indent_diff == 0 {
                continue;
            }
            if indent_diff != 0 && move_type != MoveType::Horizontal {
                edit_actions += 1;
            }

            let ctx = context_similarity(src_start, dest_start, block_length, src_all, dest_all);
            let rd = relative_distance(src_start, dest_start, block_length, trace);
            mappings.push(Candidate {
                mode: BlockMode::Move,
                src_start,
                dest_start,
                block_length,
                indent_diff,
                move_type: Some(move_type),
                updates: m_updates,
                context_similarity: Some(ctx),
                relative_distance: rd,
                edit_actions,
                weight: block_weight(edit_actions, block_length, ctx, rd),
            });
        }
    }

    mappings
}

/// Enumerate copy candidates. The source may be kept or removed; a copy
/// wholly contained in one hunk on both sides would just be a move or a
/// plain insert, and is rejected.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_copy_candidates(
    src_index: &BTreeMap<usize, LineRecord>,
    dest_index: &BTreeMap<usize, LineRecord>,
    src_all: &[&str],
    dest_all: &[&str],
    hunks: &[crate::line_index::Hunk],
    trace: &[TraceTok],
    opts: &BdiffOptions,
) -> Vec<Candidate> {
    let mut mappings = Vec::new();
    let mut checked: HashSet<(usize, usize)> = HashSet::new();

    for (&added_line, added_rec) in dest_index.iter() {
        if added_rec.text.is_empty() {
            continue;
        }

        // Per destination line, keep a single minimum-weight candidate
        // among those sharing a block length.
        let mut local: Vec<Candidate> = Vec::new();

        for (&seed_src, seed_rec) in src_index.iter() {
            if seed_rec.text.is_empty() || checked.contains(&(seed_src, added_line)) {
                continue;
            }
            checked.insert((seed_src, added_line));

            let indent_diff = added_rec.indent.width - seed_rec.indent.width;
            let mut src_start = seed_src;
            let mut dest_start = added_line;
            let mut cur_src = seed_src;
            let mut cur_dest = added_line;
            let mut block_length = 0usize;
            let mut pure_len = 0usize;
            let mut edit_actions = 4u32;
            let mut c_updates: Vec<(usize, usize)> = Vec::new();

            loop {
                let (Some(s), Some(d)) = (src_index.get(&cur_src), dest_index.get(&cur_dest))
                else {
                    break;
                };
                let content_ok = s.text == d.text
                    || (opts.count_cp_block_update
                        && levenshtein_ratio(&s.text, &d.text) >= BLOCK_UPDATE_RATIO);
                let indent_ok = d.text.is_empty()
                    || d.indent.width - s.indent.width == indent_diff;
                if !content_ok || !indent_ok {
                    break;
                }

                checked.insert((cur_src, cur_dest));
                if opts.count_cp_block_update && s.text != d.text {
                    edit_actions += 1;
                    c_updates.push((cur_src, cur_dest));
                }
                if !s.text.is_empty()
                    && !d.text.is_empty()
                    && (opts.pure_cp_block_contain_punc
                        || !(is_pure_punctuation(&s.text) && is_pure_punctuation(&d.text)))
                {
                    pure_len += 1;
                }
                cur_src += 1;
                cur_dest += 1;
                block_length += 1;
            }

            if block_length == 0
                || pure_len < opts.min_copy_block_length
                || copy_block_in_hunk(src_start, dest_start, block_length, hunks)
            {
                continue;
            }
            let joined: String = (src_start..src_start + block_length)
                .map(|l| src_index[&l].text.as_str())
                .collect();
            if is_pure_punctuation(&joined) {
                continue;
            }

            retro_extend_blanks(
                src_index,
                dest_index,
                false,
                &mut src_start,
                &mut dest_start,
                &mut block_length,
            );

            if indent_diff != 0 {
                edit_actions += 1;
            }

            let ctx = context_similarity(src_start, dest_start, block_length, src_all, dest_all);
            let rd = relative_distance(src_start, dest_start, block_length, trace);
            let weight = block_weight(edit_actions, block_length, ctx, rd);
            let candidate = Candidate {
                mode: BlockMode::Copy,
                src_start,
                dest_start,
                block_length,
                indent_diff,
                move_type: None,
                updates: c_updates,
                context_similarity: Some(ctx),
                relative_distance: rd,
                edit_actions,
                weight,
            };

            match local.iter().position(|c| c.block_length == block_length) {
                Some(i) if local[i].weight > weight => {
                    local.remove(i);
                    local.push(candidate);
                }
                Some(_) => {}
                None => local.push(candidate),
            }
        }

        mappings.extend(local);
    }

    mappings
}

/// Grow a block upward over pairs of blank lines.
fn retro_extend_blanks(
    src_index: &BTreeMap<usize, LineRecord>,
    dest_index: &BTreeMap<usize, LineRecord>,
    require_removed: bool,
    src_start: &mut usize,
    dest_start: &mut usize,
    block_length: &mut usize,
) {
    let mut cur_src = *src_start as i64 - 1;
    let mut cur_dest = *dest_start as i64 - 1;
    while cur_src >= 1 && cur_dest >= 1 {
        let (Some(s), Some(d)) = (
            src_index.get(&(cur_src as usize)),
            dest_index.get(&(cur_dest as usize)),
        ) else {
            break;
        };
        if (require_removed && s.origin != Origin::Removed)
            || !s.text.is_empty()
            || !d.text.is_empty()
        {
            break;
        }
        *src_start = cur_src as usize;
        *dest_start = cur_dest as usize;
        *block_length += 1;
        cur_src -= 1;
        cur_dest -= 1;
    }
}

/// The cost-model weight shared by move and copy candidates.
pub(crate) fn block_weight(edit_actions: u32, block_length: usize, ctx: f64, rd: f64) -> f64 {
    edit_actions as f64 / block_length as f64 + (1.0 - ctx) / 10.0 + rd / 100.0
}

/// True when both sides of a block fall inside a single hunk.
fn copy_block_in_hunk(
    src_start: usize,
    dest_start: usize,
    block_length: usize,
    hunks: &[crate::line_index::Hunk],
) -> bool {
    hunks.iter().any(|hunk| {
        !hunk.src.is_empty()
            && !hunk.dest.is_empty()
            && src_start >= hunk.src[0]
            && src_start + block_length - 1 <= *hunk.src.last().unwrap()
            && dest_start >= hunk.dest[0]
            && dest_start + block_length - 1 <= *hunk.dest.last().unwrap()
    })
}

/// Displacement of a block inside the canonical interleaving: the number
/// of kept tokens plus the larger of the remove/insert counts between
/// the source and destination positions in the trace.
pub(crate) fn relative_distance(
    src_start: usize,
    dest_start: usize,
    block_length: usize,
    trace: &[TraceTok],
) -> f64 {
    let src_idx = trace
        .iter()
        .position(|t| matches!(t, TraceTok::Keep(n) | TraceTok::Remove(n) if *n == src_start))
        .unwrap_or(trace.len());
    let dest_idx = trace
        .iter()
        .position(|t| *t == TraceTok::Insert(dest_start))
        .expect("destination block start must be an inserted line");

    let (lo, hi) = if src_idx <= dest_idx {
        (src_idx + block_length, dest_idx)
    } else {
        (dest_idx + block_length, src_idx)
    };

    let mut keeps = 0u32;
    let mut removes = 0u32;
    let mut inserts = 0u32;
    for i in lo..hi {
        match trace[i] {
            TraceTok::Keep(_) => keeps += 1,
            TraceTok::Remove(_) => removes += 1,
            TraceTok::Insert(_) => inserts += 1,
        }
    }
    (keeps + removes.max(inserts)) as f64
}
