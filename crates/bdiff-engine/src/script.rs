//! Edit-script emission.
//!
//! Converts winning matches plus splits/merges into typed records,
//! resolves every trace token to its owning operation, anchors the
//! leftover removes/inserts of each hunk, and orders the result for
//! display (deletes repositioned to precede neighboring inserts).

use std::collections::{BTreeMap, HashMap};

use crate::candidates::Candidate;
use crate::line_index::{Hunk, LineRecord, TraceTok};
use crate::similarity::BlockMode;
use crate::splitmerge::SplitMerge;
use crate::strdiff::build_str_diff;
use crate::EditRecord;

/// What a trace token resolved to. Partner lines point at the opposite
/// side's anchor (block start for moves/copies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Insert,
    Delete,
    Split(usize),
    Merge(usize),
    Copy(usize),
    Move(usize),
    Update(usize),
}

impl Resolution {
    fn partner(self) -> Option<usize> {
        match self {
            Self::Split(n) | Self::Merge(n) | Self::Copy(n) | Self::Move(n) | Self::Update(n) => {
                Some(n)
            }
            Self::Insert | Self::Delete => None,
        }
    }
}

/// Emit the script when no line was inserted at all: the raw trace is
/// converted directly, bypassing the matching engine.
pub(crate) fn from_trace(trace: &[TraceTok]) -> Vec<EditRecord> {
    let mut src_no = 1usize;
    let mut dest_no = 1usize;
    let mut records = Vec::new();
    for tok in trace {
        match *tok {
            TraceTok::Remove(r_line) => {
                records.push(EditRecord::Delete {
                    src_line: r_line,
                    dest_line: dest_no,
                    edit_action: delete_action(r_line),
                });
                src_no += 1;
            }
            TraceTok::Insert(i_line) => {
                records.push(EditRecord::Insert {
                    src_line: src_no,
                    dest_line: i_line,
                    edit_action: insert_action(i_line),
                });
                dest_no += 1;
            }
            TraceTok::Keep(_) => {
                src_no += 1;
                dest_no += 1;
            }
        }
    }
    records
}

/// Emit the full script from assignment winners, splits/merges, and the
/// unresolved remainder of every hunk.
#[allow(clippy::too_many_arguments)]
pub(crate) fn from_matches(
    matches: &[Candidate],
    trace: &[TraceTok],
    src_index: &BTreeMap<usize, LineRecord>,
    dest_index: &BTreeMap<usize, LineRecord>,
    splits_merges: &[SplitMerge],
    hunks: &[Hunk],
    src_len: usize,
    dest_len: usize,
) -> Vec<EditRecord> {
    let mut r_res: HashMap<usize, Resolution> = HashMap::new();
    let mut i_res: HashMap<usize, Resolution> = HashMap::new();

    // keep_pairs: source keep line -> destination line it pairs with.
    let mut keep_pairs: HashMap<usize, usize> = HashMap::new();
    let mut dest_no = 1usize;
    for tok in trace {
        match *tok {
            TraceTok::Keep(src_line) => {
                keep_pairs.insert(src_line, dest_no);
                dest_no += 1;
            }
            TraceTok::Insert(_) => dest_no += 1,
            TraceTok::Remove(_) => {}
        }
    }

    let mut records: Vec<EditRecord> = Vec::new();

    for sm in splits_merges {
        match sm {
            SplitMerge::Split { src, dest } => {
                records.push(EditRecord::Split {
                    src_line: *src,
                    dest_line: dest[0],
                    block_length: dest.len(),
                    edit_action: split_action(*src, dest),
                });
                r_res.insert(*src, Resolution::Split(dest[0]));
                for &d in dest {
                    i_res.insert(d, Resolution::Split(*src));
                }
            }
            SplitMerge::Merge { src, dest } => {
                records.push(EditRecord::Merge {
                    src_line: src[0],
                    dest_line: *dest,
                    block_length: src.len(),
                    edit_action: merge_action(src, *dest),
                });
                i_res.insert(*dest, Resolution::Merge(src[0]));
                for &s in src {
                    r_res.insert(s, Resolution::Merge(*dest));
                }
            }
        }
    }

    for m in matches {
        match m.mode {
            BlockMode::Copy => {
                let display_indent =
                    dest_index[&m.dest_start].indent.width - src_index[&m.src_start].indent.width;
                records.push(EditRecord::Copy {
                    src_line: m.src_start,
                    dest_line: m.dest_start,
                    block_length: m.block_length,
                    indent_offset: m.indent_diff,
                    edit_action: copy_action(
                        m.block_length,
                        m.src_start,
                        m.dest_start,
                        display_indent,
                    ),
                    updates: m.updates.clone(),
                });
                for d in m.dest_start..m.dest_start + m.block_length {
                    i_res.insert(d, Resolution::Copy(m.src_start));
                }
                for &(u_src, u_dest) in &m.updates {
                    records.push(EditRecord::CUpdate {
                        src_line: u_src,
                        dest_line: u_dest,
                        str_diff: build_str_diff(&src_index[&u_src], &dest_index[&u_dest]),
                        edit_action: block_update_action(u_src, u_dest),
                    });
                }
            }
            BlockMode::Move => {
                let display_indent =
                    dest_index[&m.dest_start].indent.width - src_index[&m.src_start].indent.width;
                records.push(EditRecord::Move {
                    src_line: m.src_start,
                    dest_line: m.dest_start,
                    block_length: m.block_length,
                    indent_offset: m.indent_diff,
                    move_type: m.move_type.expect("moves carry a move type"),
                    edit_action: move_action(
                        m.block_length,
                        m.src_start,
                        m.dest_start,
                        display_indent,
                    ),
                    updates: m.updates.clone(),
                });
                for offset in 0..m.block_length {
                    r_res.insert(m.src_start + offset, Resolution::Move(m.dest_start));
                    i_res.insert(m.dest_start + offset, Resolution::Move(m.src_start));
                }
                for &(u_src, u_dest) in &m.updates {
                    records.push(EditRecord::MUpdate {
                        src_line: u_src,
                        dest_line: u_dest,
                        str_diff: build_str_diff(&src_index[&u_src], &dest_index[&u_dest]),
                        edit_action: block_update_action(u_src, u_dest),
                    });
                }
            }
            BlockMode::Update => {
                let display_indent =
                    dest_index[&m.dest_start].indent.width - src_index[&m.src_start].indent.width;
                r_res.insert(m.src_start, Resolution::Update(m.dest_start));
                i_res.insert(m.dest_start, Resolution::Update(m.src_start));
                records.push(EditRecord::Update {
                    src_line: m.src_start,
                    dest_line: m.dest_start,
                    indent_offset: display_indent,
                    str_diff: build_str_diff(&src_index[&m.src_start], &dest_index[&m.dest_start]),
                    edit_action: update_action(m.src_start, m.dest_start, display_indent),
                });
            }
        }
    }

    for hunk in hunks {
        if hunk.src.is_empty() {
            let last_idx = position_of(trace, TraceTok::Insert(*hunk.dest.last().expect("hunk")));
            let src_line = if last_idx == trace.len() - 1 {
                src_len + 1
            } else {
                trace[last_idx + 1].line()
            };
            for &i_line in &hunk.dest {
                if !i_res.contains_key(&i_line) {
                    i_res.insert(i_line, Resolution::Insert);
                    records.push(EditRecord::Insert {
                        src_line,
                        dest_line: i_line,
                        edit_action: insert_action(i_line),
                    });
                }
            }
        } else if hunk.dest.is_empty() {
            let last_idx = position_of(trace, TraceTok::Remove(*hunk.src.last().expect("hunk")));
            let dest_line = if last_idx == trace.len() - 1 {
                dest_len + 1
            } else {
                keep_pairs[&trace[last_idx + 1].line()]
            };
            for &r_line in &hunk.src {
                if !r_res.contains_key(&r_line) {
                    r_res.insert(r_line, Resolution::Delete);
                    records.push(EditRecord::Delete {
                        src_line: r_line,
                        dest_line,
                        edit_action: delete_action(r_line),
                    });
                }
            }
        } else {
            let last_idx = position_of(trace, TraceTok::Insert(*hunk.dest.last().expect("hunk")));
            let anchors = if last_idx == trace.len() - 1 {
                (src_len + 1, dest_len + 1)
            } else {
                let next_keep = trace[last_idx + 1].line();
                (next_keep, keep_pairs[&next_keep])
            };

            // Walk inserts right to left, anchoring each unresolved one
            // at the current left pointer and stepping the pointers over
            // resolved tokens whose mapping pins both sides.
            let (mut cur_left, mut cur_right) = anchors;
            for &i_line in hunk.dest.iter().rev() {
                match i_res.get(&i_line).copied() {
                    None => {
                        i_res.insert(i_line, Resolution::Insert);
                        records.push(EditRecord::Insert {
                            src_line: cur_left,
                            dest_line: i_line,
                            edit_action: insert_action(i_line),
                        });
                        cur_right = i_line;
                    }
                    Some(res) => {
                        let src_anchor = res.partner().unwrap_or(cur_left);
                        match res {
                            Resolution::Update(_)
                            | Resolution::Split(_)
                            | Resolution::Merge(_) => {
                                cur_left = src_anchor;
                                cur_right = r_res[&src_anchor]
                                    .partner()
                                    .expect("source side of a paired token");
                            }
                            Resolution::Move(_) => {
                                let right_anchor = r_res[&src_anchor]
                                    .partner()
                                    .expect("move source marks its block");
                                let aligned = right_anchor as i64 - cur_right as i64
                                    == src_anchor as i64 - cur_left as i64;
                                if aligned {
                                    cur_left = src_anchor;
                                    cur_right = right_anchor;
                                } else {
                                    cur_right = i_line;
                                }
                            }
                            _ => cur_right = i_line,
                        }
                    }
                }
            }

            let (mut cur_left, mut cur_right) = anchors;
            for &r_line in hunk.src.iter().rev() {
                match r_res.get(&r_line).copied() {
                    None => {
                        r_res.insert(r_line, Resolution::Delete);
                        records.push(EditRecord::Delete {
                            src_line: r_line,
                            dest_line: cur_right,
                            edit_action: delete_action(r_line),
                        });
                        cur_left = r_line;
                    }
                    Some(res) => {
                        let dest_anchor = res.partner().unwrap_or(cur_right);
                        match res {
                            Resolution::Update(_)
                            | Resolution::Split(_)
                            | Resolution::Merge(_) => {
                                cur_right = dest_anchor;
                                cur_left = i_res[&dest_anchor]
                                    .partner()
                                    .expect("destination side of a paired token");
                            }
                            Resolution::Move(_) => {
                                let left_anchor = i_res[&dest_anchor]
                                    .partner()
                                    .expect("move destination marks its block");
                                let aligned = left_anchor as i64 - cur_left as i64
                                    == dest_anchor as i64 - cur_right as i64;
                                if aligned {
                                    cur_right = dest_anchor;
                                    cur_left = left_anchor;
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    records.sort_by_key(|r| (r.src_line(), r.dest_line()));

    // Display post-pass: a delete sorted before a nearby insert should
    // not report a later destination line than the insert does.
    for i in 0..records.len() {
        if !matches!(records[i], EditRecord::Delete { .. }) {
            continue;
        }
        for j in 0..records.len() {
            let (ins_src, ins_dest) = match &records[j] {
                EditRecord::Insert {
                    src_line, dest_line, ..
                } => (*src_line, *dest_line),
                _ => continue,
            };
            if records[i].dest_line() > ins_dest && records[i].src_line() < ins_src {
                if let EditRecord::Delete { dest_line, .. } = &mut records[i] {
                    *dest_line = ins_dest;
                }
            }
        }
    }

    records
}

fn position_of(trace: &[TraceTok], tok: TraceTok) -> usize {
    trace
        .iter()
        .position(|t| *t == tok)
        .expect("hunk line must appear in the trace")
}

fn indent_suffix(offset: i64) -> String {
    match offset.cmp(&0) {
        std::cmp::Ordering::Less => format!(" with moving left {} whitespaces.", -offset),
        std::cmp::Ordering::Equal => String::new(),
        std::cmp::Ordering::Greater => format!(" with moving right {offset} whitespaces."),
    }
}

fn move_action(block_length: usize, src_line: usize, dest_line: usize, indent: i64) -> String {
    let suffix = indent_suffix(indent);
    if block_length == 1 {
        format!("Move 1 line from line {src_line} to line {dest_line}{suffix}")
    } else {
        format!("Move a {block_length}-line block from line {src_line} to line {dest_line}{suffix}")
    }
}

fn copy_action(block_length: usize, src_line: usize, dest_line: usize, indent: i64) -> String {
    let suffix = indent_suffix(indent);
    format!("Copy a {block_length}-line block from line {src_line} to line {dest_line}{suffix}")
}

fn update_action(src_line: usize, dest_line: usize, indent: i64) -> String {
    let suffix = indent_suffix(indent);
    format!("Update line {src_line} to line {dest_line}{suffix}")
}

fn block_update_action(src_line: usize, dest_line: usize) -> String {
    format!("Update line {src_line} to line {dest_line}")
}

fn insert_action(dest_line: usize) -> String {
    format!("Insert line {dest_line}")
}

fn delete_action(src_line: usize) -> String {
    format!("Delete line {src_line}")
}

fn split_action(src_line: usize, dest_lines: &[usize]) -> String {
    format!(
        "Split line {src_line} to lines {}-{}",
        dest_lines[0],
        dest_lines[dest_lines.len() - 1]
    )
}

fn merge_action(src_lines: &[usize], dest_line: usize) -> String {
    format!(
        "Merge lines {}-{} to line {dest_line}",
        src_lines[0],
        src_lines[src_lines.len() - 1]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_only_deletes() {
        let trace = vec![TraceTok::Keep(1), TraceTok::Remove(2), TraceTok::Keep(3)];
        let records = from_trace(&trace);
        assert_eq!(
            records,
            vec![EditRecord::Delete {
                src_line: 2,
                dest_line: 2,
                edit_action: "Delete line 2".into(),
            }]
        );
    }

    #[test]
    fn trace_empty_is_empty_script() {
        let trace = vec![TraceTok::Keep(1), TraceTok::Keep(2)];
        assert!(from_trace(&trace).is_empty());
    }

    #[test]
    fn action_wording() {
        assert_eq!(
            move_action(2, 1, 2, 0),
            "Move a 2-line block from line 1 to line 2"
        );
        assert_eq!(
            move_action(1, 4, 9, 0),
            "Move 1 line from line 4 to line 9"
        );
        assert_eq!(
            move_action(3, 1, 2, -2),
            "Move a 3-line block from line 1 to line 2 with moving left 2 whitespaces."
        );
        assert_eq!(
            copy_action(2, 3, 7, 4),
            "Copy a 2-line block from line 3 to line 7 with moving right 4 whitespaces."
        );
        assert_eq!(update_action(2, 2, 0), "Update line 2 to line 2");
        assert_eq!(split_action(1, &[1, 2]), "Split line 1 to lines 1-2");
        assert_eq!(merge_action(&[1, 2], 1), "Merge lines 1-2 to line 1");
        assert_eq!(insert_action(2), "Insert line 2");
        assert_eq!(delete_action(2), "Delete line 2");
    }
}
