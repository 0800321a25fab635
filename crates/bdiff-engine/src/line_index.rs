//! Raw-diff ingestion: line records, hunks, and the linear trace.
//!
//! The raw edit script is normalized into the canonical 0-context
//! interleaving (per change region: removes first, then inserts) and
//! tabulated into ordered per-line records for both sides.

use std::collections::BTreeMap;

use bdiff_diff::{Edit, EditOp};

/// Indentation of a line: effective width plus raw space/tab counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Indent {
    /// spaces + tabs * tab_width
    pub width: i64,
    pub spaces: usize,
    pub tabs: usize,
}

/// Where a line came from in the raw diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Kept,
    Removed,
    Inserted,
}

/// Per-line record keyed by 1-based line number within its side.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineRecord {
    /// Content with leading whitespace stripped and no trailing newline.
    pub text: String,
    pub indent: Indent,
    pub origin: Origin,
    /// 1-based id of the owning hunk; 0 for kept lines.
    pub hunk: usize,
}

/// One token of the linear keep/remove/insert trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraceTok {
    /// Kept line, by source line number.
    Keep(usize),
    /// Removed line, by source line number.
    Remove(usize),
    /// Inserted line, by destination line number.
    Insert(usize),
}

impl TraceTok {
    pub fn line(self) -> usize {
        match self {
            Self::Keep(n) | Self::Remove(n) | Self::Insert(n) => n,
        }
    }
}

/// A contiguous change region: removed source lines and inserted
/// destination lines, both ascending. At least one side is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hunk {
    pub src: Vec<usize>,
    pub dest: Vec<usize>,
}

/// The tabulated form of one raw diff.
#[derive(Debug)]
pub(crate) struct LineIndex {
    /// Every source line (kept and removed).
    pub src: BTreeMap<usize, LineRecord>,
    /// Inserted destination lines only.
    pub dest: BTreeMap<usize, LineRecord>,
    pub trace: Vec<TraceTok>,
    pub hunks: Vec<Hunk>,
}

/// Tabulate a raw edit script into line records, hunks and the trace.
///
/// A new hunk starts at the first remove/insert following any kept line.
pub(crate) fn index_lines(
    edits: &[Edit],
    src_lines: &[&str],
    dest_lines: &[&str],
    tab_size: usize,
) -> LineIndex {
    let mut src = BTreeMap::new();
    let mut dest = BTreeMap::new();
    let mut trace = Vec::with_capacity(edits.len());
    let mut hunks: Vec<Hunk> = Vec::new();

    let mut i = 0;
    while i < edits.len() {
        match edits[i].op {
            EditOp::Equal => {
                let line_no = edits[i].old_index + 1;
                let raw = src_lines[edits[i].old_index];
                src.insert(
                    line_no,
                    LineRecord {
                        text: raw.trim_start().to_string(),
                        indent: compute_indent(raw, tab_size),
                        origin: Origin::Kept,
                        hunk: 0,
                    },
                );
                trace.push(TraceTok::Keep(line_no));
                i += 1;
            }
            _ => {
                // One change region: gather its removes and inserts, then
                // emit removes before inserts (the unified=0 ordering).
                let mut removed = Vec::new();
                let mut inserted = Vec::new();
                while i < edits.len() && edits[i].op != EditOp::Equal {
                    match edits[i].op {
                        EditOp::Delete => removed.push(edits[i].old_index + 1),
                        EditOp::Insert => inserted.push(edits[i].new_index + 1),
                        EditOp::Equal => unreachable!(),
                    }
                    i += 1;
                }
                removed.sort_unstable();
                inserted.sort_unstable();

                let hunk_id = hunks.len() + 1;
                for &line_no in &removed {
                    let raw = src_lines[line_no - 1];
                    src.insert(
                        line_no,
                        LineRecord {
                            text: raw.trim_start().to_string(),
                            indent: compute_indent(raw, tab_size),
                            origin: Origin::Removed,
                            hunk: hunk_id,
                        },
                    );
                    trace.push(TraceTok::Remove(line_no));
                }
                for &line_no in &inserted {
                    let raw = dest_lines[line_no - 1];
                    dest.insert(
                        line_no,
                        LineRecord {
                            text: raw.trim_start().to_string(),
                            indent: compute_indent(raw, tab_size),
                            origin: Origin::Inserted,
                            hunk: hunk_id,
                        },
                    );
                    trace.push(TraceTok::Insert(line_no));
                }
                hunks.push(Hunk {
                    src: removed,
                    dest: inserted,
                });
            }
        }
    }

    LineIndex {
        src,
        dest,
        trace,
        hunks,
    }
}

/// Compute the indentation of a raw line.
///
/// Counts leading spaces and tabs up to the first non-whitespace
/// character; a line that is whitespace throughout counts every space and
/// tab it contains. Non-indented lines yield zeros.
pub(crate) fn compute_indent(line: &str, tab_size: usize) -> Indent {
    if !(line.starts_with(' ') || line.starts_with('\t')) {
        return Indent {
            width: 0,
            spaces: 0,
            tabs: 0,
        };
    }

    let leading = match line.trim_start().chars().next() {
        Some(first) => &line[..line.find(first).unwrap_or(line.len())],
        None => line,
    };

    let spaces = leading.chars().filter(|&c| c == ' ').count();
    let tabs = leading.chars().filter(|&c| c == '\t').count();
    Indent {
        width: (spaces + tabs * tab_size) as i64,
        spaces,
        tabs,
    }
}
