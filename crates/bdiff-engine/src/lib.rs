//! Block-matching diff engine.
//!
//! Consumes a raw keep/remove/insert line diff and discovers the
//! higher-level edits a plain line differ cannot express: block moves
//! (optionally with intra-block line updates and indentation shifts),
//! block copies, single-line updates, and line splits/merges. Candidate
//! blocks compete in a minimum-cost bipartite assignment (Kuhn-Munkres);
//! losing candidates are sliced against winners into residuals and the
//! assignment iterates until no residual survives. The result is a
//! canonically ordered, conflict-free edit script.

mod assignment;
mod candidates;
mod hungarian;
mod line_index;
mod script;
mod similarity;
mod splitmerge;
mod strdiff;
mod updates;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use bdiff_diff::DiffAlgorithm;
pub use strdiff::StrDiff;

/// Options controlling engine behavior.
#[derive(Debug, Clone)]
pub struct BdiffOptions {
    /// Which raw line-diff algorithm to run.
    pub diff_algorithm: DiffAlgorithm,
    /// Tab width in spaces for indentation calculation.
    pub indent_tabs_size: usize,
    /// Minimum pure block length for moves.
    pub min_move_block_length: usize,
    /// Minimum pure block length for copies.
    pub min_copy_block_length: usize,
    /// Half-window (lines above/below) for line-level context similarity.
    pub ctx_length: usize,
    /// Weight of content similarity in the synthetic score.
    pub line_sim_weight: f64,
    /// Acceptance threshold for single-line updates.
    pub sim_threshold: f64,
    /// Cap on the number of source lines merged into one.
    pub max_merge_lines: usize,
    /// Cap on the number of destination lines split from one.
    pub max_split_lines: usize,
    /// Count punctuation-only line pairs toward move pure length.
    pub pure_mv_block_contain_punc: bool,
    /// Count punctuation-only line pairs toward copy pure length.
    pub pure_cp_block_contain_punc: bool,
    /// Permit intra-block line updates in moves.
    pub count_mv_block_update: bool,
    /// Permit intra-block line updates in copies.
    pub count_cp_block_update: bool,
    /// Enable move detection.
    pub identify_move: bool,
    /// Enable copy detection.
    pub identify_copy: bool,
    /// Enable single-line update detection.
    pub identify_update: bool,
    /// Enable split detection.
    pub identify_split: bool,
    /// Enable merge detection.
    pub identify_merge: bool,
}

impl Default for BdiffOptions {
    fn default() -> Self {
        Self {
            diff_algorithm: DiffAlgorithm::Histogram,
            indent_tabs_size: 4,
            min_move_block_length: 2,
            min_copy_block_length: 2,
            ctx_length: 4,
            line_sim_weight: 0.6,
            sim_threshold: 0.5,
            max_merge_lines: 8,
            max_split_lines: 8,
            pure_mv_block_contain_punc: false,
            pure_cp_block_contain_punc: false,
            count_mv_block_update: true,
            count_cp_block_update: true,
            identify_move: true,
            identify_copy: true,
            identify_update: true,
            identify_split: true,
            identify_merge: true,
        }
    }
}

/// Direction of a move relative to its source and destination hunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveType {
    /// Source and destination belong to the same hunk.
    #[serde(rename = "h")]
    Horizontal,
    /// Source hunk precedes the destination hunk.
    #[serde(rename = "d")]
    Down,
    /// Source hunk follows the destination hunk.
    #[serde(rename = "u")]
    Up,
}

/// A typed edit operation in the emitted script.
///
/// Line numbers are 1-based. `edit_action` is a human-readable sentence
/// whose exact wording is part of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditRecord {
    Copy {
        src_line: usize,
        dest_line: usize,
        block_length: usize,
        indent_offset: i64,
        edit_action: String,
        updates: Vec<(usize, usize)>,
    },
    Move {
        src_line: usize,
        dest_line: usize,
        block_length: usize,
        indent_offset: i64,
        move_type: MoveType,
        edit_action: String,
        updates: Vec<(usize, usize)>,
    },
    Update {
        src_line: usize,
        dest_line: usize,
        indent_offset: i64,
        str_diff: StrDiff,
        edit_action: String,
    },
    CUpdate {
        src_line: usize,
        dest_line: usize,
        str_diff: StrDiff,
        edit_action: String,
    },
    MUpdate {
        src_line: usize,
        dest_line: usize,
        str_diff: StrDiff,
        edit_action: String,
    },
    Insert {
        src_line: usize,
        dest_line: usize,
        edit_action: String,
    },
    Delete {
        src_line: usize,
        dest_line: usize,
        edit_action: String,
    },
    Split {
        src_line: usize,
        dest_line: usize,
        block_length: usize,
        edit_action: String,
    },
    Merge {
        src_line: usize,
        dest_line: usize,
        block_length: usize,
        edit_action: String,
    },
}

impl EditRecord {
    /// Primary source line of the record.
    pub fn src_line(&self) -> usize {
        match self {
            Self::Copy { src_line, .. }
            | Self::Move { src_line, .. }
            | Self::Update { src_line, .. }
            | Self::CUpdate { src_line, .. }
            | Self::MUpdate { src_line, .. }
            | Self::Insert { src_line, .. }
            | Self::Delete { src_line, .. }
            | Self::Split { src_line, .. }
            | Self::Merge { src_line, .. } => *src_line,
        }
    }

    /// Primary destination line of the record.
    pub fn dest_line(&self) -> usize {
        match self {
            Self::Copy { dest_line, .. }
            | Self::Move { dest_line, .. }
            | Self::Update { dest_line, .. }
            | Self::CUpdate { dest_line, .. }
            | Self::MUpdate { dest_line, .. }
            | Self::Insert { dest_line, .. }
            | Self::Delete { dest_line, .. }
            | Self::Split { dest_line, .. }
            | Self::Merge { dest_line, .. } => *dest_line,
        }
    }

    /// The human-readable action sentence.
    pub fn edit_action(&self) -> &str {
        match self {
            Self::Copy { edit_action, .. }
            | Self::Move { edit_action, .. }
            | Self::Update { edit_action, .. }
            | Self::CUpdate { edit_action, .. }
            | Self::MUpdate { edit_action, .. }
            | Self::Insert { edit_action, .. }
            | Self::Delete { edit_action, .. }
            | Self::Split { edit_action, .. }
            | Self::Merge { edit_action, .. } => edit_action,
        }
    }
}

impl std::fmt::Display for EditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy {
                src_line,
                dest_line,
                block_length,
                indent_offset,
                edit_action,
                ..
            } => write!(
                f,
                "[copy] src {src_line} -> dest {dest_line} (len {block_length}, indent {indent_offset}): {edit_action}"
            ),
            Self::Move {
                src_line,
                dest_line,
                block_length,
                indent_offset,
                edit_action,
                ..
            } => write!(
                f,
                "[move] src {src_line} -> dest {dest_line} (len {block_length}, indent {indent_offset}): {edit_action}"
            ),
            Self::Update {
                src_line,
                dest_line,
                edit_action,
                ..
            } => write!(f, "[update] src {src_line} -> dest {dest_line}: {edit_action}"),
            Self::CUpdate {
                src_line,
                dest_line,
                edit_action,
                ..
            } => write!(f, "[c_update] src {src_line} -> dest {dest_line}: {edit_action}"),
            Self::MUpdate {
                src_line,
                dest_line,
                edit_action,
                ..
            } => write!(f, "[m_update] src {src_line} -> dest {dest_line}: {edit_action}"),
            Self::Insert {
                src_line,
                dest_line,
                edit_action,
            } => write!(f, "[insert] src {src_line} -> dest {dest_line}: {edit_action}"),
            Self::Delete {
                src_line,
                dest_line,
                edit_action,
            } => write!(f, "[delete] src {src_line} -> dest {dest_line}: {edit_action}"),
            Self::Split {
                src_line,
                dest_line,
                block_length,
                edit_action,
            } => write!(
                f,
                "[split] src {src_line} -> dest {dest_line} (len {block_length}): {edit_action}"
            ),
            Self::Merge {
                src_line,
                dest_line,
                block_length,
                edit_action,
            } => write!(
                f,
                "[merge] src {src_line} -> dest {dest_line} (len {block_length}): {edit_action}"
            ),
        }
    }
}

/// Error types for engine invocations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot read '{}': {source}", path.display())]
    InputMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

/// Compute the semantic edit script between two line sequences.
///
/// Runs the raw line differ selected by `opts.diff_algorithm`, then the
/// block-matching pipeline. The engine is pure: no I/O, no shared state,
/// and identical inputs yield a bit-identical script.
pub fn bdiff(src_lines: &[&str], dest_lines: &[&str], opts: &BdiffOptions) -> Vec<EditRecord> {
    let edits = bdiff_diff::diff_lines(src_lines, dest_lines, opts.diff_algorithm);
    bdiff_edits(src_lines, dest_lines, &edits, opts)
}

/// Compute the semantic edit script from a pre-computed raw edit script.
///
/// This is the oracle seam: any differ producing ordered
/// keep/remove/insert edits with 0-width context can be substituted for
/// the built-in one.
pub fn bdiff_edits(
    src_lines: &[&str],
    dest_lines: &[&str],
    edits: &[bdiff_diff::Edit],
    opts: &BdiffOptions,
) -> Vec<EditRecord> {
    let mut index = line_index::index_lines(edits, src_lines, dest_lines, opts.indent_tabs_size);

    if index.dest.is_empty() {
        // Nothing was inserted: the raw trace is the whole story.
        return script::from_trace(&index.trace);
    }

    // Copy detection and emission see the source index as it was before
    // split/merge consumption; the destination index is shared.
    let src_snapshot = index.src.clone();
    let hunks_pristine = index.hunks.clone();

    let mut splits_merges: Vec<splitmerge::SplitMerge> = Vec::new();
    if opts.identify_split {
        splits_merges.extend(splitmerge::find_splits(
            &mut index.hunks,
            &mut index.src,
            &mut index.dest,
            opts.max_split_lines,
        ));
    }
    if opts.identify_merge {
        splits_merges.extend(splitmerge::find_merges(
            &mut index.hunks,
            &mut index.src,
            &mut index.dest,
            opts.max_merge_lines,
        ));
    }

    let move_mappings = if opts.identify_move {
        candidates::find_move_candidates(
            &index.src,
            &index.dest,
            src_lines,
            dest_lines,
            &index.trace,
            opts,
        )
    } else {
        Vec::new()
    };

    let copy_mappings = if opts.identify_copy {
        candidates::find_copy_candidates(
            &src_snapshot,
            &index.dest,
            src_lines,
            dest_lines,
            &index.hunks,
            &index.trace,
            opts,
        )
    } else {
        Vec::new()
    };

    let mut update_mappings = if opts.identify_update {
        updates::find_update_candidates(src_lines, dest_lines, &index.hunks, opts)
    } else {
        Vec::new()
    };

    // An update crossing a split/merge contradicts the already-committed
    // line consumption; drop it.
    update_mappings.retain(|u| {
        !splits_merges.iter().any(|sm| {
            (sm.src_first() as i64 - u.src_start as i64)
                * (sm.dest_first() as i64 - u.dest_start as i64)
                < 0
        })
    });

    let mut all_mappings = move_mappings.clone();
    for copy in copy_mappings {
        let duplicates_move = move_mappings.iter().any(|m| {
            m.src_start == copy.src_start
                && m.dest_start == copy.dest_start
                && m.block_length == copy.block_length
        });
        if !duplicates_move {
            all_mappings.push(copy);
        }
    }
    all_mappings.extend(update_mappings);

    let mut km_matches = Vec::new();
    if !all_mappings.is_empty() {
        let mut pending: Vec<assignment::Pending> = all_mappings
            .into_iter()
            .map(assignment::Pending::fresh)
            .collect();
        while !pending.is_empty() {
            let (matches, residuals) =
                assignment::assign_round(pending, src_lines, dest_lines, opts);
            km_matches.extend(matches);
            pending = residuals;
        }
        km_matches.sort_by_key(|c| c.src_start);
    }

    script::from_matches(
        &km_matches,
        &index.trace,
        &src_snapshot,
        &index.dest,
        &splits_merges,
        &hunks_pristine,
        src_lines.len(),
        dest_lines.len(),
    )
}

/// Read two files as UTF-8 and compute their semantic edit script.
pub fn bdiff_files(
    src_path: &Path,
    dest_path: &Path,
    opts: &BdiffOptions,
) -> Result<Vec<EditRecord>, EngineError> {
    let src_text = read_utf8(src_path)?;
    let dest_text = read_utf8(dest_path)?;
    let src_lines: Vec<&str> = src_text.lines().collect();
    let dest_lines: Vec<&str> = dest_text.lines().collect();
    Ok(bdiff(&src_lines, &dest_lines, opts))
}

fn read_utf8(path: &Path) -> Result<String, EngineError> {
    let bytes = std::fs::read(path).map_err(|source| EngineError::InputMissing {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| EngineError::Encoding {
        path: path.to_path_buf(),
    })
}
