//! String and context similarity scoring.
//!
//! Levenshtein ratio (substitution cost 2), the W-BESTI weighted line
//! similarity of Reiss ("Tracking source locations", ICSE 2008), block
//! context similarity, and the punctuation-line classifier.

use std::sync::OnceLock;

use regex::Regex;

use crate::BdiffOptions;

/// Normalized Levenshtein similarity ratio between two strings.
///
/// Substitutions cost 2, insertions and deletions cost 1. The ratio is
/// `(|s1| + |s2| - distance) / (|s1| + |s2|)`, in [0, 1]; two empty
/// strings are identical (ratio 1).
pub(crate) fn levenshtein_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 2 };
            cur[j] = (prev[j] + 1)
                .min(cur[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    let distance = prev[b.len()] as f64;
    let total = (a.len() + b.len()) as f64;
    (total - distance) / total
}

/// Weighted line similarity considering both content and context.
///
/// Returns `(accepted, synthetic_similarity)` for the 1-based line pair.
/// Blank-against-blank pairs with differing raw content are rejected
/// outright (an identical blank keeps cost zero), as is any pair where
/// exactly one raw line is empty.
pub(crate) fn weighted_line_sim(
    src_line_no: usize,
    dest_line_no: usize,
    src_lines: &[&str],
    dest_lines: &[&str],
    opts: &BdiffOptions,
) -> (bool, f64) {
    let ctx = opts.ctx_length;
    let src_raw = src_lines[src_line_no - 1];
    let dest_raw = dest_lines[dest_line_no - 1];

    let line_sim = if src_raw.trim().is_empty() && dest_raw.trim().is_empty() {
        if src_raw == dest_raw {
            return (false, 0.0);
        }
        1.0
    } else if src_raw.is_empty() || dest_raw.is_empty() {
        return (false, 0.0);
    } else {
        levenshtein_ratio(src_raw.trim(), dest_raw.trim())
    };

    let src_upper = &src_lines[src_line_no.saturating_sub(ctx + 1)..src_line_no - 1];
    let src_under = &src_lines[src_line_no..(src_line_no + ctx).min(src_lines.len())];
    let dest_upper = &dest_lines[dest_line_no.saturating_sub(ctx + 1)..dest_line_no - 1];
    let dest_under = &dest_lines[dest_line_no..(dest_line_no + ctx).min(dest_lines.len())];

    let upper_pairs = src_upper.iter().zip(dest_upper.iter());
    let under_pairs = src_under.iter().zip(dest_under.iter());

    let total = src_upper.len().min(dest_upper.len()) + src_under.len().min(dest_under.len());
    if total == 0 {
        return (line_sim >= opts.sim_threshold, round3(line_sim));
    }

    let matched = upper_pairs
        .chain(under_pairs)
        .filter(|(s, d)| s.trim() == d.trim())
        .count();
    let ctx_sim = matched as f64 / total as f64;
    let synthetic = line_sim * opts.line_sim_weight + ctx_sim * (1.0 - opts.line_sim_weight);
    (synthetic >= opts.sim_threshold, round3(synthetic))
}

/// Similarity between the surrounding contexts of two blocks.
pub(crate) fn context_similarity(
    src_start: usize,
    dest_start: usize,
    block_length: usize,
    src_lines: &[&str],
    dest_lines: &[&str],
) -> f64 {
    let src_context = build_context(src_start, block_length, src_lines);
    let dest_context = build_context(dest_start, block_length, dest_lines);
    levenshtein_ratio(&src_context, &dest_context)
}

/// Concatenate up to 4 non-blank lines above and below a block into one
/// space-separated context string.
fn build_context(start: usize, block_length: usize, lines: &[&str]) -> String {
    let mut context = String::new();

    let mut taken = 1;
    let mut ptr = start as i64 - 2;
    while taken < 5 && ptr >= 0 {
        let line = lines[ptr as usize].trim();
        if line.is_empty() {
            ptr -= 1;
            continue;
        }
        context = format!("{line} {context}");
        ptr -= 1;
        taken += 1;
    }

    let mut taken = 1;
    let mut ptr = start + block_length - 1;
    while taken < 5 && ptr < lines.len() {
        let line = lines[ptr].trim();
        if line.is_empty() {
            ptr += 1;
            continue;
        }
        context.push(' ');
        context.push_str(line);
        ptr += 1;
        taken += 1;
    }

    context
}

/// True if the string contains only punctuation-class characters.
/// The empty string counts as pure punctuation.
pub(crate) fn is_pure_punctuation(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r#"^[~`!@#$%^&*()-_+={}\[\]|\\:;"'<,>.?/\n\s]+$"#)
            .expect("punctuation pattern is valid")
    });
    s.is_empty() || re.is_match(s)
}

/// Which block mode a candidate or residual belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockMode {
    Move,
    Copy,
    Update,
}

/// Effective block length: pairs where both raw lines are empty never
/// count, and punctuation-only pairs are excluded unless the mode's
/// contain-punc option says otherwise.
pub(crate) fn pure_block_len(
    block_length: usize,
    src_start: usize,
    src_lines: &[&str],
    dest_start: usize,
    dest_lines: &[&str],
    mode: BlockMode,
    opts: &BdiffOptions,
) -> usize {
    let exclude_punc = match mode {
        BlockMode::Move => !opts.pure_mv_block_contain_punc,
        BlockMode::Copy => !opts.pure_cp_block_contain_punc,
        BlockMode::Update => false,
    };

    let mut pure = block_length;
    for i in 0..block_length {
        let s = src_lines[src_start - 1 + i];
        let d = dest_lines[dest_start - 1 + i];
        if s.is_empty() && d.is_empty() {
            pure -= 1;
        } else if exclude_punc && is_pure_punctuation(s) && is_pure_punctuation(d) {
            pure -= 1;
        }
    }
    pure
}

/// Round to three decimal places (scores are reported rounded).
pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
