//! Intra-line difference regions for update records.
//!
//! Finds the changed slice of each side of an updated line by stripping
//! the longest common prefix and suffix, then shifts the reported
//! offsets by the line's leading-whitespace character count so they are
//! absolute column positions.

use serde::Serialize;

use crate::line_index::LineRecord;

/// Changed character ranges of an updated line pair.
///
/// Each side holds an inclusive `[start, end]` character range, or `None`
/// when that side has no changed region. When the stripped contents are
/// identical (an indentation-only update), both sides cover the full
/// leading-whitespace span, which may be empty (`[0, -1]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrDiff {
    pub src: Option<[i64; 2]>,
    pub dest: Option<[i64; 2]>,
}

/// Length of the longest common prefix of two char sequences, capped.
fn common_prefix(a: &[char], b: &[char], max: usize) -> usize {
    // Binary search on the prefix length: the predicate
    // "a[..k] == b[..k]" is monotone.
    let mut low = 0;
    let mut high = max;
    while low < high {
        let mid = (low + high) >> 1;
        if a[low..=mid] == b[low..=mid] {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// Common prefix and suffix lengths; the suffix is clamped so the two
/// never overlap.
fn affix_lengths(a: &[char], b: &[char]) -> (usize, usize) {
    let min_len = a.len().min(b.len());

    let left = common_prefix(a, b, min_len);

    let a_rev: Vec<char> = a.iter().rev().copied().collect();
    let b_rev: Vec<char> = b.iter().rev().copied().collect();
    let right = common_prefix(&a_rev, &b_rev, min_len);

    (left, right.min(min_len - left))
}

/// The changed region of each side as inclusive char ranges, or None for
/// a side entirely covered by the common affixes.
fn changed_areas(a: &str, b: &str) -> (Option<[i64; 2]>, Option<[i64; 2]>) {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (start, end) = affix_lengths(&a_chars, &b_chars);

    let area = |len: usize| -> Option<[i64; 2]> {
        let lo = start as i64;
        let hi = len as i64 - end as i64 - 1;
        (lo <= hi).then_some([lo, hi])
    };

    (area(a_chars.len()), area(b_chars.len()))
}

/// Build the reported difference ranges for an update, shifting by each
/// line's leading-whitespace character count.
pub(crate) fn build_str_diff(src: &LineRecord, dest: &LineRecord) -> StrDiff {
    let (src_area, dest_area) = changed_areas(&src.text, &dest.text);
    let src_ws = (src.indent.spaces + src.indent.tabs) as i64;
    let dest_ws = (dest.indent.spaces + dest.indent.tabs) as i64;

    if src_area.is_none() && dest_area.is_none() {
        // Stripped contents are identical: report the whitespace spans.
        return StrDiff {
            src: Some([0, src_ws - 1]),
            dest: Some([0, dest_ws - 1]),
        };
    }

    StrDiff {
        src: src_area.map(|[lo, hi]| [lo + src_ws, hi + src_ws]),
        dest: dest_area.map(|[lo, hi]| [lo + dest_ws, hi + dest_ws]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_index::{compute_indent, LineRecord, Origin};

    fn record(raw: &str) -> LineRecord {
        LineRecord {
            text: raw.trim_start().to_string(),
            indent: compute_indent(raw, 4),
            origin: Origin::Removed,
            hunk: 1,
        }
    }

    #[test]
    fn middle_change() {
        let diff = build_str_diff(&record("int x = 1;"), &record("int x = 2;"));
        assert_eq!(diff.src, Some([8, 8]));
        assert_eq!(diff.dest, Some([8, 8]));
    }

    #[test]
    fn change_shifted_by_indent() {
        let diff = build_str_diff(&record("  int x = 1;"), &record("  int x = 2;"));
        assert_eq!(diff.src, Some([10, 10]));
        assert_eq!(diff.dest, Some([10, 10]));
    }

    #[test]
    fn pure_insertion_on_one_side() {
        let diff = build_str_diff(&record("ab"), &record("axb"));
        assert_eq!(diff.src, None);
        assert_eq!(diff.dest, Some([1, 1]));
    }

    #[test]
    fn indentation_only_update() {
        let diff = build_str_diff(&record("    foo"), &record("  foo"));
        assert_eq!(diff.src, Some([0, 3]));
        assert_eq!(diff.dest, Some([0, 1]));
    }

    #[test]
    fn everything_differs() {
        let diff = build_str_diff(&record("abc"), &record("xyz"));
        assert_eq!(diff.src, Some([0, 2]));
        assert_eq!(diff.dest, Some([0, 2]));
    }

    #[test]
    fn suffix_clamped_against_prefix() {
        // "aa" vs "aaa": prefix 2 exhausts the shorter side; the suffix
        // cannot claim the same characters again.
        let diff = build_str_diff(&record("aa"), &record("aaa"));
        assert_eq!(diff.src, None);
        assert_eq!(diff.dest, Some([2, 2]));
    }
}
