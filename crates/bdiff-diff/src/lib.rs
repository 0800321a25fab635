//! Raw line differ: Myers and histogram algorithms.
//!
//! Produces a keep/remove/insert edit script between two line sequences.
//! The semantic engine consumes this script as its oracle; any differ
//! producing the same contract (ordered edits with 0-width context) can be
//! substituted.

pub mod histogram;
pub mod myers;

/// An edit operation in the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Line present in both old and new (equal).
    Equal,
    /// Line inserted (present only in new).
    Insert,
    /// Line deleted (present only in old).
    Delete,
}

/// A single edit in the edit script, referencing lines by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    /// The operation.
    pub op: EditOp,
    /// Index into the old sequence (meaningful for Equal and Delete).
    pub old_index: usize,
    /// Index into the new sequence (meaningful for Equal and Insert).
    pub new_index: usize,
}

/// Available line-diff algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffAlgorithm {
    /// Histogram diff (default; occurrence-counted pivot matching).
    #[default]
    Histogram,
    /// Myers O(ND) algorithm.
    Myers,
}

impl std::str::FromStr for DiffAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Histogram" | "histogram" => Ok(Self::Histogram),
            "Myers" | "myers" => Ok(Self::Myers),
            other => Err(format!("unknown diff algorithm: {other}")),
        }
    }
}

/// Compute a line-level diff between two line sequences.
///
/// Returns the ordered list of edits transforming `old` into `new`.
pub fn diff_lines(old: &[&str], new: &[&str], algorithm: DiffAlgorithm) -> Vec<Edit> {
    match algorithm {
        DiffAlgorithm::Histogram => histogram::diff(old, new),
        DiffAlgorithm::Myers => myers::diff(old, new),
    }
}

/// Compute a hash for a line (used for fast comparison).
/// Uses DJB2a (xor variant) matching xdiff's approach.
pub(crate) fn line_hash(line: &str) -> u64 {
    let mut hash: u64 = 5381;
    for &b in line.as_bytes() {
        hash = hash.wrapping_mul(33) ^ (b as u64);
    }
    hash
}

/// Length of the common prefix and suffix of two sequences.
///
/// The suffix is measured on the tails that remain after removing the
/// prefix, so `prefix + suffix` never exceeds either length.
pub(crate) fn common_affixes(old: &[&str], new: &[&str]) -> (usize, usize) {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    (prefix, suffix)
}

/// Emit one Insert edit per new line, anchored at `old_offset`.
pub(crate) fn push_all_inserts(
    edits: &mut Vec<Edit>,
    count: usize,
    old_offset: usize,
    new_offset: usize,
) {
    for j in 0..count {
        edits.push(Edit {
            op: EditOp::Insert,
            old_index: old_offset,
            new_index: new_offset + j,
        });
    }
}

/// Emit one Delete edit per old line, anchored at `new_offset`.
pub(crate) fn push_all_deletes(
    edits: &mut Vec<Edit>,
    count: usize,
    old_offset: usize,
    new_offset: usize,
) {
    for i in 0..count {
        edits.push(Edit {
            op: EditOp::Delete,
            old_index: old_offset + i,
            new_index: new_offset,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_hash_deterministic() {
        assert_eq!(line_hash("hello"), line_hash("hello"));
        assert_ne!(line_hash("hello"), line_hash("world"));
    }

    #[test]
    fn affixes_disjoint() {
        let a = vec!["a", "b", "c"];
        let b = vec!["x", "y"];
        assert_eq!(common_affixes(&a, &b), (0, 0));
    }

    #[test]
    fn affixes_identical() {
        let a = vec!["a", "b"];
        let b = vec!["a", "b"];
        assert_eq!(common_affixes(&a, &b), (2, 0));
    }

    #[test]
    fn affixes_overlap_bounded() {
        // Prefix consumes the shared region first; suffix cannot reuse it.
        let a = vec!["a", "a"];
        let b = vec!["a", "a", "a"];
        let (p, s) = common_affixes(&a, &b);
        assert!(p + s <= a.len());
        assert_eq!(p, 2);
        assert_eq!(s, 0);
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!(
            "Histogram".parse::<DiffAlgorithm>().unwrap(),
            DiffAlgorithm::Histogram
        );
        assert_eq!(
            "Myers".parse::<DiffAlgorithm>().unwrap(),
            DiffAlgorithm::Myers
        );
        assert!("Patience".parse::<DiffAlgorithm>().is_err());
    }

    #[test]
    fn dispatch_matches_algorithms() {
        let a = vec!["a", "b", "c"];
        let b = vec!["a", "c"];
        for algo in [DiffAlgorithm::Histogram, DiffAlgorithm::Myers] {
            let edits = diff_lines(&a, &b, algo);
            let deletes = edits.iter().filter(|e| e.op == EditOp::Delete).count();
            let inserts = edits.iter().filter(|e| e.op == EditOp::Insert).count();
            assert_eq!(deletes, 1, "{algo:?}");
            assert_eq!(inserts, 0, "{algo:?}");
        }
    }
}
