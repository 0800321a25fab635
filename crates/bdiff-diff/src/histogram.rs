//! Histogram diff algorithm.
//!
//! A variant of patience diff that uses occurrence counting to pick the
//! rarest matching line as a pivot. Tends to produce more readable diffs
//! for code changes.

use std::collections::HashMap;

use super::{common_affixes, line_hash, push_all_deletes, push_all_inserts, Edit, EditOp};

/// Maximum recursion depth before falling back to Myers.
const MAX_RECURSION: usize = 64;

/// Compute a diff using the histogram algorithm.
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

    let mut edits = Vec::new();
    recurse(old, new, 0, 0, &mut edits, 0);
    edits
}

fn recurse(
    old: &[&str],
    new: &[&str],
    old_offset: usize,
    new_offset: usize,
    edits: &mut Vec<Edit>,
    depth: usize,
) {
    if old.is_empty() && new.is_empty() {
        return;
    }

    if depth >= MAX_RECURSION {
        for mut e in super::myers::diff(old, new) {
            e.old_index += old_offset;
            e.new_index += new_offset;
            edits.push(e);
        }
        return;
    }

    if old.is_empty() {
        push_all_inserts(edits, new.len(), old_offset, new_offset);
        return;
    }
    if new.is_empty() {
        push_all_deletes(edits, old.len(), old_offset, new_offset);
        return;
    }

    let (prefix_len, suffix_len) = common_affixes(old, new);

    for i in 0..prefix_len {
        edits.push(Edit {
            op: EditOp::Equal,
            old_index: old_offset + i,
            new_index: new_offset + i,
        });
    }

    let old_mid = &old[prefix_len..old.len() - suffix_len];
    let new_mid = &new[prefix_len..new.len() - suffix_len];
    let mid_old_offset = old_offset + prefix_len;
    let mid_new_offset = new_offset + prefix_len;

    if old_mid.is_empty() && new_mid.is_empty() {
        // Only prefix/suffix, no middle
    } else if old_mid.is_empty() {
        push_all_inserts(edits, new_mid.len(), mid_old_offset, mid_new_offset);
    } else if new_mid.is_empty() {
        push_all_deletes(edits, old_mid.len(), mid_old_offset, mid_new_offset);
    } else if let Some((oi, ni)) = find_pivot(old_mid, new_mid) {
        recurse(
            &old_mid[..oi],
            &new_mid[..ni],
            mid_old_offset,
            mid_new_offset,
            edits,
            depth + 1,
        );

        edits.push(Edit {
            op: EditOp::Equal,
            old_index: mid_old_offset + oi,
            new_index: mid_new_offset + ni,
        });

        recurse(
            &old_mid[oi + 1..],
            &new_mid[ni + 1..],
            mid_old_offset + oi + 1,
            mid_new_offset + ni + 1,
            edits,
            depth + 1,
        );
    } else {
        // No common line: everything is a change
        push_all_deletes(edits, old_mid.len(), mid_old_offset, mid_new_offset);
        push_all_inserts(edits, new_mid.len(), mid_old_offset + old_mid.len(), mid_new_offset);
    }

    for i in 0..suffix_len {
        edits.push(Edit {
            op: EditOp::Equal,
            old_index: old.len() - suffix_len + old_offset + i,
            new_index: new.len() - suffix_len + new_offset + i,
        });
    }
}

/// Find the lowest-occurrence line of `old` that also appears in `new`.
fn find_pivot(old: &[&str], new: &[&str]) -> Option<(usize, usize)> {
    // hash -> (occurrence count, indices in old)
    let mut histogram: HashMap<u64, (usize, Vec<usize>)> = HashMap::new();
    for (i, line) in old.iter().enumerate() {
        let entry = histogram.entry(line_hash(line)).or_insert((0, Vec::new()));
        entry.0 += 1;
        entry.1.push(i);
    }

    let mut best_count = usize::MAX;
    let mut best = None;

    for (j, line) in new.iter().enumerate() {
        if let Some((count, indices)) = histogram.get(&line_hash(line)) {
            // Verify actual content match (hash collision check)
            for &oi in indices {
                if old[oi] == *line && *count < best_count {
                    best_count = *count;
                    best = Some((oi, j));
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical() {
        let a = vec!["a", "b", "c"];
        let b = vec!["a", "b", "c"];
        let edits = diff(&a, &b);
        assert!(edits.iter().all(|e| e.op == EditOp::Equal));
        assert_eq!(edits.len(), 3);
    }

    #[test]
    fn insert_line() {
        let a = vec!["a", "c"];
        let b = vec!["a", "b", "c"];
        let edits = diff(&a, &b);
        let inserts = edits.iter().filter(|e| e.op == EditOp::Insert).count();
        assert_eq!(inserts, 1);
    }

    #[test]
    fn delete_line() {
        let a = vec!["a", "b", "c"];
        let b = vec!["a", "c"];
        let edits = diff(&a, &b);
        let deletes = edits.iter().filter(|e| e.op == EditOp::Delete).count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn empty_inputs() {
        let empty: Vec<&str> = vec![];
        let a = vec!["x"];
        assert!(diff(&empty, &empty).is_empty());
        assert_eq!(diff(&empty, &a).len(), 1);
        assert_eq!(diff(&a, &empty).len(), 1);
    }

    #[test]
    fn moved_block_produces_delete_and_insert() {
        // The raw differ has no move notion; a moved line shows up as one
        // delete and one insert around a rare pivot.
        let a = vec!["foo", "bar", "baz"];
        let b = vec!["baz", "foo", "bar"];
        let edits = diff(&a, &b);
        let deletes = edits.iter().filter(|e| e.op == EditOp::Delete).count();
        let inserts = edits.iter().filter(|e| e.op == EditOp::Insert).count();
        assert_eq!(deletes, inserts);
        assert!(deletes >= 1);
    }

    #[test]
    fn rare_line_is_pivot() {
        let a = vec!["x", "common", "common", "unique", "common"];
        let b = vec!["unique", "common", "y"];
        let edits = diff(&a, &b);
        // "unique" must survive as an Equal pairing.
        let equal_unique = edits.iter().any(|e| {
            e.op == EditOp::Equal && a[e.old_index] == "unique" && b[e.new_index] == "unique"
        });
        assert!(equal_unique);
    }

    #[test]
    fn edits_are_ordered() {
        let a = vec!["a", "b", "c", "d"];
        let b = vec!["a", "c", "b", "d"];
        let edits = diff(&a, &b);
        let mut last_old = 0;
        let mut last_new = 0;
        for e in &edits {
            match e.op {
                EditOp::Equal => {
                    assert!(e.old_index >= last_old && e.new_index >= last_new);
                    last_old = e.old_index + 1;
                    last_new = e.new_index + 1;
                }
                EditOp::Delete => {
                    assert!(e.old_index >= last_old);
                    last_old = e.old_index + 1;
                }
                EditOp::Insert => {
                    assert!(e.new_index >= last_new);
                    last_new = e.new_index + 1;
                }
            }
        }
    }
}
