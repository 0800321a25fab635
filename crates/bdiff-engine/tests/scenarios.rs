//! Boundary scenarios and output-contract tests.
//!
//! Each test pins the exact records (positions and action wording) the
//! engine must emit for a small input pair.

use bdiff_engine::{bdiff, BdiffOptions, EditRecord, MoveType};

fn run(src: &[&str], dest: &[&str]) -> Vec<EditRecord> {
    bdiff(src, dest, &BdiffOptions::default())
}

#[test]
fn identical_files() {
    assert_eq!(run(&["a", "b"], &["a", "b"]), vec![]);
}

#[test]
fn single_delete() {
    let records = run(&["a", "b", "c"], &["a", "c"]);
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
fn single_insert() {
    let records = run(&["x"], &["x", "y"]);
    assert_eq!(
        records,
        vec![EditRecord::Insert {
            src_line: 2,
            dest_line: 2,
            edit_action: "Insert line 2".into(),
        }]
    );
}

#[test]
fn two_line_block_move() {
    let records = run(&["foo", "bar", "baz"], &["baz", "foo", "bar"]);
    assert_eq!(records.len(), 1);
    match &records[0] {
        EditRecord::Move {
            src_line,
            dest_line,
            block_length,
            indent_offset,
            move_type,
            edit_action,
            updates,
        } => {
            assert_eq!(*src_line, 1);
            assert_eq!(*dest_line, 2);
            assert_eq!(*block_length, 2);
            assert_eq!(*indent_offset, 0);
            assert_eq!(*move_type, MoveType::Down);
            assert_eq!(edit_action, "Move a 2-line block from line 1 to line 2");
            assert!(updates.is_empty());
        }
        other => panic!("expected a move, got {other:?}"),
    }
}

#[test]
fn one_to_two_split() {
    let records = run(&["hello world"], &["hello", "world"]);
    assert_eq!(
        records,
        vec![EditRecord::Split {
            src_line: 1,
            dest_line: 1,
            block_length: 2,
            edit_action: "Split line 1 to lines 1-2".into(),
        }]
    );
}

#[test]
fn two_to_one_merge() {
    let records = run(&["hello", "world"], &["hello world"]);
    assert_eq!(
        records,
        vec![EditRecord::Merge {
            src_line: 1,
            dest_line: 1,
            block_length: 2,
            edit_action: "Merge lines 1-2 to line 1".into(),
        }]
    );
}

#[test]
fn single_line_update() {
    let records = run(&["int x=1;", "int x=2;"], &["int x=1;", "int x=3;"]);
    assert_eq!(records.len(), 1);
    match &records[0] {
        EditRecord::Update {
            src_line,
            dest_line,
            indent_offset,
            str_diff,
            edit_action,
        } => {
            assert_eq!(*src_line, 2);
            assert_eq!(*dest_line, 2);
            assert_eq!(*indent_offset, 0);
            assert_eq!(edit_action, "Update line 2 to line 2");
            assert_eq!(str_diff.src, Some([6, 6]));
            assert_eq!(str_diff.dest, Some([6, 6]));
        }
        EditRecord::CUpdate { src_line, dest_line, .. } => {
            assert_eq!(*src_line, 2);
            assert_eq!(*dest_line, 2);
        }
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn move_with_indent_shift() {
    let src = ["alpha body", "beta body", "gamma", "tail"];
    let dest = ["gamma", "tail", "    alpha body", "    beta body"];
    let records = run(&src, &dest);
    let mv = records
        .iter()
        .find_map(|r| match r {
            EditRecord::Move {
                src_line,
                dest_line,
                block_length,
                indent_offset,
                edit_action,
                ..
            } => Some((*src_line, *dest_line, *block_length, *indent_offset, edit_action.clone())),
            _ => None,
        })
        .expect("a move record");
    assert_eq!(mv.0, 1);
    assert_eq!(mv.1, 3);
    assert_eq!(mv.2, 2);
    assert_eq!(mv.3, 4);
    assert_eq!(
        mv.4,
        "Move a 2-line block from line 1 to line 3 with moving right 4 whitespaces."
    );
}

#[test]
fn move_with_intra_block_update_emits_m_update() {
    let src = ["alpha one", "beta two", "gamma", "tail"];
    let dest = ["gamma", "tail", "alpha one", "beta twoX"];
    let records = run(&src, &dest);
    let mv = records
        .iter()
        .find(|r| matches!(r, EditRecord::Move { .. }))
        .expect("move record");
    if let EditRecord::Move { updates, .. } = mv {
        assert_eq!(updates, &vec![(2, 4)]);
    }
    let mu = records
        .iter()
        .find(|r| matches!(r, EditRecord::MUpdate { .. }))
        .expect("m_update record");
    if let EditRecord::MUpdate {
        src_line,
        dest_line,
        edit_action,
        ..
    } = mu
    {
        assert_eq!(*src_line, 2);
        assert_eq!(*dest_line, 4);
        assert_eq!(edit_action, "Update line 2 to line 4");
    }
}

#[test]
fn copied_block_keeps_source_and_emits_copy() {
    let src = ["fn helper() {", "    body();", "}", "main"];
    let dest = [
        "fn helper() {",
        "    body();",
        "}",
        "main",
        "fn helper() {",
        "    body();",
        "}",
    ];
    let records = run(&src, &dest);
    let copy = records
        .iter()
        .find(|r| matches!(r, EditRecord::Copy { .. }))
        .expect("copy record");
    if let EditRecord::Copy {
        src_line,
        dest_line,
        block_length,
        indent_offset,
        edit_action,
        ..
    } = copy
    {
        assert_eq!(*src_line, 1);
        assert_eq!(*dest_line, 5);
        assert_eq!(*block_length, 3);
        assert_eq!(*indent_offset, 0);
        assert_eq!(edit_action, "Copy a 3-line block from line 1 to line 5");
    }
    // The copied source lines are kept lines; no deletes appear.
    assert!(records
        .iter()
        .all(|r| !matches!(r, EditRecord::Delete { .. })));
}

#[test]
fn disabled_split_detector_is_silent() {
    let opts = BdiffOptions {
        identify_split: false,
        ..Default::default()
    };
    let records = bdiff(&["hello world"], &["hello", "world"], &opts);
    assert!(records
        .iter()
        .all(|r| !matches!(r, EditRecord::Split { .. })));
    assert!(!records.is_empty());
}

#[test]
fn disabled_move_detector_falls_back_to_delete_insert() {
    let opts = BdiffOptions {
        identify_move: false,
        identify_copy: false,
        identify_update: false,
        ..Default::default()
    };
    let records = bdiff(&["foo", "bar", "baz"], &["baz", "foo", "bar"], &opts);
    assert!(records.iter().all(|r| matches!(
        r,
        EditRecord::Delete { .. } | EditRecord::Insert { .. }
    )));
    assert_eq!(
        records
            .iter()
            .filter(|r| matches!(r, EditRecord::Delete { .. }))
            .count(),
        2
    );
    assert_eq!(
        records
            .iter()
            .filter(|r| matches!(r, EditRecord::Insert { .. }))
            .count(),
        2
    );
}

#[test]
fn deletes_reposition_before_neighboring_inserts() {
    // A hunk replacing two unrelated lines with two unrelated lines
    // yields deletes and inserts; every delete sorted before an insert
    // with a larger source line must not report a larger dest line.
    let src = ["keep1", "aaa bbb ccc", "ddd eee fff", "keep2"];
    let dest = ["keep1", "zz yy xx", "ww vv uu", "keep2"];
    let records = run(&src, &dest);
    for (i, r) in records.iter().enumerate() {
        if !matches!(r, EditRecord::Delete { .. }) {
            continue;
        }
        for later in &records[i..] {
            if let EditRecord::Insert {
                src_line,
                dest_line,
                ..
            } = later
            {
                if r.src_line() < *src_line {
                    assert!(
                        r.dest_line() <= *dest_line,
                        "delete {r:?} reports a dest line past insert {later:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn empty_files() {
    assert_eq!(run(&[], &[]), vec![]);
    let inserts = run(&[], &["a"]);
    assert_eq!(inserts.len(), 1);
    assert!(matches!(inserts[0], EditRecord::Insert { .. }));
    let deletes = run(&["a"], &[]);
    assert_eq!(deletes.len(), 1);
    assert!(matches!(deletes[0], EditRecord::Delete { .. }));
}

#[test]
fn records_sorted_by_position() {
    let src = ["a", "remove me", "b", "second gone", "c"];
    let dest = ["a", "b", "c", "tail line"];
    let records = run(&src, &dest);
    let keys: Vec<(usize, usize)> = records.iter().map(|r| (r.src_line(), r.dest_line())).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}
