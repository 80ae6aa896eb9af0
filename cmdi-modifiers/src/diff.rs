//! Line diffs between two serialized records.
//!
//! Records are pretty-printed before diffing, so a line diff shows
//! structural changes neatly.
use std::fmt::Write;

/// Lines of context around each change used by the pipeline.
pub const DEFAULT_CONTEXT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

impl Op {
    fn is_change(self) -> bool {
        !matches!(self, Op::Equal(..))
    }

    fn in_original(self) -> bool {
        matches!(self, Op::Equal(..) | Op::Delete(..))
    }

    fn in_modified(self) -> bool {
        matches!(self, Op::Equal(..) | Op::Insert(..))
    }
}

/// A unified diff of `original` against `modified`, with `context` lines
/// around every change. Identical inputs give an empty string.
pub fn line_diff(original: &str, modified: &str, context: usize) -> String {
    let original: Vec<&str> = original.lines().collect();
    let modified: Vec<&str> = modified.lines().collect();
    let ops = edit_script(&original, &modified);

    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.is_change())
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = changes.first() else {
        return String::new();
    };

    let mut out = String::from("--- original\n+++ modified\n");
    let mut start = first.saturating_sub(context);
    let mut end = (first + context + 1).min(ops.len());
    for &change in &changes[1..] {
        if change.saturating_sub(context) <= end {
            end = (change + context + 1).min(ops.len());
        } else {
            render_hunk(&mut out, &ops, start, end, &original, &modified);
            start = change.saturating_sub(context);
            end = (change + context + 1).min(ops.len());
        }
    }
    render_hunk(&mut out, &ops, start, end, &original, &modified);
    out
}

// Longest common subsequence, walked front to back.
fn edit_script(original: &[&str], modified: &[&str]) -> Vec<Op> {
    let (n, m) = (original.len(), modified.len());
    let mut lengths = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if original[i] == modified[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if original[i] == modified[j] {
            ops.push(Op::Equal(i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            ops.push(Op::Delete(i));
            i += 1;
        } else {
            ops.push(Op::Insert(j));
            j += 1;
        }
    }
    ops.extend((i..n).map(Op::Delete));
    ops.extend((j..m).map(Op::Insert));
    ops
}

fn render_hunk(
    out: &mut String,
    ops: &[Op],
    start: usize,
    end: usize,
    original: &[&str],
    modified: &[&str],
) {
    let before = &ops[..start];
    let hunk = &ops[start..end];
    let original_before = before.iter().filter(|op| op.in_original()).count();
    let modified_before = before.iter().filter(|op| op.in_modified()).count();
    let original_len = hunk.iter().filter(|op| op.in_original()).count();
    let modified_len = hunk.iter().filter(|op| op.in_modified()).count();
    let _ = writeln!(
        out,
        "@@ -{} +{} @@",
        range(original_before, original_len),
        range(modified_before, modified_len)
    );
    for op in hunk {
        let _ = match *op {
            Op::Equal(i, _) => writeln!(out, " {}", original[i]),
            Op::Delete(i) => writeln!(out, "-{}", original[i]),
            Op::Insert(j) => writeln!(out, "+{}", modified[j]),
        };
    }
}

fn range(before: usize, len: usize) -> String {
    // an empty range is given by the line before it
    let start = if len == 0 { before } else { before + 1 };
    format!("{start},{len}")
}
