//! Line-level diff between two pipeline stages.
//!
//! The edit script is a shortest edit script over lines (Myers'
//! divide-and-conquer variant), where each line keeps its terminator. Concatenating the retained
//! and inserted lines therefore rebuilds the "after" text byte for byte,
//! including a missing final newline.
//!
//! A `StageDiff` borrows from the two texts it compares; it is a view, not a
//! record, and lives no longer than the stage pair that produced it.

use std::fmt::Write as _;
use std::ops::{Index, IndexMut};

// ─── Edit Script ───────────────────────────────────────────────────

/// One line-level edit operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOp<'a> {
    Retain(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

impl<'a> EditOp<'a> {
    pub fn line(&self) -> &'a str {
        match self {
            EditOp::Retain(l) | EditOp::Delete(l) | EditOp::Insert(l) => l,
        }
    }

    fn is_change(&self) -> bool {
        !matches!(self, EditOp::Retain(_))
    }

    fn prefix(&self) -> char {
        match self {
            EditOp::Retain(_) => ' ',
            EditOp::Delete(_) => '-',
            EditOp::Insert(_) => '+',
        }
    }
}

/// Ordered edit script turning one text into another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageDiff<'a> {
    ops: Vec<EditOp<'a>>,
}

/// Compute a minimal line edit script from `before` to `after`.
///
/// Deterministic: where several minimal scripts exist, deletions are placed
/// ahead of insertions. Runs in space linear in the number of lines.
pub fn diff<'a>(before: &'a str, after: &'a str) -> StageDiff<'a> {
    let a: Vec<&str> = before.split_inclusive('\n').collect();
    let b: Vec<&str> = after.split_inclusive('\n').collect();

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    let bound = max_d(a.len(), b.len());
    let mut vf = V::new(bound);
    let mut vb = V::new(bound);
    conquer(&a, &b, &mut vf, &mut vb, &mut ops);
    deletions_first(&mut ops);
    StageDiff { ops }
}

// ─── Myers ─────────────────────────────────────────────────────────

/// Furthest-reaching x per diagonal `k`, indexed by `k` in `-max_d..=max_d`.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 1],
        }
    }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

fn common_prefix(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[&str], b: &[&str]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Split point `(x, y)` on an optimal path through `a` × `b`, found by
/// running the forward and reverse searches until they overlap.
///
/// Both inputs must be non-empty and differ in their first and last lines.
fn middle_snake(a: &[&str], b: &[&str], vf: &mut V, vb: &mut V) -> Option<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;
    vf[1] = 0;
    vb[1] = 0;

    for d in 0..max_d(n, m) as isize {
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let y = (x as isize - k) as usize;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix(&a[x..], &b[y..]);
            }
            vf[k] = x;
            if odd && (k - delta).abs() <= d - 1 && vf[k] + vb[-(k - delta)] >= n {
                return Some((x0, y0));
            }
        }

        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            if x < n && y < m {
                let advance = common_suffix(&a[..n - x], &b[..m - y]);
                x += advance;
                y += advance;
            }
            vb[k] = x;
            if !odd && (k - delta).abs() <= d && vb[k] + vf[-(k - delta)] >= n {
                return Some((n - x, m - y));
            }
        }
    }
    None
}

fn conquer<'a>(
    a: &[&'a str],
    b: &[&'a str],
    vf: &mut V,
    vb: &mut V,
    ops: &mut Vec<EditOp<'a>>,
) {
    let prefix = common_prefix(a, b);
    ops.extend(a[..prefix].iter().map(|l| EditOp::Retain(*l)));
    let (a, b) = (&a[prefix..], &b[prefix..]);

    let suffix = common_suffix(a, b);
    let (a, tail) = a.split_at(a.len() - suffix);
    let b = &b[..b.len() - suffix];

    let split = if a.is_empty() || b.is_empty() {
        None
    } else {
        middle_snake(a, b, vf, vb)
    };
    match split {
        Some((x, y)) => {
            conquer(&a[..x], &b[..y], vf, vb, ops);
            conquer(&a[x..], &b[y..], vf, vb, ops);
        }
        None => {
            ops.extend(a.iter().map(|l| EditOp::Delete(*l)));
            ops.extend(b.iter().map(|l| EditOp::Insert(*l)));
        }
    }
    ops.extend(tail.iter().map(|l| EditOp::Retain(*l)));
}

/// Within each run of consecutive changes, move deletions ahead of
/// insertions. Replay is unaffected: a run consumes and emits lines in
/// the same order either way.
fn deletions_first(ops: &mut [EditOp<'_>]) {
    let mut i = 0;
    while i < ops.len() {
        if !ops[i].is_change() {
            i += 1;
            continue;
        }
        let start = i;
        while i < ops.len() && ops[i].is_change() {
            i += 1;
        }
        ops[start..i].sort_by_key(|op| matches!(op, EditOp::Insert(_)));
    }
}

impl<'a> StageDiff<'a> {
    pub fn ops(&self) -> &[EditOp<'a>] {
        &self.ops
    }

    pub fn is_unchanged(&self) -> bool {
        !self.ops.iter().any(EditOp::is_change)
    }

    pub fn insertions(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Insert(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Delete(_)))
            .count()
    }

    /// Replay the script against `before`.
    ///
    /// Returns `None` if `before` is not the text the script was computed
    /// from (a retained or deleted line does not match).
    pub fn apply(&self, before: &str) -> Option<String> {
        let mut lines = before.split_inclusive('\n');
        let mut out = String::with_capacity(before.len());
        for op in &self.ops {
            match op {
                EditOp::Retain(l) => {
                    if lines.next()? != *l {
                        return None;
                    }
                    out.push_str(l);
                }
                EditOp::Delete(l) => {
                    if lines.next()? != *l {
                        return None;
                    }
                }
                EditOp::Insert(l) => out.push_str(l),
            }
        }
        if lines.next().is_some() {
            return None;
        }
        Some(out)
    }

    /// Render as a unified diff with `context` lines around each hunk.
    ///
    /// An unchanged pair renders as the empty string.
    pub fn unified(&self, label: &str, context: usize) -> String {
        if self.is_unchanged() {
            return String::new();
        }

        let mut out = String::new();
        let _ = writeln!(out, "--- Before {}", label);
        let _ = writeln!(out, "+++ After {}", label);

        for hunk in self.hunks(context) {
            let (old_start, new_start) = self.positions_at(hunk.start);
            let slice = &self.ops[hunk.start..hunk.end];
            let old_len = slice.iter().filter(|op| !matches!(op, EditOp::Insert(_))).count();
            let new_len = slice.iter().filter(|op| !matches!(op, EditOp::Delete(_))).count();
            let _ = writeln!(
                out,
                "@@ -{} +{} @@",
                format_range(old_start, old_len),
                format_range(new_start, new_len)
            );
            for op in slice {
                out.push(op.prefix());
                out.push_str(op.line());
                if !op.line().ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Group changed ops into hunks, merging ones whose context overlaps.
    fn hunks(&self, context: usize) -> Vec<std::ops::Range<usize>> {
        let mut hunks: Vec<std::ops::Range<usize>> = Vec::new();
        for (idx, op) in self.ops.iter().enumerate() {
            if !op.is_change() {
                continue;
            }
            let start = idx.saturating_sub(context);
            let end = (idx + 1 + context).min(self.ops.len());
            match hunks.last_mut() {
                Some(last) if start <= last.end => last.end = end,
                _ => hunks.push(start..end),
            }
        }
        hunks
    }

    /// Zero-based (old, new) line offsets before op `idx`.
    fn positions_at(&self, idx: usize) -> (usize, usize) {
        let mut old = 0;
        let mut new = 0;
        for op in &self.ops[..idx] {
            match op {
                EditOp::Retain(_) => {
                    old += 1;
                    new += 1;
                }
                EditOp::Delete(_) => old += 1,
                EditOp::Insert(_) => new += 1,
            }
        }
        (old, new)
    }
}

/// Unified-diff range: `start,len`, `start` alone for one line, and the
/// preceding line number for an empty range.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}
