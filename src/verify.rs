//! Whole-forest consistency checks.
//!
//! [`verify_forest`] reads every row once, ordered by `left`, and replays the
//! forest with an explicit stack of open intervals. It never mutates the
//! store, so it can run inside a write transaction right after a mutation or
//! against a read-only connection.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::TreeNode;
use crate::store::{Predicate, TreeStore};
use crate::types::{Interval, NodeId, Result};

const MAX_FINDINGS: usize = 32;

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Informational message about the verification process.
    Info,
    /// Broken invariant.
    Error,
}

/// A single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Info,
            message: message.into(),
        }
    }
}

/// Statistics collected while walking the forest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyCounts {
    /// Rows read from the store.
    pub nodes: u64,
    /// Rows without a parent reference.
    pub roots: u64,
    /// Deepest stored level.
    pub max_level: i64,
}

/// Outcome of [`verify_forest`].
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Whether no error finding was recorded.
    pub success: bool,
    /// Issues discovered, capped at 32 entries.
    pub findings: Vec<VerifyFinding>,
    /// Statistics about the rows examined.
    pub counts: VerifyCounts,
}

struct Open {
    id: NodeId,
    span: Interval,
    cursor: i64,
    visited_at: usize,
}

/// Checks every structural invariant of the forest held by `store`.
///
/// The following are reported as error findings:
///
/// - intervals with `left < 1`, `right <= left`, or an odd width
/// - boundary values that are not exactly `1..=2N`
/// - intervals that partially overlap instead of nesting
/// - gaps between siblings, or children that do not fill their parent
/// - widths that disagree with the number of descendants
/// - parent references that disagree with containment, or that dangle
/// - levels that disagree with nesting depth
///
/// # Errors
///
/// Only store errors; broken invariants are reported, not returned.
pub fn verify_forest<S: TreeStore>(store: &S) -> Result<VerifyReport> {
    let rows = store.scan(&Predicate::all())?;
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();

    let ids: HashSet<NodeId> = rows.iter().map(TreeNode::id).collect();
    for node in &rows {
        let span = node.interval();
        counts.nodes += 1;
        counts.max_level = counts.max_level.max(span.level);
        match node.parent_id() {
            None => counts.roots += 1,
            Some(parent) if !ids.contains(&parent) => push_error(
                &mut findings,
                format!("node {} references missing parent {parent}", node.id()),
            ),
            Some(_) => {}
        }
        if span.left < 1 || span.right <= span.left || span.width() % 2 != 0 {
            push_error(
                &mut findings,
                format!("node {} has malformed interval {span}", node.id()),
            );
        }
    }

    check_packing(&rows, &mut findings);
    walk(&rows, &mut findings);

    if findings.len() >= MAX_FINDINGS {
        findings.truncate(MAX_FINDINGS - 1);
        findings.push(VerifyFinding::info("additional findings truncated"));
    }
    let success = !findings
        .iter()
        .any(|finding| finding.severity == VerifySeverity::Error);
    Ok(VerifyReport {
        success,
        findings,
        counts,
    })
}

fn check_packing<N: TreeNode>(rows: &[N], findings: &mut Vec<VerifyFinding>) {
    let mut values: Vec<i64> = rows
        .iter()
        .flat_map(|node| {
            let span = node.interval();
            [span.left, span.right]
        })
        .collect();
    values.sort_unstable();
    for (expected, actual) in (1..).zip(values.iter().copied()) {
        if expected != actual {
            push_error(
                findings,
                format!("boundary values are not dense: expected {expected}, found {actual}"),
            );
            return;
        }
    }
}

fn walk<N: TreeNode>(rows: &[N], findings: &mut Vec<VerifyFinding>) {
    let mut stack: Vec<Open> = Vec::new();
    let mut top_cursor = 1;

    for (idx, node) in rows.iter().enumerate() {
        let span = node.interval();
        while stack.last().is_some_and(|open| open.span.right < span.left) {
            close(&mut stack, &mut top_cursor, idx, findings);
        }

        if let Some(open) = stack.last() {
            if span.right >= open.span.right {
                push_error(
                    findings,
                    format!(
                        "node {} {span} partially overlaps node {} {}",
                        node.id(),
                        open.id,
                        open.span
                    ),
                );
                continue;
            }
        }

        let expected_left = stack.last().map_or(top_cursor, |open| open.cursor);
        if span.left != expected_left {
            push_error(
                findings,
                format!(
                    "node {} starts at {} but the previous sibling ends at {}",
                    node.id(),
                    span.left,
                    expected_left - 1
                ),
            );
        }

        let structural_parent = stack.last().map(|open| open.id);
        if node.parent_id() != structural_parent {
            push_error(
                findings,
                format!(
                    "node {} references parent {:?} but is nested in {:?}",
                    node.id(),
                    node.parent_id().map(|id| id.0),
                    structural_parent.map(|id| id.0)
                ),
            );
        }

        let depth = stack.len() as i64;
        if span.level != depth {
            push_error(
                findings,
                format!(
                    "node {} has level {} at nesting depth {depth}",
                    node.id(),
                    span.level
                ),
            );
        }

        stack.push(Open {
            id: node.id(),
            span,
            cursor: span.left + 1,
            visited_at: idx,
        });
    }

    while !stack.is_empty() {
        close(&mut stack, &mut top_cursor, rows.len(), findings);
    }
}

fn close(
    stack: &mut Vec<Open>,
    top_cursor: &mut i64,
    visited: usize,
    findings: &mut Vec<VerifyFinding>,
) {
    let Some(open) = stack.pop() else {
        return;
    };
    if open.cursor != open.span.right {
        push_error(
            findings,
            format!(
                "children of node {} end at {} but its interval closes at {}",
                open.id,
                open.cursor - 1,
                open.span.right
            ),
        );
    }
    let descendants = (visited - open.visited_at - 1) as i64;
    if open.span.descendant_count() != descendants {
        push_error(
            findings,
            format!(
                "node {} spans {} but has {descendants} descendant(s)",
                open.id, open.span
            ),
        );
    }
    let next = open.span.right + 1;
    match stack.last_mut() {
        Some(parent) => parent.cursor = next,
        None => *top_cursor = next,
    }
}

fn push_error(findings: &mut Vec<VerifyFinding>, message: impl Into<String>) {
    if findings.len() < MAX_FINDINGS {
        findings.push(VerifyFinding::error(message));
    }
}
