//! Pairwise content combination.
//!
//! Details with equal content keys describe the same evolving fact and
//! are reduced to at most one survivor: a violation and its clearance
//! cancel outright, an override absorbs the violation it closes, and
//! duplicates collapse keeping the earliest provenance. Reduction runs
//! to a fixed point before any batch is assembled, so a digest window
//! containing "violation at 09:00, cleared at 14:00" sends nothing.

use crate::model::{
    DetailPayload, DetailedNotificationContent, PolicyStatus, VulnerabilityPayload,
};

/// Result of combining two elements.
#[derive(Debug, Clone, PartialEq)]
pub enum CombineOutcome<T> {
    /// Both elements annihilate.
    Cancelled,
    /// Both elements are replaced by the merged one.
    Merged(T),
    /// The elements do not interact.
    Unrelated,
}

/// Pairwise combination rule.
///
/// Implementations must be symmetric in outcome kind: swapping the
/// arguments may not turn a merge into a cancellation or vice versa.
pub trait Combinable: Sized {
    fn combine(&self, other: &Self) -> CombineOutcome<Self>;
}

/// Reduce a list to its fixed point under pairwise combination.
///
/// Cursor scan: the element at `i` is combined with each later element;
/// a cancellation removes both, a merge replaces the element at `i`,
/// and in either case the scan restarts from the shrunken list before
/// `i` may advance. Every hit strictly shrinks the list, so the scan
/// terminates; the surviving set does not depend on input order.
pub fn combine_all<T: Combinable>(models: Vec<T>) -> Vec<T> {
    let mut working = models;
    let mut i = 0;
    while i < working.len() {
        let mut j = i + 1;
        while j < working.len() {
            match working[i].combine(&working[j]) {
                CombineOutcome::Cancelled => {
                    working.remove(j);
                    working.remove(i);
                    break;
                }
                CombineOutcome::Merged(merged) => {
                    working.remove(j);
                    working[i] = merged;
                    break;
                }
                CombineOutcome::Unrelated => j += 1,
            }
        }
        if j >= working.len() {
            i += 1;
        }
    }
    working
}

/// Ordering by provenance: created_at, then source notification id as a
/// tie break so the choice never depends on argument order.
fn earlier<'a>(
    a: &'a DetailedNotificationContent,
    b: &'a DetailedNotificationContent,
) -> &'a DetailedNotificationContent {
    if (a.created_at, a.source_notification_id) <= (b.created_at, b.source_notification_id) {
        a
    } else {
        b
    }
}

fn later<'a>(
    a: &'a DetailedNotificationContent,
    b: &'a DetailedNotificationContent,
) -> &'a DetailedNotificationContent {
    if std::ptr::eq(earlier(a, b), a) {
        b
    } else {
        a
    }
}

/// Merge where `winner` supplies the payload and notification type and
/// the earlier side supplies the timestamp.
fn merge_keeping(
    winner: &DetailedNotificationContent,
    other: &DetailedNotificationContent,
) -> DetailedNotificationContent {
    let mut merged = winner.clone();
    merged.created_at = winner.created_at.min(other.created_at);
    merged
}

/// Union preserving first-seen order, earlier side first.
fn union_preserving<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = a.to_vec();
    for item in b {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn combine_policy(
    a: &DetailedNotificationContent,
    b: &DetailedNotificationContent,
    a_status: PolicyStatus,
    b_status: PolicyStatus,
) -> CombineOutcome<DetailedNotificationContent> {
    use PolicyStatus::*;

    match (a_status, b_status) {
        // the violation and its clearance annihilate
        (InViolation, Cleared) | (Cleared, InViolation) => CombineOutcome::Cancelled,
        // the override closes the violation and carries the terminal state
        (InViolation, Overridden) => CombineOutcome::Merged(merge_keeping(b, a)),
        (Overridden, InViolation) => CombineOutcome::Merged(merge_keeping(a, b)),
        // duplicate delivery of the same state
        (x, y) if x == y => CombineOutcome::Merged(earlier(a, b).clone()),
        // both terminal: the later notification decides the final state
        _ => {
            let winner = later(a, b);
            let loser = earlier(a, b);
            CombineOutcome::Merged(merge_keeping(winner, loser))
        }
    }
}

fn combine_vulnerability(
    a: &DetailedNotificationContent,
    b: &DetailedNotificationContent,
    a_payload: &VulnerabilityPayload,
    b_payload: &VulnerabilityPayload,
) -> CombineOutcome<DetailedNotificationContent> {
    let earlier_detail = earlier(a, b);
    let (first, second) = if std::ptr::eq(earlier_detail, a) {
        (a_payload, b_payload)
    } else {
        (b_payload, a_payload)
    };

    let mut merged = earlier_detail.clone();
    merged.payload = DetailPayload::Vulnerability(VulnerabilityPayload {
        component_name: first.component_name.clone(),
        component_version_name: first
            .component_version_name
            .clone()
            .or_else(|| second.component_version_name.clone()),
        severities: union_preserving(&first.severities, &second.severities),
        new_ids: union_preserving(&first.new_ids, &second.new_ids),
        updated_ids: union_preserving(&first.updated_ids, &second.updated_ids),
        deleted_ids: union_preserving(&first.deleted_ids, &second.deleted_ids),
    });
    CombineOutcome::Merged(merged)
}

impl Combinable for DetailedNotificationContent {
    fn combine(&self, other: &Self) -> CombineOutcome<Self> {
        if self.content_key != other.content_key {
            return CombineOutcome::Unrelated;
        }

        match (&self.payload, &other.payload) {
            (DetailPayload::Policy(a), DetailPayload::Policy(b)) => {
                combine_policy(self, other, a.status, b.status)
            }
            (DetailPayload::Vulnerability(a), DetailPayload::Vulnerability(b)) => {
                combine_vulnerability(self, other, a, b)
            }
            // equal keys imply equal category; bom edits and other
            // events collapse as straight duplicates
            _ => CombineOutcome::Merged(earlier(self, other).clone()),
        }
    }
}
