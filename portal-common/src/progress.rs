//! Progress aggregation
//!
//! Completion is tracked once per organization (the lesson's `completed`
//! flag is shared curriculum state), and the resulting percentage is
//! projected onto every roster entry.

use crate::model::Organization;

/// `round(100 * completed / total)`, or 0 for an empty curriculum
pub fn completion_percentage(org: &Organization) -> u8 {
    percentage(org.completed_lesson_count(), org.lesson_count())
}

/// Recount the curriculum and write the percentage onto every user
///
/// Returns the percentage that was written.
pub fn recompute_progress(org: &mut Organization) -> u8 {
    let percent = completion_percentage(org);
    for user in &mut org.users {
        user.progress = Some(percent);
    }
    percent
}

pub(crate) fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = 100.0 * completed as f64 / total as f64;
    ratio.round().clamp(0.0, 100.0) as u8
}
