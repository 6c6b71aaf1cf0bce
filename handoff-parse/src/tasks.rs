//! Checklist counting.

use handoff_core::TaskProgress;

const OPEN_TASK: &str = "- [ ]";
const DONE_TASK: &str = "- [x]";
const DONE_TASK_UPPER: &str = "- [X]";

/// Count checklist lines and the share already ticked off.
pub fn tasks(lines: &[String]) -> TaskProgress {
    let mut total = 0;
    let mut completed = 0;
    for line in lines {
        let done = line.contains(DONE_TASK) || line.contains(DONE_TASK_UPPER);
        if done {
            completed += 1;
        }
        if done || line.contains(OPEN_TASK) {
            total += 1;
        }
    }

    let progress = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };

    TaskProgress {
        total,
        completed,
        progress,
    }
}
