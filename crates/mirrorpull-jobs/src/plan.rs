//! Turns a time range into job records.

use mirrorpull_types::{FetchTarget, TimeFilter, TimeWindow, WindowRange};
use std::path::Path;

use crate::JobRecord;

/// Extension shared by every output file.
pub const OUTPUT_EXTENSION: &str = "jsonl.gz";

/// File name for one window of a paginated resource:
/// `<resource>-<start>-<end>.jsonl.gz`.
#[must_use]
pub fn window_file_name(resource: &str, window: &TimeWindow) -> String {
    format!("{resource}-{}.{OUTPUT_EXTENSION}", window.label())
}

/// File name for the snapshots of a resource:
/// `<resource>_<account>.jsonl.gz`, or `<resource>.jsonl.gz` without an account.
#[must_use]
pub fn snapshot_file_name(resource: &str, account: Option<&str>) -> String {
    match account {
        Some(account) => format!("{resource}_{account}.{OUTPUT_EXTENSION}"),
        None => format!("{resource}.{OUTPUT_EXTENSION}"),
    }
}

/// Plans one paginated job per window of `range`, each with its own file in
/// `dir`.
///
/// Every job's target is `template` narrowed to `[window.start, window.end)`.
#[must_use]
pub fn window_jobs(template: &FetchTarget, range: &WindowRange, dir: &Path) -> Vec<JobRecord> {
    range
        .windows()
        .map(|window| {
            let target = window
                .filters()
                .into_iter()
                .fold(template.clone(), FetchTarget::with_time_filter);
            let output = dir.join(window_file_name(&template.resource, &window));
            JobRecord::paginated(target, output)
        })
        .collect()
}

/// Plans one single-shot job per snapshot instant of `range`, all appending
/// to `output`.
///
/// Records land in completion order, not in time order.
#[must_use]
pub fn snapshot_jobs(template: &FetchTarget, range: &WindowRange, output: &Path) -> Vec<JobRecord> {
    range
        .points()
        .map(|point| {
            let target = template.clone().with_time_filter(TimeFilter::At(point));
            JobRecord::single_shot(target, output)
        })
        .collect()
}
