//! Progress bars for cohort generation

use indicatif::{ProgressBar, ProgressStyle};

/// Bar layout for patient generation
pub const COHORT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} patients ({per_sec}) {msg}";

/// Bar over `patients` rows, labelled with `message`
#[must_use]
pub fn cohort_progress_bar(patients: u64, message: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(COHORT_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    ProgressBar::new(patients)
        .with_style(style)
        .with_message(message.to_string())
}

pub fn finish_progress_bar(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(message.to_string());
}
