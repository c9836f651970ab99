use indicatif::{ProgressBar, ProgressStyle};

/// Returns a progress bar for `total` samples.
pub fn make_progress_bar(prefix: String, total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_prefix(prefix);
    pb.set_style(
        ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len}")
            .expect("incorrect progress bar format string")
            .progress_chars("#>-"),
    );
    pb
}
