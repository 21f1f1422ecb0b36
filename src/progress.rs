use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bar over `len` items, hidden when `enabled` is false.
pub fn progress_bar(len: u64, message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    // Fall back to the default style if the template is rejected
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{msg} {spinner:.magenta}\n\
        [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} \
        [ETA: {eta:.blue}]",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
