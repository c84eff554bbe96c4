//! Progress reporting for the CLI.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter over one copy session (one source pattern).
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// A spinner, since the total number of files to copy is not
    /// known ahead of time (directories are enumerated lazily).
    pub fn for_copy(pattern: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        bar.set_message(format!("Resolving {pattern}..."));
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self { bar }
    }

    pub fn update(&self, files_copied: usize, bytes_copied: u64) {
        self.bar.set_message(format!(
            "{files_copied} files copied ({})",
            crate::utils::format_bytes(bytes_copied)
        ));
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
