//! Copy outcome DTO

use crate::utils::format_bytes;
use std::time::Duration;

/// Result of a [`crate::application::CopyFilesUseCase`] execution.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub files_failed: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl CopyOutcome {
    pub fn new() -> Self {
        Self {
            files_copied: 0,
            bytes_copied: 0,
            files_failed: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn add_copied(&mut self, bytes: u64) {
        self.files_copied += 1;
        self.bytes_copied += bytes;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.files_failed += 1;
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!(
            "Copy complete: {} files copied ({})\n",
            self.files_copied,
            format_bytes(self.bytes_copied)
        ));
        summary.push_str(&format!("Took {:.2}s\n", self.duration.as_secs_f64()));

        if !self.errors.is_empty() {
            summary.push_str(&format!("\n{} errors occurred:\n", self.errors.len()));
            for error in &self.errors {
                summary.push_str(&format!("  - {error}\n"));
            }
        }

        summary
    }
}

impl Default for CopyOutcome {
    fn default() -> Self {
        Self::new()
    }
}
