//! CLI-specific progress handling for routedrift
//!
//! Provides the progress bar shown during the per-address routing phase.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar counting routed addresses
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} addresses ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for the routing phase
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total: u64, message: &str) -> Self {
        let pb = create_progress_bar(total);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_template() {
        let pb = create_progress_bar(1000);

        // Verify the progress bar is created successfully
        assert_eq!(pb.length().unwrap(), 1000);

        // The template string must render without panicking
        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_progress_manager_creation() {
        let manager = ProgressManager::new(500, "Routing addresses");
        assert_eq!(manager.pb.length().unwrap(), 500);
    }
}
