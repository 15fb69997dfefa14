//! Build diagnostics accumulator.

use std::time::Duration;

/// Outcome of a build: counters plus ordered warnings and errors.
///
/// Every stage appends to the same result; entries are never removed. Any
/// recorded error marks the build unsuccessful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub success: bool,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Wall-clock time of the build, set when it finishes.
    pub elapsed: Option<Duration>,
}

impl Default for BuildResult {
    fn default() -> Self {
        Self {
            success: true,
            files_processed: 0,
            files_skipped: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
            elapsed: None,
        }
    }
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and mark the build failed.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.success = false;
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Mark the build failed without adding a message.
    pub fn fail(&mut self) {
        self.success = false;
    }

    /// Append another result's counters and diagnostics after this one's.
    pub fn merge(&mut self, other: BuildResult) {
        self.success &= other.success;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Record the elapsed time and settle the success flag.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
        if self.has_errors() {
            self.success = false;
        }
    }

    /// Multi-line human-readable summary: counters, then warnings, then errors.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        match self.elapsed {
            Some(elapsed) => out.push_str(&format!(
                "Build completed in {:.2} seconds\n",
                elapsed.as_secs_f64()
            )),
            None => out.push_str("Build completed\n"),
        }
        out.push_str(&format!("Files processed: {}\n", self.files_processed));
        out.push_str(&format!("Files skipped: {}\n", self.files_skipped));

        if self.has_warnings() {
            out.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for warning in &self.warnings {
                out.push_str(&format!("  - {warning}\n"));
            }
        }

        if self.has_errors() {
            out.push_str(&format!("\nErrors ({}):\n", self.errors.len()));
            for error in &self.errors {
                out.push_str(&format!("  - {error}\n"));
            }
        }

        out.push_str(if self.success {
            "\nBuild succeeded\n"
        } else {
            "\nBuild failed\n"
        });
        out
    }
}
