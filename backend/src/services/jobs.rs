//! Supervised child-process runner for the grid-refresh pipeline
//!
//! The serving layer never runs the pipeline in-process: a refresh request
//! launches the sibling `grid-refresh` binary and reports its captured
//! output. A mutex serializes runs so concurrent refresh requests cannot
//! overlap.

use std::path::PathBuf;

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Environment variable the pipeline reads its model type from
pub const MODEL_ENV_VAR: &str = "FLOOD_ML_MODEL";

const OUTPUT_TAIL_CHARS: usize = 500;

/// Result of a completed refresh run
#[derive(Debug)]
pub struct JobReport {
    pub stdout_tail: String,
}

/// Launches and supervises grid-refresh child processes
pub struct RefreshRunner {
    lock: Mutex<()>,
    command: Option<PathBuf>,
}

impl RefreshRunner {
    /// `command` overrides the executable; by default the runner launches
    /// the `grid-refresh` binary next to the server executable
    pub fn new(command: Option<PathBuf>) -> Self {
        Self {
            lock: Mutex::new(()),
            command,
        }
    }

    /// Run the pipeline to completion and return its stdout tail
    pub async fn run(&self, model_type: &str) -> AppResult<JobReport> {
        let _guard = self.lock.lock().await;
        let program = self.resolve_command()?;

        tracing::info!(program = %program.display(), model_type, "launching grid refresh");

        let output = Command::new(&program)
            .env(MODEL_ENV_VAR, model_type)
            .output()
            .await
            .map_err(|e| {
                AppError::PipelineInvocation(format!(
                    "failed to launch {}: {}",
                    program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::PipelineInvocation(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                tail(&stderr, OUTPUT_TAIL_CHARS)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(JobReport {
            stdout_tail: tail(&stdout, OUTPUT_TAIL_CHARS).to_string(),
        })
    }

    fn resolve_command(&self) -> AppResult<PathBuf> {
        if let Some(command) = &self.command {
            return Ok(command.clone());
        }
        let exe = std::env::current_exe().map_err(|e| {
            AppError::PipelineInvocation(format!("cannot locate server executable: {}", e))
        })?;
        let dir = exe.parent().ok_or_else(|| {
            AppError::PipelineInvocation("server executable has no parent directory".to_string())
        })?;
        Ok(dir.join("grid-refresh"))
    }
}

/// Last `max_chars` characters of a string, on a char boundary
fn tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - max_chars)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_short_string_is_unchanged() {
        assert_eq!(tail("pipeline done", 500), "pipeline done");
    }

    #[test]
    fn test_tail_truncates_from_the_front() {
        let s = "a".repeat(600);
        assert_eq!(tail(&s, 500).len(), 500);
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        let s = "é".repeat(10);
        assert_eq!(tail(&s, 3), "ééé");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_pipeline_error() {
        let runner = RefreshRunner::new(Some(PathBuf::from("/nonexistent/grid-refresh")));
        let err = runner.run("rf").await.unwrap_err();
        assert!(matches!(err, AppError::PipelineInvocation(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_pipeline_error() {
        let runner = RefreshRunner::new(Some(PathBuf::from("/bin/false")));
        let err = runner.run("rf").await.unwrap_err();
        assert!(matches!(err, AppError::PipelineInvocation(_)));
    }
}
