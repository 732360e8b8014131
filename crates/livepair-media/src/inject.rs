//! Metadata injection via ExifTool.
//!
//! One plan is applied in one ExifTool invocation. Splitting a plan across
//! several invocations against the same file risks corruption between
//! writes, so the whole plan travels as a single argument list.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::command::{check_exiftool, stderr_tail, ToolRunner};
use crate::error::{MediaError, MediaResult};
use crate::tags::TagPlan;

/// Outcome of a successful injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectReport {
    /// Number of tag writes applied.
    pub tags_written: usize,
}

/// Metadata write capability.
#[async_trait]
pub trait MetadataTool: Send + Sync {
    /// Apply `plan` to `file` in a single atomic tool invocation.
    async fn apply(&self, plan: &TagPlan, file: &Path) -> MediaResult<InjectReport>;
}

/// ExifTool-backed implementation.
#[derive(Debug, Clone)]
pub struct ExifTool {
    timeout: Duration,
}

impl ExifTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Full argument list for one invocation: overwrite in place, keep the
    /// filesystem modification time, then the plan in order, then the file.
    pub(crate) fn build_args(plan: &TagPlan, file: &Path) -> Vec<String> {
        let mut args = vec!["-overwrite_original".to_string(), "-P".to_string()];
        args.extend(plan.args());
        args.push(file.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl MetadataTool for ExifTool {
    async fn apply(&self, plan: &TagPlan, file: &Path) -> MediaResult<InjectReport> {
        check_exiftool()?;

        let args = Self::build_args(plan, file);
        info!(
            "[exiftool] injecting {} tags into {}",
            plan.len(),
            file.display()
        );

        let out = ToolRunner::new("exiftool")
            .with_timeout(self.timeout)
            .run(&args)
            .await?;
        if !out.success {
            error!("[exiftool] failed: {}", stderr_tail(&out.stderr, 300));
            return Err(MediaError::inject_failed(stderr_tail(&out.stderr, 200)));
        }

        info!("[exiftool] done: {}", out.stdout);
        Ok(InjectReport {
            tags_written: plan.len(),
        })
    }
}
