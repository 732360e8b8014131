//! Lossless container remux and still-image conversion via FFmpeg.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::command::{check_ffmpeg, stderr_tail, FfmpegCommand, ToolRunner};
use crate::error::{MediaError, MediaResult};

/// Bound on diagnostic text surfaced from a failed ffmpeg run.
const DIAG_LIMIT: usize = 300;

/// Container remux capability.
///
/// Implementations repackage streams without re-encoding. The trait exists
/// so the request pipeline can run against a fake in tests.
#[async_trait]
pub trait RemuxTool: Send + Sync {
    /// Losslessly repackage `src` into a MOV container at `dst`.
    async fn remux_to_mov(&self, src: &Path, dst: &Path) -> MediaResult<()>;

    /// Convert a still image at `src` into a maximum-quality JPEG at `dst`.
    async fn convert_to_jpeg(&self, src: &Path, dst: &Path) -> MediaResult<()>;
}

/// FFmpeg-backed implementation.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    remux_timeout: Duration,
    convert_timeout: Duration,
}

impl Ffmpeg {
    pub fn new(remux_timeout: Duration, convert_timeout: Duration) -> Self {
        Self {
            remux_timeout,
            convert_timeout,
        }
    }
}

/// Remux command: copy every stream, skip unrecognized ones, front-load the
/// moov box, and reserve the metadata-keys extension for later injection.
pub(crate) fn remux_command(src: &Path, dst: &Path) -> FfmpegCommand {
    FfmpegCommand::new(src, dst).output_args([
        "-map",
        "0",
        "-c",
        "copy",
        "-ignore_unknown",
        "-movflags",
        "+faststart+use_metadata_tags",
    ])
}

/// Conversion command: decode once, re-encode as highest-quality JPEG.
pub(crate) fn convert_command(src: &Path, dst: &Path) -> FfmpegCommand {
    FfmpegCommand::new(src, dst).output_args(["-q:v", "1"])
}

#[async_trait]
impl RemuxTool for Ffmpeg {
    async fn remux_to_mov(&self, src: &Path, dst: &Path) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = remux_command(src, dst).build_args();
        info!("[ffmpeg] remux: ffmpeg {}", args.join(" "));

        let out = ToolRunner::new("ffmpeg")
            .with_timeout(self.remux_timeout)
            .run(&args)
            .await?;
        if !out.success {
            error!("[ffmpeg] remux failed:\n{}", stderr_tail(&out.stderr, 1000));
            return Err(MediaError::remux_failed(stderr_tail(&out.stderr, DIAG_LIMIT)));
        }

        let size = tokio::fs::metadata(dst).await?.len();
        info!(
            "[ffmpeg] remux done -> {} ({:.1} MB)",
            dst.display(),
            size as f64 / 1024.0 / 1024.0
        );
        Ok(())
    }

    async fn convert_to_jpeg(&self, src: &Path, dst: &Path) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = convert_command(src, dst).build_args();
        info!("[ffmpeg] convert: ffmpeg {}", args.join(" "));

        let out = ToolRunner::new("ffmpeg")
            .with_timeout(self.convert_timeout)
            .run(&args)
            .await?;
        if !out.success {
            error!("[ffmpeg] convert failed: {}", stderr_tail(&out.stderr, DIAG_LIMIT));
            return Err(MediaError::convert_failed(stderr_tail(&out.stderr, 200)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_remux_command_shape() {
        let args = remux_command(&PathBuf::from("in.mp4"), &PathBuf::from("out.mov")).build_args();

        // Stream copy, no re-encode
        let c_pos = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c_pos + 1], "copy");
        // All streams mapped, unknown ones skipped instead of failing
        let map_pos = args.iter().position(|a| a == "-map").unwrap();
        assert_eq!(args[map_pos + 1], "0");
        assert!(args.contains(&"-ignore_unknown".to_string()));
        // Index up front and room for private metadata boxes
        let flags_pos = args.iter().position(|a| a == "-movflags").unwrap();
        assert_eq!(args[flags_pos + 1], "+faststart+use_metadata_tags");
        assert_eq!(args.last().unwrap(), "out.mov");
    }

    #[test]
    fn test_convert_command_shape() {
        let args = convert_command(&PathBuf::from("in.png"), &PathBuf::from("out.jpg")).build_args();
        let q_pos = args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(args[q_pos + 1], "1");
        assert_eq!(args.last().unwrap(), "out.jpg");
    }
}
