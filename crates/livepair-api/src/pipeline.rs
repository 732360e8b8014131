//! Request pipelines: Remux -> Inject -> Package.
//!
//! Linear state machines with no retries: the first failure is terminal for
//! the request, and the caller schedules cleanup of everything allocated so
//! far. Both halves of a pair are injected with plans built from the same
//! normalized pairing identifier.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use livepair_media::{write_bundle, TagPlan};

use crate::error::ApiResult;
use crate::handlers::forms::{LiveForm, VideoForm};
use crate::scratch::Workspace;
use crate::state::AppState;

/// Finished pairing request: the bundle on disk and its download name.
#[derive(Debug)]
pub struct LiveOutcome {
    pub bundle: PathBuf,
    pub download_name: String,
}

/// Finished video-only request.
#[derive(Debug)]
pub struct VideoOutcome {
    pub output: PathBuf,
    pub download_name: String,
}

/// Run the pairing pipeline over a validated form.
pub async fn run_live(state: &AppState, ws: &Workspace, form: &LiveForm) -> ApiResult<LiveOutcome> {
    // Working JPEG: direct copy, or converted first when the upload is in
    // another still format
    let out_photo = ws.out_photo();
    if form.photo_ext == "jpg" || form.photo_ext == "jpeg" {
        tokio::fs::copy(&form.photo, &out_photo).await?;
    } else {
        let converted = ws.converted_photo();
        state.remux.convert_to_jpeg(&form.photo, &converted).await?;
        tokio::fs::copy(&converted, &out_photo).await?;
        // Source and converted copy are spent once the working JPEG exists
        state
            .janitor
            .schedule(vec![form.photo.clone(), converted], Duration::ZERO);
    }

    let out_video = ws.out_video();
    state.remux.remux_to_mov(&form.video, &out_video).await?;
    state.janitor.schedule(vec![form.video.clone()], Duration::ZERO);

    let image_plan = TagPlan::for_still_image(&form.identity, &form.pairing, &form.shot);
    let image_report = state.metadata.apply(&image_plan, &out_photo).await?;

    let video_plan = TagPlan::for_paired_video(&form.identity, &form.pairing);
    let video_report = state.metadata.apply(&video_plan, &out_video).await?;

    info!(
        "injected {} image tags, {} video tags, asset_id={}",
        image_report.tags_written, video_report.tags_written, form.pairing
    );

    let bundle = ws.bundle();
    write_bundle(&out_photo, &out_video, &bundle).await?;

    Ok(LiveOutcome {
        bundle,
        download_name: format!("LivePhoto_{}.zip", &ws.id()[..8]),
    })
}

/// Run the video-only rewrite pipeline over a validated form.
pub async fn run_video(
    state: &AppState,
    ws: &Workspace,
    form: &VideoForm,
) -> ApiResult<VideoOutcome> {
    let out_video = ws.out_video();
    state.remux.remux_to_mov(&form.file, &out_video).await?;
    state.janitor.schedule(vec![form.file.clone()], Duration::ZERO);

    let plan = TagPlan::for_video_rewrite(&form.identity);
    let report = state.metadata.apply(&plan, &out_video).await?;
    info!("injected {} video tags", report.tags_written);

    Ok(VideoOutcome {
        output: out_video,
        download_name: format!("processed_{}.mov", ws.id()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use livepair_media::{
        DeviceIdentity, InjectReport, MediaError, MediaResult, MetadataTool, PairingId, RemuxTool,
        ShotParams, IMAGE_ENTRY, VIDEO_ENTRY,
    };

    use crate::config::AppConfig;
    use crate::error::ApiError;

    #[derive(Default)]
    struct FakeRemux {
        fail_remux: bool,
        converts: Mutex<Vec<PathBuf>>,
        remuxes: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl RemuxTool for FakeRemux {
        async fn remux_to_mov(&self, src: &Path, dst: &Path) -> MediaResult<()> {
            if self.fail_remux {
                return Err(MediaError::remux_failed("moov atom not found"));
            }
            tokio::fs::copy(src, dst).await?;
            self.remuxes.lock().unwrap().push(src.to_path_buf());
            Ok(())
        }

        async fn convert_to_jpeg(&self, src: &Path, dst: &Path) -> MediaResult<()> {
            tokio::fs::copy(src, dst).await?;
            self.converts.lock().unwrap().push(src.to_path_buf());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeMetadata {
        applied: Mutex<Vec<(TagPlan, PathBuf)>>,
    }

    #[async_trait]
    impl MetadataTool for FakeMetadata {
        async fn apply(&self, plan: &TagPlan, file: &Path) -> MediaResult<InjectReport> {
            self.applied
                .lock()
                .unwrap()
                .push((plan.clone(), file.to_path_buf()));
            Ok(InjectReport {
                tags_written: plan.len(),
            })
        }
    }

    struct Rig {
        _dir: TempDir,
        state: AppState,
        remux: Arc<FakeRemux>,
        metadata: Arc<FakeMetadata>,
        ws: Workspace,
    }

    fn rig(remux: FakeRemux) -> Rig {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let remux = Arc::new(remux);
        let metadata = Arc::new(FakeMetadata::default());
        let state = AppState::with_tools(config, remux.clone(), metadata.clone());
        let ws = Workspace::new(dir.path());
        Rig {
            _dir: dir,
            state,
            remux,
            metadata,
            ws,
        }
    }

    fn live_form(ws: &Workspace, photo_ext: &str) -> LiveForm {
        let photo = ws.src_photo(photo_ext);
        let video = ws.src_video("mp4");
        std::fs::write(&photo, b"image bytes").unwrap();
        std::fs::write(&video, b"video bytes").unwrap();
        LiveForm {
            photo,
            photo_ext: photo_ext.to_string(),
            video,
            identity: DeviceIdentity {
                make: "Apple".to_string(),
                model: "iPhone 17 Pro Max".to_string(),
                date: "2026:02:22 12:00:00".to_string(),
            },
            pairing: PairingId::new("  ab12-cd34  ").unwrap(),
            shot: ShotParams::default(),
        }
    }

    #[tokio::test]
    async fn test_live_pipeline_bundles_both_outputs() {
        let r = rig(FakeRemux::default());
        let form = live_form(&r.ws, "jpg");

        let outcome = run_live(&r.state, &r.ws, &form).await.unwrap();
        assert!(outcome.bundle.exists());
        assert!(outcome.download_name.starts_with("LivePhoto_"));
        assert!(outcome.download_name.ends_with(".zip"));

        let file = std::fs::File::open(&outcome.bundle).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name(IMAGE_ENTRY).is_ok());
        assert!(archive.by_name(VIDEO_ENTRY).is_ok());
    }

    #[tokio::test]
    async fn test_live_pipeline_shares_one_pairing_identifier() {
        let r = rig(FakeRemux::default());
        let form = live_form(&r.ws, "jpg");
        run_live(&r.state, &r.ws, &form).await.unwrap();

        let applied = r.metadata.applied.lock().unwrap();
        assert_eq!(applied.len(), 2);
        let (image_plan, image_file) = &applied[0];
        let (video_plan, video_file) = &applied[1];
        assert!(image_file.to_string_lossy().contains("out_photo_"));
        assert!(video_file.to_string_lossy().contains("out_video_"));

        let mut ids: Vec<&str> = Vec::new();
        for tag in [
            "Apple:ContentIdentifier",
            "XMP-apple-fi:ContentIdentifier",
            "XMP:ContentIdentifier",
        ] {
            ids.extend(image_plan.values_for(tag));
        }
        for tag in [
            "ContentIdentifier",
            "Keys:ContentIdentifier",
            "com.apple.quicktime.content.identifier",
        ] {
            ids.extend(video_plan.values_for(tag));
        }
        assert_eq!(ids.len(), 6);
        assert!(ids.iter().all(|v| *v == "AB12-CD34"));
    }

    #[tokio::test]
    async fn test_live_pipeline_converts_non_jpeg_first() {
        let r = rig(FakeRemux::default());
        let form = live_form(&r.ws, "png");
        run_live(&r.state, &r.ws, &form).await.unwrap();

        let converts = r.remux.converts.lock().unwrap();
        assert_eq!(converts.len(), 1);
        assert_eq!(converts[0], form.photo);
    }

    #[tokio::test]
    async fn test_live_pipeline_skips_conversion_for_jpeg() {
        let r = rig(FakeRemux::default());
        let form = live_form(&r.ws, "jpg");
        run_live(&r.state, &r.ws, &form).await.unwrap();
        assert!(r.remux.converts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_live_pipeline_stops_at_remux_failure() {
        let r = rig(FakeRemux {
            fail_remux: true,
            ..FakeRemux::default()
        });
        let form = live_form(&r.ws, "jpg");

        let err = run_live(&r.state, &r.ws, &form).await.unwrap_err();
        assert!(matches!(err, ApiError::Media(MediaError::RemuxFailed { .. })));
        // Nothing was injected and no bundle was produced
        assert!(r.metadata.applied.lock().unwrap().is_empty());
        assert!(!r.ws.bundle().exists());
    }

    #[tokio::test]
    async fn test_video_pipeline_rewrites_without_pairing() {
        let r = rig(FakeRemux::default());
        let file = r.ws.src_video("mp4");
        std::fs::write(&file, b"video bytes").unwrap();
        let form = VideoForm {
            file,
            identity: DeviceIdentity {
                make: "Apple".to_string(),
                model: "iPhone 17 Pro Max".to_string(),
                date: "2026:02:22 12:00:00".to_string(),
            },
        };

        let outcome = run_video(&r.state, &r.ws, &form).await.unwrap();
        assert!(outcome.output.exists());
        assert!(outcome.download_name.starts_with("processed_"));
        assert!(outcome.download_name.ends_with(".mov"));

        let applied = r.metadata.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        let (plan, _) = &applied[0];
        assert!(plan.values_for("ContentIdentifier").is_empty());
        assert_eq!(plan.values_for("Keys:Make"), vec!["Apple"]);
    }
}
