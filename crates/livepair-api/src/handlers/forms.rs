//! Multipart form collection and validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;
use tracing::info;

use livepair_media::{DeviceIdentity, PairingId, ShotParams};

use crate::error::{ApiError, ApiResult};
use crate::scratch::Workspace;

/// Extensions accepted for the still image.
pub const ALLOWED_IMAGE_EXT: [&str; 6] = ["jpg", "jpeg", "png", "heic", "heif", "webp"];
/// Extensions accepted for the video.
pub const ALLOWED_VIDEO_EXT: [&str; 2] = ["mp4", "mov"];

/// Validated input of the pairing endpoint, with uploads already persisted
/// to workspace paths.
#[derive(Debug)]
pub struct LiveForm {
    pub photo: PathBuf,
    pub photo_ext: String,
    pub video: PathBuf,
    pub identity: DeviceIdentity,
    pub pairing: PairingId,
    pub shot: ShotParams,
}

/// Validated input of the video-only endpoint.
#[derive(Debug)]
pub struct VideoForm {
    pub file: PathBuf,
    pub identity: DeviceIdentity,
}

/// Collect and validate the pairing form, saving both uploads into `ws`.
pub async fn collect_live(multipart: &mut Multipart, ws: &Workspace) -> ApiResult<LiveForm> {
    let mut photo: Option<(PathBuf, String)> = None;
    let mut video: Option<PathBuf> = None;
    let mut text: HashMap<String, String> = HashMap::new();

    while let Some(field) = next_field(multipart).await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "photo" => {
                let ext = image_extension(field.file_name())?;
                let dest = ws.src_photo(&ext);
                let bytes = save_field(field, &dest).await?;
                info!("saved photo: {:.2} MB", mb(bytes));
                photo = Some((dest, ext));
            }
            "video" => {
                let ext = video_extension(field.file_name())?;
                let dest = ws.src_video(&ext);
                let bytes = save_field(field, &dest).await?;
                info!("saved video: {:.2} MB", mb(bytes));
                video = Some(dest);
            }
            _ => {
                text.insert(name, read_text(field).await?);
            }
        }
    }

    let (Some((photo, photo_ext)), Some(video)) = (photo, video) else {
        return Err(ApiError::validation(
            "both photo and video file fields are required",
        ));
    };

    let identity = require_identity(&text)?;
    let pairing = text
        .get("asset_id")
        .and_then(|raw| PairingId::new(raw))
        .ok_or_else(|| ApiError::validation("missing required fields: asset_id"))?;

    let shot = ShotParams {
        aperture: optional(&text, "aperture"),
        focal: optional(&text, "focal"),
        focal35: optional(&text, "focal35"),
        iso: optional(&text, "iso"),
        lens: optional(&text, "lens"),
        width: optional(&text, "width"),
        height: optional(&text, "height"),
    };

    Ok(LiveForm {
        photo,
        photo_ext,
        video,
        identity,
        pairing,
        shot,
    })
}

/// Collect and validate the video-only form.
pub async fn collect_video(multipart: &mut Multipart, ws: &Workspace) -> ApiResult<VideoForm> {
    let mut file: Option<PathBuf> = None;
    let mut text: HashMap<String, String> = HashMap::new();

    while let Some(field) = next_field(multipart).await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let ext = video_extension(field.file_name())?;
            let dest = ws.src_video(&ext);
            let bytes = save_field(field, &dest).await?;
            info!("saved video: {:.2} MB", mb(bytes));
            file = Some(dest);
        } else {
            text.insert(name, read_text(field).await?);
        }
    }

    let file = file.ok_or_else(|| ApiError::validation("the file field is required"))?;
    let identity = require_identity(&text)?;

    Ok(VideoForm { file, identity })
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> ApiResult<Option<Field<'a>>> {
    multipart.next_field().await.map_err(multipart_error)
}

async fn read_text(field: Field<'_>) -> ApiResult<String> {
    field.text().await.map_err(multipart_error)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::validation(format!("malformed multipart body: {e}"))
    }
}

/// Stream one upload field to `dest`, returning the byte count.
async fn save_field(mut field: Field<'_>, dest: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn require_identity(text: &HashMap<String, String>) -> ApiResult<DeviceIdentity> {
    let mut missing = Vec::new();
    let mut require = |key: &'static str| -> String {
        match text.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => {
                missing.push(key);
                String::new()
            }
        }
    };

    let make = require("make");
    let model = require("model");
    let date = require("date");

    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(DeviceIdentity { make, model, date })
}

fn optional(text: &HashMap<String, String>, key: &str) -> Option<String> {
    text.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn image_extension(file_name: Option<&str>) -> ApiResult<String> {
    let ext = extension(file_name)?;
    if ALLOWED_IMAGE_EXT.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ApiError::validation(
            "photo must be one of jpg/jpeg/png/heic/heif/webp",
        ))
    }
}

fn video_extension(file_name: Option<&str>) -> ApiResult<String> {
    let ext = extension(file_name)?;
    if ALLOWED_VIDEO_EXT.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ApiError::validation("video must be mp4 or mov"))
    }
}

fn extension(file_name: Option<&str>) -> ApiResult<String> {
    let name = file_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("uploaded file has no filename"))?;
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| ApiError::validation("uploaded filename has no extension"))
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_parsing() {
        assert_eq!(extension(Some("IMG_0001.HEIC")).unwrap(), "heic");
        assert_eq!(extension(Some("clip.final.MP4")).unwrap(), "mp4");
        assert!(extension(Some("")).is_err());
        assert!(extension(Some("noext")).is_err());
        assert!(extension(None).is_err());
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(image_extension(Some("a.webp")).is_ok());
        assert!(image_extension(Some("a.gif")).is_err());
        assert!(video_extension(Some("a.mov")).is_ok());
        assert!(video_extension(Some("a.mkv")).is_err());
    }

    #[test]
    fn test_require_identity_lists_missing_fields() {
        let mut text = HashMap::new();
        text.insert("make".to_string(), "Apple".to_string());
        text.insert("model".to_string(), "   ".to_string());

        let err = require_identity(&text).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("model"));
        assert!(message.contains("date"));
        assert!(!message.contains("make"));
    }

    #[test]
    fn test_optional_trims_and_drops_empty() {
        let mut text = HashMap::new();
        text.insert("aperture".to_string(), " 2.8 ".to_string());
        text.insert("iso".to_string(), "  ".to_string());
        assert_eq!(optional(&text, "aperture"), Some("2.8".to_string()));
        assert_eq!(optional(&text, "iso"), None);
        assert_eq!(optional(&text, "lens"), None);
    }
}
