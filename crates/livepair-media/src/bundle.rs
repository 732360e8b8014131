//! Deliverable packaging.
//!
//! The pair ships as one ZIP with two fixed, case-exact entry names. Entries
//! are stored uncompressed: the media inside is already compressed and
//! consuming devices unpack by name.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{MediaError, MediaResult};

/// Canonical archive entry name for the still image.
pub const IMAGE_ENTRY: &str = "IMG_LIVE.JPG";
/// Canonical archive entry name for the video.
pub const VIDEO_ENTRY: &str = "IMG_LIVE.MOV";

/// Write the store-only bundle for a processed pair. Returns the archive
/// size in bytes.
pub async fn write_bundle(photo: &Path, video: &Path, dest: &Path) -> MediaResult<u64> {
    let photo = photo.to_path_buf();
    let video = video.to_path_buf();
    let dest_path = dest.to_path_buf();

    let size = tokio::task::spawn_blocking(move || -> MediaResult<u64> {
        let out = File::create(&dest_path)?;
        let mut zip = ZipWriter::new(out);
        // large_file: a single entry may exceed the 4 GiB ZIP32 ceiling
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(true);

        for (entry, path) in [(IMAGE_ENTRY, &photo), (VIDEO_ENTRY, &video)] {
            zip.start_file(entry, options)
                .map_err(|e| MediaError::bundle(e.to_string()))?;
            let mut src = File::open(path)?;
            io::copy(&mut src, &mut zip)?;
        }

        zip.finish().map_err(|e| MediaError::bundle(e.to_string()))?;
        Ok(std::fs::metadata(&dest_path)?.len())
    })
    .await
    .map_err(|e| MediaError::bundle(e.to_string()))??;

    info!(
        "bundle written: {} ({:.2} MB)",
        dest.display(),
        size as f64 / 1024.0 / 1024.0
    );
    Ok(size)
}
