//! Live Photo tag plans.
//!
//! A tag plan is the ordered list of metadata writes applied to one file in
//! a single ExifTool invocation. Order is part of the contract: ExifTool
//! applies arguments left to right, so entries that blank a field must come
//! before the entries that rewrite it.
//!
//! The same logical field is written into every namespace a consumer is
//! known to read. iOS releases differ in which namespace they trust, and
//! third-party re-processing can strip any single one, so the redundant
//! entries are siblings that must all be present.

use std::fmt;

/// Default aperture when the caller omits it.
pub const DEFAULT_APERTURE: &str = "1.78";
/// Default focal length in mm.
pub const DEFAULT_FOCAL: &str = "24";
/// Default 35mm-equivalent focal length.
pub const DEFAULT_FOCAL35: &str = "24";
/// Default ISO.
pub const DEFAULT_ISO: &str = "100";
/// Default pixel width.
pub const DEFAULT_WIDTH: &str = "4032";
/// Default pixel height.
pub const DEFAULT_HEIGHT: &str = "3024";

/// Handler name matching first-party video recordings.
const VIDEO_HANDLER: &str = "Core Media Video";
/// Handler name matching first-party audio tracks.
const AUDIO_HANDLER: &str = "Core Media Audio";

/// Pairing identifier shared by the still image and the video of one pair.
///
/// The token is opaque and caller-supplied; it is only normalized
/// (trimmed + uppercased) and must be written byte-identically into every
/// namespace of both files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingId(String);

impl PairingId {
    /// Normalize a caller-supplied token. Returns `None` when the token is
    /// empty after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity fields stamped into both media items.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Camera make, e.g. "Apple"
    pub make: String,
    /// Camera model, e.g. "iPhone 17 Pro Max"
    pub model: String,
    /// Capture date, consumer-defined format, e.g. "2026:02:22 12:00:00"
    pub date: String,
}

/// Optional shot parameters for the still image.
///
/// Each `None` falls back to its documented default when the plan is built.
#[derive(Debug, Clone, Default)]
pub struct ShotParams {
    pub aperture: Option<String>,
    pub focal: Option<String>,
    pub focal35: Option<String>,
    pub iso: Option<String>,
    pub lens: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl ShotParams {
    /// Default lens description for a given model.
    pub fn default_lens(model: &str) -> String {
        format!("{model} rear camera")
    }
}

/// One metadata write: renders to a single `-TAG=VALUE` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagWrite {
    pub tag: String,
    pub value: String,
}

impl TagWrite {
    fn set(tag: &str, value: impl Into<String>) -> Self {
        Self {
            tag: tag.to_string(),
            value: value.into(),
        }
    }

    /// A cleansing entry: blanks the field.
    fn clear(tag: &str) -> Self {
        Self::set(tag, "")
    }

    /// Render as an ExifTool argument.
    pub fn to_arg(&self) -> String {
        format!("-{}={}", self.tag, self.value)
    }
}

/// Ordered sequence of metadata writes for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan(Vec<TagWrite>);

impl TagPlan {
    /// Plan for the video half of a Live Photo pair.
    ///
    /// Cleanses the remux tool's handler/encoder fingerprints, restores
    /// first-party handler names, then writes make/model into four
    /// namespaces, the capture date into six fields, the pairing identifier
    /// into three locations, and anchors frame zero as the still frame.
    pub fn for_paired_video(identity: &DeviceIdentity, pairing: &PairingId) -> Self {
        let mut plan = Self::video_base(identity);
        plan.0.push(TagWrite::set("ContentIdentifier", pairing.as_str()));
        plan.0
            .push(TagWrite::set("Keys:ContentIdentifier", pairing.as_str()));
        plan.0.push(TagWrite::set(
            "com.apple.quicktime.content.identifier",
            pairing.as_str(),
        ));
        plan.0.push(TagWrite::set("Keys:StillImageTime", "0"));
        plan
    }

    /// Plan for the video-only rewrite pipeline: identity and dates, no
    /// pairing identifier.
    pub fn for_video_rewrite(identity: &DeviceIdentity) -> Self {
        Self::video_base(identity)
    }

    /// Plan for the still-image half of a Live Photo pair.
    pub fn for_still_image(
        identity: &DeviceIdentity,
        pairing: &PairingId,
        shot: &ShotParams,
    ) -> Self {
        let or = |v: &Option<String>, d: &str| v.clone().unwrap_or_else(|| d.to_string());
        let lens = shot
            .lens
            .clone()
            .unwrap_or_else(|| ShotParams::default_lens(&identity.model));

        let writes = vec![
            TagWrite::set("Make", &identity.make),
            TagWrite::set("Model", &identity.model),
            TagWrite::set("DateTime", &identity.date),
            TagWrite::set("DateTimeOriginal", &identity.date),
            TagWrite::set("CreateDate", &identity.date),
            TagWrite::set("LensModel", lens),
            TagWrite::set("FNumber", or(&shot.aperture, DEFAULT_APERTURE)),
            TagWrite::set("FocalLength", or(&shot.focal, DEFAULT_FOCAL)),
            TagWrite::set("FocalLengthIn35mmFormat", or(&shot.focal35, DEFAULT_FOCAL35)),
            TagWrite::set("ISO", or(&shot.iso, DEFAULT_ISO)),
            TagWrite::set("ExifImageWidth", or(&shot.width, DEFAULT_WIDTH)),
            TagWrite::set("ExifImageHeight", or(&shot.height, DEFAULT_HEIGHT)),
            // Marks the image as the still component of a paired capture
            TagWrite::set("CustomRendered", "6"),
            // MakerNote primary, XMP apple-fi backup, generic XMP fallback
            TagWrite::set("Apple:ContentIdentifier", pairing.as_str()),
            TagWrite::set("XMP-apple-fi:ContentIdentifier", pairing.as_str()),
            TagWrite::set("XMP:ContentIdentifier", pairing.as_str()),
        ];
        Self(writes)
    }

    /// Shared video entries: cleanse, handler restore, make/model, dates.
    fn video_base(identity: &DeviceIdentity) -> Self {
        let writes = vec![
            // Cleanse encoder fingerprints left by the remux step
            TagWrite::clear("QuickTime:HandlerName"),
            TagWrite::clear("QuickTime:VideoHandlerName"),
            TagWrite::clear("QuickTime:AudioHandlerName"),
            TagWrite::clear("QuickTime:Encoder"),
            // Restore first-party recorder handler names
            TagWrite::set("QuickTime:HandlerName", VIDEO_HANDLER),
            TagWrite::set("QuickTime:VideoHandlerName", VIDEO_HANDLER),
            TagWrite::set("QuickTime:AudioHandlerName", AUDIO_HANDLER),
            // Make/Model across all four namespaces consumers read
            TagWrite::set("QuickTime:Make", &identity.make),
            TagWrite::set("QuickTime:Model", &identity.model),
            TagWrite::set("Keys:Make", &identity.make),
            TagWrite::set("Keys:Model", &identity.model),
            TagWrite::set("UserData:Make", &identity.make),
            TagWrite::set("UserData:Model", &identity.model),
            TagWrite::set("com.apple.quicktime.make", &identity.make),
            TagWrite::set("com.apple.quicktime.model", &identity.model),
            // Capture date in every field a consumer may treat as authoritative
            TagWrite::set("QuickTime:CreationDate", &identity.date),
            TagWrite::set("com.apple.quicktime.creationdate", &identity.date),
            TagWrite::set("CreateDate", &identity.date),
            TagWrite::set("DateTimeOriginal", &identity.date),
            TagWrite::set("TrackCreateDate", &identity.date),
            TagWrite::set("MediaCreateDate", &identity.date),
        ];
        Self(writes)
    }

    /// Render the plan as ExifTool arguments, in order.
    pub fn args(&self) -> Vec<String> {
        self.0.iter().map(TagWrite::to_arg).collect()
    }

    /// Number of writes in the plan.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagWrite> {
        self.0.iter()
    }

    /// Values written for `tag`, in plan order.
    pub fn values_for(&self, tag: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|w| w.tag == tag)
            .map(|w| w.value.as_str())
            .collect()
    }
}
