//! Core types for truetrace

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Largest photo accepted at capture (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A GPS fix taken at capture time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Location {
    /// Create a location, rejecting out-of-range coordinates
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::Validation(format!(
                "location out of range: {lat}, {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// Result of the advisory image quality check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Whether the photo looks usable
    pub acceptable: bool,
    /// Human readable explanation
    pub message: String,
}

/// Lifecycle status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Captured, not yet handed to the manager
    Draft,
    /// Waiting in the pending queue for connectivity
    QueuedOffline,
    /// Remote call in flight
    Submitting,
    /// Accepted by the remote service
    Confirmed,
    /// Last remote attempt failed
    Failed,
}

impl SubmissionStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft | Self::Failed, Self::QueuedOffline)
                | (
                    Self::Draft | Self::QueuedOffline | Self::Failed,
                    Self::Submitting
                )
                | (Self::Submitting, Self::Confirmed | Self::Failed)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::QueuedOffline => "queued",
            Self::Submitting => "submitting",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Opaque identifier returned by the remote service on acceptance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(String);

impl ConfirmationId {
    /// Wrap a confirmation id, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(Error::RemoteService(
                "service returned an empty confirmation id".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Photo encodings accepted at capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG
    Jpeg,
    /// PNG
    Png,
}

impl ImageFormat {
    /// Detect the format from the leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else {
            None
        }
    }

    /// MIME type for upload
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Captured photo bytes
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    format: ImageFormat,
    #[serde(with = "base64_bytes")]
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Validate captured bytes: non-empty, at most 10 MiB, JPEG or PNG
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Validation("photo is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::Validation(format!(
                "photo is too large ({} bytes, max 10MB)",
                bytes.len()
            )));
        }
        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            Error::Validation("only JPEG and PNG photos are allowed".to_string())
        })?;
        Ok(Self { format, bytes })
    }

    /// Detected encoding
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload has no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(de::Error::custom)
    }
}

/// A report being filled in by the engineer
///
/// Nothing is validated until [`Draft::into_submission`].
#[derive(Debug, Clone)]
pub struct Draft {
    /// Engineer identifier typed by the user
    pub engineer_id: String,
    /// Captured photo, if any
    pub image: Option<ImagePayload>,
    /// GPS fix, if available
    pub location: Option<Location>,
    /// Advisory quality result, if a check ran
    pub quality: Option<QualityAssessment>,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

impl Draft {
    /// Start a draft stamped with the current time
    pub fn new(engineer_id: impl Into<String>, image: Option<ImagePayload>) -> Self {
        Self {
            engineer_id: engineer_id.into(),
            image,
            location: None,
            quality: None,
            captured_at: Utc::now(),
        }
    }

    /// Attach a GPS fix
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach an advisory quality result
    #[must_use]
    pub fn with_quality(mut self, quality: QualityAssessment) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Check required fields and produce a [`Submission`] in `Draft` status
    pub fn into_submission(self) -> Result<Submission> {
        let engineer_id = self.engineer_id.trim().to_string();
        if engineer_id.is_empty() {
            return Err(Error::Validation("engineer id is required".to_string()));
        }
        let image = match self.image {
            Some(image) if !image.is_empty() => image,
            _ => return Err(Error::Validation("site photo is required".to_string())),
        };

        Ok(Submission {
            id: Uuid::new_v4(),
            engineer_id,
            image,
            captured_at: self.captured_at,
            location: self.location,
            quality: self.quality,
            status: SubmissionStatus::Draft,
            confirmation_id: None,
            attempts: 0,
            last_error: None,
        })
    }
}

/// One inspection report moving through the lifecycle
///
/// Capture fields are fixed once the submission is created. Status and
/// confirmation id only change through the transition methods, so a
/// confirmation id is written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    id: Uuid,
    engineer_id: String,
    image: ImagePayload,
    captured_at: DateTime<Utc>,
    location: Option<Location>,
    quality: Option<QualityAssessment>,
    status: SubmissionStatus,
    confirmation_id: Option<ConfirmationId>,
    #[serde(default)]
    attempts: u32,
    #[serde(default)]
    last_error: Option<String>,
}

impl Submission {
    /// Unique id assigned at capture
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Engineer who captured the report
    pub fn engineer_id(&self) -> &str {
        &self.engineer_id
    }

    /// Site photo
    pub const fn image(&self) -> &ImagePayload {
        &self.image
    }

    /// Capture time
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// GPS fix, if one was available
    pub const fn location(&self) -> Option<Location> {
        self.location
    }

    /// Advisory quality result
    pub const fn quality(&self) -> Option<&QualityAssessment> {
        self.quality.as_ref()
    }

    /// Current lifecycle status
    pub const fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Confirmation id, present only once confirmed
    pub const fn confirmation_id(&self) -> Option<&ConfirmationId> {
        self.confirmation_id.as_ref()
    }

    /// Number of remote attempts made so far
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reason for the most recent remote failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, next: SubmissionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Park in the pending queue
    pub fn mark_queued(&mut self) -> Result<()> {
        self.transition(SubmissionStatus::QueuedOffline)
    }

    /// Begin a remote attempt
    pub fn mark_submitting(&mut self) -> Result<()> {
        self.transition(SubmissionStatus::Submitting)?;
        self.attempts = self.attempts.saturating_add(1);
        Ok(())
    }

    /// Record acceptance by the remote service
    pub fn confirm(&mut self, confirmation_id: ConfirmationId) -> Result<()> {
        if self.confirmation_id.is_some() {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: SubmissionStatus::Confirmed,
            });
        }
        self.transition(SubmissionStatus::Confirmed)?;
        self.confirmation_id = Some(confirmation_id);
        self.last_error = None;
        Ok(())
    }

    /// Record a failed remote attempt
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(SubmissionStatus::Failed)?;
        self.last_error = Some(reason.into());
        Ok(())
    }
}

/// What `finalize` did with a draft
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// Device was offline; the submission is in the pending queue
    QueuedLocally(Submission),
    /// The remote service accepted the submission
    Confirmed(Submission),
    /// The remote attempt failed; the caller decides whether to retry or requeue
    SubmissionFailed {
        /// The submission, in `Failed` status
        submission: Submission,
        /// Why the attempt failed
        reason: String,
    },
}

impl FinalizeOutcome {
    /// The submission in its post-call state
    pub const fn submission(&self) -> &Submission {
        match self {
            Self::QueuedLocally(submission)
            | Self::Confirmed(submission)
            | Self::SubmissionFailed { submission, .. } => submission,
        }
    }

    /// Confirmation id when the outcome is `Confirmed`
    pub const fn confirmation_id(&self) -> Option<&ConfirmationId> {
        match self {
            Self::Confirmed(submission) => submission.confirmation_id(),
            _ => None,
        }
    }
}
