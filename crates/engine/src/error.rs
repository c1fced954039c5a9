use std::path::PathBuf;

use thiserror::Error;

use crate::segment::SegmentKind;
use crate::time::Timerange;
use crate::track::TrackKind;

/// Result type for draft-engine operations.
pub type Result<T> = std::result::Result<T, DraftError>;

/// Everything that can go wrong while composing or (de)serializing a draft.
///
/// All variants are raised synchronously at the violating call and leave the
/// document untouched; validation always happens before any mutation.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("a {0} track already exists, name the new track to disambiguate")]
    UnnamedDuplicateTrack(TrackKind),

    #[error("a track named '{0}' already exists")]
    DuplicateTrackName(String),

    #[error("no track named '{0}'")]
    NoSuchTrack(String),

    #[error("no track accepts {0} segments")]
    NoTrackForKind(SegmentKind),

    #[error("multiple tracks accept {0} segments, specify a track name")]
    AmbiguousTrack(SegmentKind),

    #[error("cannot place a {segment} segment on {track} track '{name}'")]
    TypeMismatch {
        name: String,
        track: TrackKind,
        segment: SegmentKind,
    },

    #[error("segment {incoming} overlaps existing segment {existing} on track '{track}'")]
    Overlap {
        track: String,
        incoming: Timerange,
        existing: Timerange,
    },

    #[error("material '{0}' is not present in the registry")]
    UnknownMaterial(String),

    #[error("effect '{effect}' takes {arity} parameters, {given} given")]
    TooManyParams {
        effect: String,
        arity: usize,
        given: usize,
    },

    #[error("parameter {index} of '{effect}' must be within 0..=100, got {value}")]
    ParamOutOfRange {
        effect: String,
        index: usize,
        value: f64,
    },

    #[error("invalid time value '{0}'")]
    TimeFormat(String),

    #[error("srt parse error at line {line}: {message}")]
    SrtParse { line: usize, message: String },

    #[error("subtitle import needs a style reference or clip settings")]
    MissingSubtitleStyle,

    #[error("invalid draft document: {0}")]
    Document(String),

    #[error("media file '{}' does not exist", .0.display())]
    MissingMedia(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DraftError {
    /// Shorthand for `from_dict` field errors.
    pub(crate) fn document(message: impl Into<String>) -> Self {
        DraftError::Document(message.into())
    }
}
