use serde_json::{json, Value};

use crate::error::{DraftError, Result};
use crate::segment::{gen_id, Segment, SegmentKind};

/// Track kinds, each accepting exactly one segment kind. `base_render_index`
/// is the consumer's z-order band for the kind; tracks of a kind stack within
/// their band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Effect,
    Filter,
    Sticker,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
            TrackKind::Effect => "effect",
            TrackKind::Filter => "filter",
            TrackKind::Sticker => "sticker",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(TrackKind::Video),
            "audio" => Some(TrackKind::Audio),
            "text" => Some(TrackKind::Text),
            "effect" => Some(TrackKind::Effect),
            "filter" => Some(TrackKind::Filter),
            "sticker" => Some(TrackKind::Sticker),
            _ => None,
        }
    }

    pub fn base_render_index(&self) -> i32 {
        match self {
            TrackKind::Video => 0,
            TrackKind::Audio => 0,
            TrackKind::Effect => 10000,
            TrackKind::Filter => 11000,
            TrackKind::Sticker => 14000,
            TrackKind::Text => 15000,
        }
    }

    pub fn accepts(&self) -> SegmentKind {
        match self {
            TrackKind::Video => SegmentKind::Video,
            TrackKind::Audio => SegmentKind::Audio,
            TrackKind::Text => SegmentKind::Text,
            TrackKind::Effect => SegmentKind::Effect,
            TrackKind::Filter => SegmentKind::Filter,
            TrackKind::Sticker => SegmentKind::Sticker,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, kind-homogeneous lane of non-overlapping segments.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub kind: TrackKind,
    pub name: String,
    pub render_index: i32,
    pub mute: bool,
    segments: Vec<Segment>,
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>, render_index: i32, mute: bool) -> Self {
        Self {
            id: gen_id(),
            kind,
            name: name.into(),
            render_index,
            mute,
            segments: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// End of the last-ending segment, 0 for an empty track.
    pub fn end(&self) -> i64 {
        self.segments.iter().map(Segment::end).max().unwrap_or(0)
    }

    /// Validated insert: the segment kind must match the track and the target
    /// range must not collide with any existing segment. On failure nothing is
    /// mutated. Insertion order is preserved — segments are disjoint, so the
    /// export never needs to resort them.
    pub fn add_segment(&mut self, segment: Segment) -> Result<()> {
        if segment.kind() != self.kind.accepts() {
            return Err(DraftError::TypeMismatch {
                name: self.name.clone(),
                track: self.kind,
                segment: segment.kind(),
            });
        }
        let incoming = segment.target();
        if let Some(existing) = self
            .segments
            .iter()
            .find(|s| s.target().overlaps(&incoming))
        {
            return Err(DraftError::Overlap {
                track: self.name.clone(),
                incoming,
                existing: existing.target(),
            });
        }
        self.segments.push(segment);
        Ok(())
    }

    pub fn export_json(&self) -> Value {
        json!({
            "attribute": if self.mute { 1 } else { 0 },
            "flag": 0,
            "id": self.id,
            "is_default_name": false,
            "name": self.name,
            "render_index": self.render_index,
            "segments": self.segments.iter().map(Segment::export_json).collect::<Vec<_>>(),
            "type": self.kind.as_str(),
            "extra_info": { "name": self.name },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::VideoMaterial;
    use crate::text::TextSegment;
    use crate::time::Timerange;
    use crate::video::VideoSegment;

    fn video_segment(start: i64, duration: i64) -> Segment {
        let material = VideoMaterial::new("/m/a.mp4", 10_000_000, 1920, 1080);
        VideoSegment::new(material, Timerange::new(start, duration)).into()
    }

    #[test]
    fn rejects_kind_mismatch_without_mutation() {
        let mut track = Track::new(TrackKind::Video, "main", 0, false);
        let text: Segment = TextSegment::new("x", Timerange::new(0, 1_000_000)).into();
        assert!(matches!(
            track.add_segment(text),
            Err(DraftError::TypeMismatch { .. })
        ));
        assert!(track.segments().is_empty());
    }

    #[test]
    fn rejects_overlap_and_keeps_existing() {
        let mut track = Track::new(TrackKind::Video, "main", 0, false);
        track.add_segment(video_segment(0, 1_000_000)).unwrap();
        let err = track.add_segment(video_segment(500_000, 1_000_000));
        assert!(matches!(err, Err(DraftError::Overlap { .. })));
        assert_eq!(track.segments().len(), 1);

        // Touching ranges are fine.
        track.add_segment(video_segment(1_000_000, 500_000)).unwrap();
        assert_eq!(track.segments().len(), 2);
        assert_eq!(track.end(), 1_500_000);
    }

    #[test]
    fn insertion_order_survives_export() {
        let mut track = Track::new(TrackKind::Video, "main", 0, false);
        track.add_segment(video_segment(2_000_000, 1_000_000)).unwrap();
        track.add_segment(video_segment(0, 1_000_000)).unwrap();
        let exported = track.export_json();
        let segments = exported["segments"].as_array().unwrap();
        assert_eq!(segments[0]["target_timerange"]["start"], 2_000_000);
        assert_eq!(segments[1]["target_timerange"]["start"], 0);
        assert_eq!(exported["extra_info"]["name"], "main");
    }
}
