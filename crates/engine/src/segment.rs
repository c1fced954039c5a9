use serde_json::{json, Value};
use uuid::Uuid;

use crate::audio::AudioSegment;
use crate::effect::{EffectSegment, FilterSegment};
use crate::text::TextSegment;
use crate::time::Timerange;
use crate::video::{StickerSegment, VideoSegment};

pub(crate) fn gen_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// Discriminant of the closed segment union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Video,
    Audio,
    Text,
    Effect,
    Filter,
    Sticker,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Video => "video",
            SegmentKind::Audio => "audio",
            SegmentKind::Text => "text",
            SegmentKind::Effect => "effect",
            SegmentKind::Filter => "filter",
            SegmentKind::Sticker => "sticker",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-space transform applied to a video or text segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSettings {
    pub alpha: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub transform_x: f64,
    pub transform_y: f64,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            flip_horizontal: false,
            flip_vertical: false,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            transform_x: 0.0,
            transform_y: 0.0,
        }
    }
}

impl ClipSettings {
    pub fn export_json(&self) -> Value {
        json!({
            "alpha": self.alpha,
            "flip": {
                "horizontal": self.flip_horizontal,
                "vertical": self.flip_vertical,
            },
            "rotation": self.rotation,
            "scale": { "x": self.scale_x, "y": self.scale_y },
            "transform": { "x": self.transform_x, "y": self.transform_y },
        })
    }
}

/// Per-segment playback speed record. Unlike effects, every segment gets its
/// own record in the registry, never shared.
#[derive(Debug, Clone)]
pub struct Speed {
    pub id: String,
    pub speed: f64,
}

impl Speed {
    pub fn new(speed: f64) -> Self {
        Self {
            id: gen_id(),
            speed,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "speed": self.speed,
            "type": "speed",
            "mode": 0,
            "curve_speed": Value::Null,
        })
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Animatable per-segment properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyframeProperty {
    PositionX,
    PositionY,
    Rotation,
    ScaleX,
    ScaleY,
    UniformScale,
    Alpha,
    Saturation,
    Contrast,
    Brightness,
    Volume,
}

impl KeyframeProperty {
    pub fn export_name(&self) -> &'static str {
        match self {
            KeyframeProperty::PositionX => "KFTypePositionX",
            KeyframeProperty::PositionY => "KFTypePositionY",
            KeyframeProperty::Rotation => "KFTypeRotation",
            KeyframeProperty::ScaleX => "KFTypeScaleX",
            KeyframeProperty::ScaleY => "KFTypeScaleY",
            KeyframeProperty::UniformScale => "UNIFORM_SCALE",
            KeyframeProperty::Alpha => "KFTypeAlpha",
            KeyframeProperty::Saturation => "KFTypeSaturation",
            KeyframeProperty::Contrast => "KFTypeContrast",
            KeyframeProperty::Brightness => "KFTypeBrightness",
            KeyframeProperty::Volume => "KFTypeVolume",
        }
    }
}

/// One value sample at an offset within the owning segment.
#[derive(Debug, Clone)]
pub struct Keyframe {
    pub id: String,
    pub time_offset: i64,
    pub value: f64,
}

/// Keyframes for one property, kept ordered by `time_offset`.
#[derive(Debug, Clone)]
pub struct KeyframeList {
    pub id: String,
    pub property: KeyframeProperty,
    pub keyframes: Vec<Keyframe>,
}

impl KeyframeList {
    fn new(property: KeyframeProperty) -> Self {
        Self {
            id: gen_id(),
            property,
            keyframes: Vec::new(),
        }
    }

    fn insert(&mut self, time_offset: i64, value: f64) {
        let keyframe = Keyframe {
            id: gen_id(),
            time_offset,
            value,
        };
        let at = self
            .keyframes
            .partition_point(|k| k.time_offset <= time_offset);
        self.keyframes.insert(at, keyframe);
    }

    fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "material_id": "",
            "property_type": self.property.export_name(),
            "keyframe_list": self.keyframes.iter().map(|k| json!({
                "id": k.id,
                "time_offset": k.time_offset,
                "values": [k.value],
            })).collect::<Vec<_>>(),
        })
    }
}

/// All keyframe lists owned by a segment, one list per property.
#[derive(Debug, Clone, Default)]
pub struct KeyframeStore {
    lists: Vec<KeyframeList>,
}

impl KeyframeStore {
    pub fn insert(&mut self, property: KeyframeProperty, time_offset: i64, value: f64) {
        match self.lists.iter_mut().find(|l| l.property == property) {
            Some(list) => list.insert(time_offset, value),
            None => {
                let mut list = KeyframeList::new(property);
                list.insert(time_offset, value);
                self.lists.push(list);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn lists(&self) -> &[KeyframeList] {
        &self.lists
    }

    pub fn export_json(&self) -> Value {
        Value::Array(self.lists.iter().map(KeyframeList::export_json).collect())
    }
}

/// A timeline entry. Closed union: track compatibility checks and registry
/// fan-out dispatch exhaustively over this.
#[derive(Debug, Clone)]
pub enum Segment {
    Video(VideoSegment),
    Audio(AudioSegment),
    Text(TextSegment),
    Effect(EffectSegment),
    Filter(FilterSegment),
    Sticker(StickerSegment),
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Video(_) => SegmentKind::Video,
            Segment::Audio(_) => SegmentKind::Audio,
            Segment::Text(_) => SegmentKind::Text,
            Segment::Effect(_) => SegmentKind::Effect,
            Segment::Filter(_) => SegmentKind::Filter,
            Segment::Sticker(_) => SegmentKind::Sticker,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Segment::Video(s) => &s.id,
            Segment::Audio(s) => &s.id,
            Segment::Text(s) => &s.id,
            Segment::Effect(s) => &s.id,
            Segment::Filter(s) => &s.id,
            Segment::Sticker(s) => &s.id,
        }
    }

    pub fn target(&self) -> Timerange {
        match self {
            Segment::Video(s) => s.target,
            Segment::Audio(s) => s.target,
            Segment::Text(s) => s.target,
            Segment::Effect(s) => s.target,
            Segment::Filter(s) => s.target,
            Segment::Sticker(s) => s.target,
        }
    }

    pub fn end(&self) -> i64 {
        self.target().end()
    }

    pub fn material_id(&self) -> Option<&str> {
        match self {
            Segment::Video(s) => Some(&s.material.id),
            Segment::Audio(s) => Some(&s.material.id),
            Segment::Text(s) => Some(&s.material_id),
            Segment::Sticker(s) => Some(&s.material_id),
            Segment::Effect(_) | Segment::Filter(_) => None,
        }
    }

    pub fn export_json(&self) -> Value {
        match self {
            Segment::Video(s) => s.export_json(),
            Segment::Audio(s) => s.export_json(),
            Segment::Text(s) => s.export_json(),
            Segment::Effect(s) => s.export_json(),
            Segment::Filter(s) => s.export_json(),
            Segment::Sticker(s) => s.export_json(),
        }
    }
}

impl From<VideoSegment> for Segment {
    fn from(s: VideoSegment) -> Self {
        Segment::Video(s)
    }
}

impl From<AudioSegment> for Segment {
    fn from(s: AudioSegment) -> Self {
        Segment::Audio(s)
    }
}

impl From<TextSegment> for Segment {
    fn from(s: TextSegment) -> Self {
        Segment::Text(s)
    }
}

impl From<StickerSegment> for Segment {
    fn from(s: StickerSegment) -> Self {
        Segment::Sticker(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyframes_stay_ordered_per_property() {
        let mut store = KeyframeStore::default();
        store.insert(KeyframeProperty::Alpha, 2_000_000, 0.5);
        store.insert(KeyframeProperty::Alpha, 0, 1.0);
        store.insert(KeyframeProperty::Alpha, 1_000_000, 0.8);
        store.insert(KeyframeProperty::Volume, 500_000, 0.2);

        assert_eq!(store.lists().len(), 2);
        let alpha = &store.lists()[0];
        assert_eq!(alpha.property, KeyframeProperty::Alpha);
        let offsets: Vec<i64> = alpha.keyframes.iter().map(|k| k.time_offset).collect();
        assert_eq!(offsets, vec![0, 1_000_000, 2_000_000]);
    }

    #[test]
    fn clip_settings_export_shape() {
        let clip = ClipSettings {
            transform_y: -0.8,
            ..ClipSettings::default()
        };
        let v = clip.export_json();
        assert_eq!(v["alpha"], 1.0);
        assert_eq!(v["transform"]["y"], -0.8);
        assert_eq!(v["flip"]["horizontal"], false);
    }
}
