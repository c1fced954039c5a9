use serde_json::{Map, Value};

use crate::audio::{AudioEffect, AudioFade};
use crate::material::{AudioMaterial, VideoMaterial};
use crate::segment::Speed;
use crate::text::{TextBubble, TextEffect};
use crate::video::{BackgroundFilling, FilterInstance, Mask, SegmentAnimations, Transition, VideoEffect};

/// Every key the consumer format requires in the `materials` object.
///
/// This table is a frozen compatibility contract: keys the engine never
/// populates must still be emitted as empty arrays, so the list is kept
/// verbatim rather than derived from the populated collections.
const MATERIAL_KEYS: &[&str] = &[
    "ai_translates",
    "audio_balances",
    "audio_effects",
    "audio_fades",
    "audio_track_indexes",
    "audios",
    "beats",
    "canvases",
    "chromas",
    "color_curves",
    "digital_humans",
    "drafts",
    "effects",
    "flowers",
    "green_screens",
    "handwrites",
    "hsl",
    "images",
    "log_color_wheels",
    "loudnesses",
    "manual_deformations",
    "masks",
    "material_animations",
    "material_colors",
    "multi_language_refs",
    "placeholders",
    "plugin_effects",
    "primary_color_wheels",
    "realtime_denoises",
    "shapes",
    "smart_crops",
    "smart_relights",
    "sound_channel_mappings",
    "speeds",
    "stickers",
    "tail_leaders",
    "text_templates",
    "texts",
    "time_marks",
    "transitions",
    "video_effects",
    "video_trackings",
    "videos",
    "vocal_beautifys",
    "vocal_separations",
];

/// Entries of the `effects` collection: color filters plus the text style
/// resources that the consumer format files under the same key.
#[derive(Debug, Clone)]
pub enum EffectsRecord {
    Filter(FilterInstance),
    TextBubble(TextBubble),
    TextEffect(TextEffect),
}

impl EffectsRecord {
    pub fn id(&self) -> &str {
        match self {
            EffectsRecord::Filter(f) => &f.id,
            EffectsRecord::TextBubble(b) => &b.id,
            EffectsRecord::TextEffect(e) => &e.id,
        }
    }

    pub fn export_json(&self) -> Value {
        match self {
            EffectsRecord::Filter(f) => f.export_json(),
            EffectsRecord::TextBubble(b) => b.export_json(),
            EffectsRecord::TextEffect(e) => e.export_json(),
        }
    }
}

/// Document-wide collections of every resource referenced by any segment.
///
/// Shared resources (materials, effects, fades, animations, transitions,
/// filters) are deduplicated by id; per-segment records (speeds, masks,
/// canvases, stickers, texts) are appended as-is.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    pub videos: Vec<VideoMaterial>,
    pub audios: Vec<AudioMaterial>,
    pub stickers: Vec<Value>,
    pub texts: Vec<Value>,
    pub audio_effects: Vec<AudioEffect>,
    pub audio_fades: Vec<AudioFade>,
    pub animations: Vec<SegmentAnimations>,
    pub video_effects: Vec<VideoEffect>,
    pub speeds: Vec<Speed>,
    pub masks: Vec<Mask>,
    pub transitions: Vec<Transition>,
    pub filters: Vec<EffectsRecord>,
    pub canvases: Vec<BackgroundFilling>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_video(&self, id: &str) -> bool {
        self.videos.iter().any(|m| m.id == id)
    }

    pub fn contains_audio(&self, id: &str) -> bool {
        self.audios.iter().any(|m| m.id == id)
    }

    /// Idempotent insert; returns whether the material was actually added.
    pub fn add_video(&mut self, material: &VideoMaterial) -> bool {
        if self.contains_video(&material.id) {
            return false;
        }
        self.videos.push(material.clone());
        true
    }

    pub fn add_audio(&mut self, material: &AudioMaterial) -> bool {
        if self.contains_audio(&material.id) {
            return false;
        }
        self.audios.push(material.clone());
        true
    }

    pub fn add_audio_effect(&mut self, effect: &AudioEffect) {
        if !self.audio_effects.iter().any(|e| e.id == effect.id) {
            self.audio_effects.push(effect.clone());
        }
    }

    pub fn add_audio_fade(&mut self, fade: &AudioFade) {
        if !self.audio_fades.iter().any(|f| f.id == fade.id) {
            self.audio_fades.push(fade.clone());
        }
    }

    pub fn add_animations(&mut self, animations: &SegmentAnimations) {
        if !self.animations.iter().any(|a| a.id == animations.id) {
            self.animations.push(animations.clone());
        }
    }

    pub fn add_video_effect(&mut self, effect: &VideoEffect) {
        if !self.video_effects.iter().any(|e| e.id == effect.id) {
            self.video_effects.push(effect.clone());
        }
    }

    pub fn add_transition(&mut self, transition: &Transition) {
        if !self.transitions.iter().any(|t| t.id == transition.id) {
            self.transitions.push(transition.clone());
        }
    }

    pub fn add_filter(&mut self, filter: &FilterInstance) {
        if !self.filters.iter().any(|f| f.id() == filter.id) {
            self.filters.push(EffectsRecord::Filter(filter.clone()));
        }
    }

    pub fn add_text_bubble(&mut self, bubble: &TextBubble) {
        if !self.filters.iter().any(|f| f.id() == bubble.id) {
            self.filters.push(EffectsRecord::TextBubble(bubble.clone()));
        }
    }

    pub fn add_text_effect(&mut self, effect: &TextEffect) {
        if !self.filters.iter().any(|f| f.id() == effect.id) {
            self.filters.push(EffectsRecord::TextEffect(effect.clone()));
        }
    }

    // Per-segment records, appended unconditionally.

    pub fn add_speed(&mut self, speed: &Speed) {
        self.speeds.push(speed.clone());
    }

    pub fn add_mask(&mut self, mask: &Mask) {
        self.masks.push(mask.clone());
    }

    pub fn add_canvas(&mut self, canvas: &BackgroundFilling) {
        self.canvases.push(canvas.clone());
    }

    pub fn add_sticker_record(&mut self, record: Value) {
        self.stickers.push(record);
    }

    /// Replace the text records wholesale; export derives them from the live
    /// text segments so stale entries never linger.
    pub fn set_texts(&mut self, texts: Vec<Value>) {
        self.texts = texts;
    }

    pub fn export_json(&self) -> Value {
        let mut map = Map::new();
        for key in MATERIAL_KEYS {
            map.insert((*key).to_string(), Value::Array(Vec::new()));
        }

        map.insert(
            "audios".to_string(),
            self.audios.iter().map(AudioMaterial::export_json).collect(),
        );
        map.insert(
            "videos".to_string(),
            self.videos.iter().map(VideoMaterial::export_json).collect(),
        );
        map.insert("stickers".to_string(), Value::Array(self.stickers.clone()));
        map.insert("texts".to_string(), Value::Array(self.texts.clone()));
        map.insert(
            "audio_effects".to_string(),
            self.audio_effects.iter().map(AudioEffect::export_json).collect(),
        );
        map.insert(
            "audio_fades".to_string(),
            self.audio_fades.iter().map(AudioFade::export_json).collect(),
        );
        map.insert(
            "material_animations".to_string(),
            self.animations.iter().map(SegmentAnimations::export_json).collect(),
        );
        map.insert(
            "video_effects".to_string(),
            self.video_effects.iter().map(VideoEffect::export_json).collect(),
        );
        map.insert(
            "speeds".to_string(),
            self.speeds.iter().map(Speed::export_json).collect(),
        );
        map.insert(
            "masks".to_string(),
            self.masks.iter().map(Mask::export_json).collect(),
        );
        map.insert(
            "transitions".to_string(),
            self.transitions.iter().map(Transition::export_json).collect(),
        );
        map.insert(
            "effects".to_string(),
            self.filters.iter().map(EffectsRecord::export_json).collect(),
        );
        map.insert(
            "canvases".to_string(),
            self.canvases.iter().map(BackgroundFilling::export_json).collect(),
        );

        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{FilterType, TransitionType};

    #[test]
    fn export_contains_every_frozen_key() {
        let exported = MaterialRegistry::new().export_json();
        let object = exported.as_object().unwrap();
        assert_eq!(object.len(), MATERIAL_KEYS.len());
        for key in MATERIAL_KEYS {
            assert!(
                object.get(*key).map(|v| v.is_array()).unwrap_or(false),
                "missing or non-array key {key}"
            );
        }
        assert!(object["ai_translates"].as_array().unwrap().is_empty());
    }

    #[test]
    fn material_insert_is_idempotent() {
        let mut registry = MaterialRegistry::new();
        let material = VideoMaterial::new("/m/a.mp4", 1_000_000, 1280, 720);
        assert!(registry.add_video(&material));
        assert!(!registry.add_video(&material));
        assert_eq!(registry.videos.len(), 1);
    }

    #[test]
    fn shared_resources_deduplicate_but_speeds_do_not() {
        let mut registry = MaterialRegistry::new();
        let transition = Transition::new(TransitionType::Dissolve, None);
        registry.add_transition(&transition);
        registry.add_transition(&transition);
        assert_eq!(registry.transitions.len(), 1);

        let speed = Speed::new(1.0);
        registry.add_speed(&speed);
        registry.add_speed(&speed);
        assert_eq!(registry.speeds.len(), 2);
    }

    #[test]
    fn filters_and_text_resources_share_the_effects_key() {
        let mut registry = MaterialRegistry::new();
        registry.add_filter(&FilterInstance::new(FilterType::Retro, 0.5));
        registry.add_text_bubble(&crate::text::TextBubble::new("1", "2"));
        let exported = registry.export_json();
        let effects = exported["effects"].as_array().unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0]["type"], "filter");
        assert_eq!(effects[1]["type"], "text_shape");
    }
}
