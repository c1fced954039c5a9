use serde_json::{json, Value};

use crate::error::{DraftError, Result};
use crate::material::VideoMaterial;
use crate::meta::{
    EffectMeta, FilterType, GroupAnimationType, IntroType, MaskType, OutroType, TransitionType,
    VideoCharacterEffectType, VideoSceneEffectType,
};
use crate::segment::{gen_id, ClipSettings, KeyframeProperty, KeyframeStore, Speed};
use crate::time::Timerange;

/// Scene and character effects share one instance shape; the variant only
/// selects the catalog the metadata comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEffectType {
    Scene(VideoSceneEffectType),
    Character(VideoCharacterEffectType),
}

impl VideoEffectType {
    pub fn meta(&self) -> &'static EffectMeta {
        match self {
            VideoEffectType::Scene(t) => t.meta(),
            VideoEffectType::Character(t) => t.meta(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            VideoEffectType::Scene(_) => "scene",
            VideoEffectType::Character(_) => "character",
        }
    }
}

impl From<VideoSceneEffectType> for VideoEffectType {
    fn from(t: VideoSceneEffectType) -> Self {
        VideoEffectType::Scene(t)
    }
}

impl From<VideoCharacterEffectType> for VideoEffectType {
    fn from(t: VideoCharacterEffectType) -> Self {
        VideoEffectType::Character(t)
    }
}

/// One materialized parameter of an effect instance.
#[derive(Debug, Clone)]
pub struct AdjustParam {
    pub name: String,
    pub default_value: f64,
    pub value: f64,
}

/// An applied video effect, either attached to a segment or standalone on an
/// effect track.
#[derive(Debug, Clone)]
pub struct VideoEffect {
    pub id: String,
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    pub category: String,
    pub adjust_params: Vec<AdjustParam>,
}

impl VideoEffect {
    /// Build an effect instance. `params` entries are 0–100 and map onto each
    /// parameter's own range; `None` (or a missing tail entry) keeps the
    /// default. Arity and range violations reject the whole call.
    pub fn new(effect_type: VideoEffectType, params: Option<&[Option<f64>]>) -> Result<Self> {
        let meta = effect_type.meta();
        let adjust_params = materialize_params(meta, params)?;

        Ok(Self {
            id: gen_id(),
            name: meta.name.to_string(),
            effect_id: meta.effect_id.to_string(),
            resource_id: meta.resource_id.to_string(),
            category: effect_type.category().to_string(),
            adjust_params,
        })
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "video_effect",
            "category_name": self.category,
            "adjust_params": self.adjust_params.iter().map(|p| json!({
                "name": p.name,
                "default_value": p.default_value,
                "value": p.value,
            })).collect::<Vec<_>>(),
        })
    }
}

/// Validate caller parameters against an effect's table and materialize the
/// final values. Shared by video and audio effect instances.
pub(crate) fn materialize_params(
    meta: &EffectMeta,
    params: Option<&[Option<f64>]>,
) -> Result<Vec<AdjustParam>> {
    let given = params.unwrap_or(&[]);
    if given.len() > meta.params.len() {
        return Err(DraftError::TooManyParams {
            effect: meta.name.to_string(),
            arity: meta.params.len(),
            given: given.len(),
        });
    }
    for (index, value) in given.iter().enumerate() {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(v) {
                return Err(DraftError::ParamOutOfRange {
                    effect: meta.name.to_string(),
                    index,
                    value: *v,
                });
            }
        }
    }

    Ok(meta
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let value = match given.get(index).copied().flatten() {
                Some(v) => param.apply(v),
                None => param.default,
            };
            AdjustParam {
                name: param.name.to_string(),
                default_value: param.default,
                value,
            }
        })
        .collect())
}

/// An applied color filter with its intensity, stored normalized to 0.0–1.0.
#[derive(Debug, Clone)]
pub struct FilterInstance {
    pub id: String,
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    pub intensity: f64,
}

impl FilterInstance {
    pub fn new(filter_type: FilterType, intensity: f64) -> Self {
        let meta = filter_type.meta();
        Self {
            id: gen_id(),
            name: meta.name.to_string(),
            effect_id: meta.effect_id.to_string(),
            resource_id: meta.resource_id.to_string(),
            intensity,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "filter",
            "value": self.intensity,
        })
    }
}

/// Transition into the following segment on the same track.
#[derive(Debug, Clone)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    pub duration: i64,
    pub is_overlap: bool,
}

impl Transition {
    pub fn new(transition_type: TransitionType, duration: Option<i64>) -> Self {
        let meta = transition_type.meta();
        Self {
            id: gen_id(),
            name: meta.name.to_string(),
            effect_id: meta.effect_id.to_string(),
            resource_id: meta.resource_id.to_string(),
            duration: duration.unwrap_or(meta.default_duration),
            is_overlap: meta.is_overlap,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "transition",
            "duration": self.duration,
            "is_overlap": self.is_overlap,
        })
    }
}

/// Geometry of an applied mask, in the consumer's normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub feather: f64,
    pub round_corner: f64,
    pub invert: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            width: 0.5,
            height: 0.5,
            rotation: 0.0,
            feather: 0.0,
            round_corner: 0.0,
            invert: false,
        }
    }
}

/// An applied mask. Mask records are per-segment, never deduplicated.
#[derive(Debug, Clone)]
pub struct Mask {
    pub id: String,
    pub name: String,
    pub resource_type: String,
    pub resource_id: String,
    pub config: MaskConfig,
}

impl Mask {
    pub fn new(mask_type: MaskType, config: MaskConfig) -> Self {
        let meta = mask_type.meta();
        Self {
            id: gen_id(),
            name: meta.name.to_string(),
            resource_type: meta.resource_type.to_string(),
            resource_id: meta.resource_id.to_string(),
            config,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "type": "mask",
            "resource_type": self.resource_type,
            "resource_id": self.resource_id,
            "config": {
                "center_x": self.config.center_x,
                "center_y": self.config.center_y,
                "width": self.config.width,
                "height": self.config.height,
                "rotation": self.config.rotation,
                "feather": self.config.feather,
                "round_corner": self.config.round_corner,
                "invert": self.config.invert,
            },
        })
    }
}

/// Canvas background behind a segment that does not fill the frame.
#[derive(Debug, Clone)]
pub struct BackgroundFilling {
    pub id: String,
    pub fill_type: String,
    pub blur: f64,
    pub color: String,
}

impl BackgroundFilling {
    pub fn blur(intensity: f64) -> Self {
        Self {
            id: gen_id(),
            fill_type: "canvas_blur".to_string(),
            blur: intensity,
            color: String::new(),
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            id: gen_id(),
            fill_type: "canvas_color".to_string(),
            blur: 0.0,
            color: color.into(),
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "background_filling",
            "fill_type": self.fill_type,
            "blur": self.blur,
            "color": self.color,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnimationSlot {
    Intro,
    Outro,
    Group,
}

impl AnimationSlot {
    fn as_str(&self) -> &'static str {
        match self {
            AnimationSlot::Intro => "in",
            AnimationSlot::Outro => "out",
            AnimationSlot::Group => "group",
        }
    }
}

#[derive(Debug, Clone)]
struct Animation {
    name: String,
    resource_id: String,
    slot: AnimationSlot,
    start: i64,
    duration: i64,
}

/// The intro/outro/group animation set of one segment, exported as a single
/// `material_animations` record.
#[derive(Debug, Clone)]
pub struct SegmentAnimations {
    pub id: String,
    intro: Option<Animation>,
    outro: Option<Animation>,
    group: Option<Animation>,
}

impl SegmentAnimations {
    pub fn new() -> Self {
        Self {
            id: gen_id(),
            intro: None,
            outro: None,
            group: None,
        }
    }

    pub fn set_intro(&mut self, intro: IntroType, duration: Option<i64>) {
        let meta = intro.meta();
        let duration = duration.unwrap_or(meta.duration);
        self.intro = Some(Animation {
            name: meta.name.to_string(),
            resource_id: meta.resource_id.to_string(),
            slot: AnimationSlot::Intro,
            start: 0,
            duration,
        });
    }

    pub fn set_outro(&mut self, outro: OutroType, duration: Option<i64>, segment_duration: i64) {
        let meta = outro.meta();
        let duration = duration.unwrap_or(meta.duration);
        self.outro = Some(Animation {
            name: meta.name.to_string(),
            resource_id: meta.resource_id.to_string(),
            slot: AnimationSlot::Outro,
            start: (segment_duration - duration).max(0),
            duration,
        });
    }

    pub fn set_group(&mut self, group: GroupAnimationType, segment_duration: i64) {
        let meta = group.meta();
        self.group = Some(Animation {
            name: meta.name.to_string(),
            resource_id: meta.resource_id.to_string(),
            slot: AnimationSlot::Group,
            start: 0,
            duration: segment_duration,
        });
    }

    pub fn export_json(&self) -> Value {
        let entries: Vec<&Animation> = [&self.intro, &self.outro, &self.group]
            .into_iter()
            .filter_map(|a| a.as_ref())
            .collect();
        json!({
            "id": self.id,
            "type": "sticker_animation",
            "multi_language_current": "none",
            "animations": entries.iter().map(|a| json!({
                "name": a.name,
                "id": a.resource_id,
                "type": a.slot.as_str(),
                "material_type": "video",
                "panel": "video",
                "platform": "all",
                "start": a.start,
                "duration": a.duration,
            })).collect::<Vec<_>>(),
            // Flat mirror of the slots; reconstruction reads these.
            "intro_name": self.intro.as_ref().map(|a| a.name.clone()),
            "intro_duration": self.intro.as_ref().map(|a| a.duration),
            "outro_name": self.outro.as_ref().map(|a| a.name.clone()),
            "outro_duration": self.outro.as_ref().map(|a| a.duration),
            "overall_name": self.group.as_ref().map(|a| a.name.clone()),
        })
    }
}

impl Default for SegmentAnimations {
    fn default() -> Self {
        Self::new()
    }
}

/// A video clip placed on the timeline.
#[derive(Debug, Clone)]
pub struct VideoSegment {
    pub id: String,
    pub material: VideoMaterial,
    pub target: Timerange,
    pub source: Timerange,
    pub speed: Speed,
    pub volume: f64,
    pub clip: ClipSettings,
    pub effects: Vec<VideoEffect>,
    pub filters: Vec<FilterInstance>,
    pub transition: Option<Transition>,
    pub mask: Option<Mask>,
    pub background: Option<BackgroundFilling>,
    pub animations: Option<SegmentAnimations>,
    pub keyframes: KeyframeStore,
}

impl VideoSegment {
    /// Place `material` at `target` on the timeline, playing from the start of
    /// the source at normal speed.
    pub fn new(material: VideoMaterial, target: Timerange) -> Self {
        Self {
            id: gen_id(),
            target,
            source: Timerange::new(0, target.duration),
            speed: Speed::default(),
            volume: 1.0,
            clip: ClipSettings::default(),
            effects: Vec::new(),
            filters: Vec::new(),
            transition: None,
            mask: None,
            background: None,
            animations: None,
            keyframes: KeyframeStore::default(),
            material,
        }
    }

    /// Play a specific part of the material; speed follows from the ratio of
    /// source to target duration.
    pub fn with_source(mut self, source: Timerange) -> Self {
        self.source = source;
        if self.target.duration > 0 {
            self.speed = Speed::new(source.duration as f64 / self.target.duration as f64);
        }
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Speed::new(speed);
        self.source.duration = (self.target.duration as f64 * speed).round() as i64;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_clip_settings(mut self, clip: ClipSettings) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_effect(
        mut self,
        effect_type: impl Into<VideoEffectType>,
        params: Option<&[Option<f64>]>,
    ) -> Result<Self> {
        self.effects.push(VideoEffect::new(effect_type.into(), params)?);
        Ok(self)
    }

    /// Attach a color filter; `intensity` is 0–100 as shown in the editor UI.
    pub fn with_filter(mut self, filter_type: FilterType, intensity: f64) -> Self {
        self.filters
            .push(FilterInstance::new(filter_type, intensity / 100.0));
        self
    }

    pub fn with_transition(mut self, transition_type: TransitionType, duration: Option<i64>) -> Self {
        self.transition = Some(Transition::new(transition_type, duration));
        self
    }

    pub fn with_mask(mut self, mask_type: MaskType, config: MaskConfig) -> Self {
        self.mask = Some(Mask::new(mask_type, config));
        self
    }

    pub fn with_background(mut self, background: BackgroundFilling) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_intro(mut self, intro: IntroType, duration: Option<i64>) -> Self {
        self.animations
            .get_or_insert_with(SegmentAnimations::new)
            .set_intro(intro, duration);
        self
    }

    pub fn with_outro(mut self, outro: OutroType, duration: Option<i64>) -> Self {
        let segment_duration = self.target.duration;
        self.animations
            .get_or_insert_with(SegmentAnimations::new)
            .set_outro(outro, duration, segment_duration);
        self
    }

    pub fn with_group_animation(mut self, group: GroupAnimationType) -> Self {
        let segment_duration = self.target.duration;
        self.animations
            .get_or_insert_with(SegmentAnimations::new)
            .set_group(group, segment_duration);
        self
    }

    pub fn with_keyframe(
        mut self,
        property: KeyframeProperty,
        time_offset: i64,
        value: f64,
    ) -> Self {
        self.keyframes.insert(property, time_offset, value);
        self
    }

    pub fn export_json(&self) -> Value {
        let mut refs = vec![self.speed.id.clone()];
        if let Some(animations) = &self.animations {
            refs.push(animations.id.clone());
        }
        if let Some(transition) = &self.transition {
            refs.push(transition.id.clone());
        }
        if let Some(mask) = &self.mask {
            refs.push(mask.id.clone());
        }
        if let Some(background) = &self.background {
            refs.push(background.id.clone());
        }
        refs.extend(self.effects.iter().map(|e| e.id.clone()));
        refs.extend(self.filters.iter().map(|f| f.id.clone()));

        json!({
            "id": self.id,
            "type": "video",
            "material_id": self.material.id,
            "target_timerange": self.target,
            "source_timerange": self.source,
            "speed": self.speed.speed,
            "volume": self.volume,
            "visible": true,
            "clip": self.clip.export_json(),
            "uniform_scale": { "on": true, "value": 1.0 },
            "extra_material_refs": refs,
            "material_animation": self.animations.as_ref().map(|a| a.id.clone()),
            "common_keyframes": self.keyframes.export_json(),
            "enable_adjust": true,
            "cartoon": false,
            "render_index": 0,
        })
    }
}

/// A sticker placed on the timeline; the sticker resource itself lives in the
/// registry as a per-segment record.
#[derive(Debug, Clone)]
pub struct StickerSegment {
    pub id: String,
    pub material_id: String,
    pub resource_id: String,
    pub target: Timerange,
    pub clip: ClipSettings,
}

impl StickerSegment {
    pub fn new(resource_id: impl Into<String>, target: Timerange) -> Self {
        Self {
            id: gen_id(),
            material_id: gen_id(),
            resource_id: resource_id.into(),
            target,
            clip: ClipSettings::default(),
        }
    }

    pub fn with_clip_settings(mut self, clip: ClipSettings) -> Self {
        self.clip = clip;
        self
    }

    /// The registry record for this sticker.
    pub fn export_material(&self) -> Value {
        json!({
            "id": self.material_id,
            "type": "sticker",
            "resource_id": self.resource_id,
            "sticker_id": self.resource_id,
            "category_name": "",
        })
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "sticker",
            "material_id": self.material_id,
            "target_timerange": self.target,
            "clip": self.clip.export_json(),
            "visible": true,
            "extra_material_refs": Vec::<String>::new(),
            "render_index": 0,
        })
    }
}
