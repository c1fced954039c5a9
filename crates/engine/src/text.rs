use serde_json::{json, Value};

use crate::meta::{IntroType, OutroType};
use crate::segment::{gen_id, ClipSettings, KeyframeProperty, KeyframeStore};
use crate::time::Timerange;
use crate::video::SegmentAnimations;

/// Character styling of a text segment. Colors are normalized RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: (f64, f64, f64),
    pub alpha: f64,
    /// 0 = left, 1 = center, 2 = right.
    pub align: u8,
    pub vertical: bool,
    pub letter_spacing: i32,
    pub line_spacing: i32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 8.0,
            bold: false,
            italic: false,
            underline: false,
            color: (1.0, 1.0, 1.0),
            alpha: 1.0,
            align: 0,
            vertical: false,
            letter_spacing: 0,
            line_spacing: 0,
        }
    }
}

impl TextStyle {
    /// The style the consumer editor applies to imported subtitles.
    pub fn subtitle() -> Self {
        Self {
            size: 5.0,
            align: 1,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBorder {
    pub alpha: f64,
    pub color: (f64, f64, f64),
    pub width: f64,
}

impl Default for TextBorder {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            color: (0.0, 0.0, 0.0),
            width: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBackground {
    pub color: String,
    pub style: i32,
    pub alpha: f64,
    pub round_radius: f64,
    pub height: f64,
    pub width: f64,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
}

impl Default for TextBackground {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            style: 1,
            alpha: 1.0,
            round_radius: 0.0,
            height: 0.14,
            width: 0.14,
            horizontal_offset: 0.5,
            vertical_offset: 0.5,
        }
    }
}

/// Speech-bubble style resource behind the text.
#[derive(Debug, Clone)]
pub struct TextBubble {
    pub id: String,
    pub effect_id: String,
    pub resource_id: String,
}

impl TextBubble {
    pub fn new(effect_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            id: gen_id(),
            effect_id: effect_id.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "text_shape",
        })
    }
}

/// Decorative ("flower") text effect resource.
#[derive(Debug, Clone)]
pub struct TextEffect {
    pub id: String,
    pub effect_id: String,
    pub resource_id: String,
}

impl TextEffect {
    pub fn new(effect_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            id: gen_id(),
            effect_id: effect_id.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "text_effect",
        })
    }
}

/// A subtitle or caption on the timeline. The styled text itself is a
/// registry record (`texts`), referenced from the segment by `material_id`.
#[derive(Debug, Clone)]
pub struct TextSegment {
    pub id: String,
    pub material_id: String,
    pub text: String,
    pub target: Timerange,
    pub style: TextStyle,
    pub border: Option<TextBorder>,
    pub background: Option<TextBackground>,
    pub bubble: Option<TextBubble>,
    pub effect: Option<TextEffect>,
    pub animations: Option<SegmentAnimations>,
    pub clip: ClipSettings,
    pub keyframes: KeyframeStore,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, target: Timerange) -> Self {
        Self {
            id: gen_id(),
            material_id: gen_id(),
            text: text.into(),
            target,
            style: TextStyle::default(),
            border: None,
            background: None,
            bubble: None,
            effect: None,
            animations: None,
            clip: ClipSettings::default(),
            keyframes: KeyframeStore::default(),
        }
    }

    /// New segment carrying over every style aspect of `reference`. Shared
    /// style resources (bubble, flower effect) keep their ids so the registry
    /// stores them once.
    pub fn from_template(text: impl Into<String>, target: Timerange, reference: &TextSegment) -> Self {
        let mut segment = Self::new(text, target);
        segment.style = reference.style.clone();
        segment.border = reference.border.clone();
        segment.background = reference.background.clone();
        segment.bubble = reference.bubble.clone();
        segment.effect = reference.effect.clone();
        segment.clip = reference.clip;
        segment
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_clip_settings(mut self, clip: ClipSettings) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_border(mut self, border: TextBorder) -> Self {
        self.border = Some(border);
        self
    }

    pub fn with_background(mut self, background: TextBackground) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_bubble(mut self, bubble: TextBubble) -> Self {
        self.bubble = Some(bubble);
        self
    }

    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = Some(effect);
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

    pub fn with_keyframe(
        mut self,
        property: KeyframeProperty,
        time_offset: i64,
        value: f64,
    ) -> Self {
        self.keyframes.insert(property, time_offset, value);
        self
    }

    /// The consumer's escaped rich-text payload: a JSON document serialized
    /// into a string field of the material record.
    fn content_string(&self) -> String {
        let (r, g, b) = self.style.color;
        json!({
            "text": self.text,
            "styles": [{
                "fill": { "content": { "solid": { "color": [r, g, b] } } },
                "range": [0, self.text.chars().count()],
                "size": self.style.size,
                "bold": self.style.bold,
                "italic": self.style.italic,
                "underline": self.style.underline,
            }],
        })
        .to_string()
    }

    /// The registry record for this segment, rebuilt at export time.
    pub fn export_material(&self) -> Value {
        let mut record = json!({
            "id": self.material_id,
            "type": "text",
            "content": self.content_string(),
            "alignment": self.style.align,
            "typesetting": if self.style.vertical { 1 } else { 0 },
            "letter_spacing": self.style.letter_spacing,
            "line_spacing": self.style.line_spacing,
            "font_size": self.style.size,
            "text_color": hex_color(self.style.color),
            "text_alpha": self.style.alpha,
            "check_flag": 7,
        });
        if let Some(border) = &self.border {
            record["border_alpha"] = json!(border.alpha);
            record["border_color"] = json!(hex_color(border.color));
            record["border_width"] = json!(border.width);
        }
        if let Some(background) = &self.background {
            record["background_color"] = json!(background.color);
            record["background_style"] = json!(background.style);
            record["background_alpha"] = json!(background.alpha);
            record["background_round_radius"] = json!(background.round_radius);
            record["background_height"] = json!(background.height);
            record["background_width"] = json!(background.width);
            record["background_horizontal_offset"] = json!(background.horizontal_offset);
            record["background_vertical_offset"] = json!(background.vertical_offset);
        }
        record
    }

    pub fn export_json(&self) -> Value {
        let mut refs = Vec::new();
        if let Some(animations) = &self.animations {
            refs.push(animations.id.clone());
        }
        if let Some(bubble) = &self.bubble {
            refs.push(bubble.id.clone());
        }
        if let Some(effect) = &self.effect {
            refs.push(effect.id.clone());
        }

        json!({
            "id": self.id,
            "type": "text",
            "material_id": self.material_id,
            "target_timerange": self.target,
            "clip": self.clip.export_json(),
            "extra_material_refs": refs,
            "material_animation": self.animations.as_ref().map(|a| a.id.clone()),
            "common_keyframes": self.keyframes.export_json(),
            "visible": true,
            "words": Vec::<Value>::new(),
            "render_index": 0,
        })
    }
}

fn hex_color((r, g, b): (f64, f64, f64)) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8
    )
}
