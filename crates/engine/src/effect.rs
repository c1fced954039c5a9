use serde_json::{json, Value};

use crate::error::Result;
use crate::meta::FilterType;
use crate::segment::gen_id;
use crate::time::Timerange;
use crate::video::{FilterInstance, VideoEffect, VideoEffectType};

/// A standalone effect occupying a span of an effect track. Not bound to any
/// material on disk.
#[derive(Debug, Clone)]
pub struct EffectSegment {
    pub id: String,
    pub target: Timerange,
    pub effect: VideoEffect,
}

impl EffectSegment {
    pub fn new(
        effect_type: impl Into<VideoEffectType>,
        target: Timerange,
        params: Option<&[Option<f64>]>,
    ) -> Result<Self> {
        Ok(Self {
            id: gen_id(),
            target,
            effect: VideoEffect::new(effect_type.into(), params)?,
        })
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "effect",
            "target_timerange": self.target,
            "extra_material_refs": [self.effect.id],
            "visible": true,
            "render_index": 0,
        })
    }
}

/// A standalone color filter occupying a span of a filter track.
#[derive(Debug, Clone)]
pub struct FilterSegment {
    pub id: String,
    pub target: Timerange,
    pub filter: FilterInstance,
}

impl FilterSegment {
    /// `intensity` is normalized 0.0–1.0 here; the document-level entry point
    /// converts from the editor's 0–100 scale.
    pub fn new(filter_type: FilterType, target: Timerange, intensity: f64) -> Self {
        Self {
            id: gen_id(),
            target,
            filter: FilterInstance::new(filter_type, intensity),
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "filter",
            "target_timerange": self.target,
            "extra_material_refs": [self.filter.id],
            "visible": true,
            "render_index": 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::VideoSceneEffectType;

    #[test]
    fn effect_segment_references_its_instance() {
        let segment = EffectSegment::new(
            VideoSceneEffectType::Blur,
            Timerange::new(0, 2_000_000),
            None,
        )
        .unwrap();
        let exported = segment.export_json();
        assert_eq!(exported["type"], "effect");
        assert_eq!(exported["extra_material_refs"][0], segment.effect.id.as_str());
    }

    #[test]
    fn filter_segment_stores_normalized_intensity() {
        let segment = FilterSegment::new(FilterType::Vivid, Timerange::new(0, 1_000_000), 0.5);
        assert_eq!(segment.filter.intensity, 0.5);
    }
}
