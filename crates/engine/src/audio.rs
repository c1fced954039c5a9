use serde_json::{json, Value};

use crate::error::Result;
use crate::material::AudioMaterial;
use crate::meta::AudioSceneEffectType;
use crate::segment::{gen_id, KeyframeProperty, KeyframeStore, Speed};
use crate::time::Timerange;
use crate::video::{materialize_params, AdjustParam};

/// Fade-in/fade-out envelope of one audio segment.
#[derive(Debug, Clone)]
pub struct AudioFade {
    pub id: String,
    pub in_duration: i64,
    pub out_duration: i64,
}

impl AudioFade {
    pub fn new(in_duration: i64, out_duration: i64) -> Self {
        Self {
            id: gen_id(),
            in_duration,
            out_duration,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "fade_in_duration": self.in_duration,
            "fade_out_duration": self.out_duration,
            "type": "audio_fade",
        })
    }
}

/// An applied audio effect.
#[derive(Debug, Clone)]
pub struct AudioEffect {
    pub id: String,
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    pub adjust_params: Vec<AdjustParam>,
}

impl AudioEffect {
    pub fn new(effect_type: AudioSceneEffectType, params: Option<&[Option<f64>]>) -> Result<Self> {
        let meta = effect_type.meta();
        let adjust_params = materialize_params(meta, params)?;
        Ok(Self {
            id: gen_id(),
            name: meta.name.to_string(),
            effect_id: meta.effect_id.to_string(),
            resource_id: meta.resource_id.to_string(),
            adjust_params,
        })
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "effect_id": self.effect_id,
            "resource_id": self.resource_id,
            "type": "audio_effect",
            "adjust_params": self.adjust_params.iter().map(|p| json!({
                "name": p.name,
                "default_value": p.default_value,
                "value": p.value,
            })).collect::<Vec<_>>(),
        })
    }
}

/// An audio clip placed on the timeline.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub id: String,
    pub material: AudioMaterial,
    pub target: Timerange,
    pub source: Timerange,
    pub speed: Speed,
    pub volume: f64,
    pub fade: Option<AudioFade>,
    pub effects: Vec<AudioEffect>,
    pub keyframes: KeyframeStore,
}

impl AudioSegment {
    pub fn new(material: AudioMaterial, target: Timerange) -> Self {
        Self {
            id: gen_id(),
            target,
            source: Timerange::new(0, target.duration),
            speed: Speed::default(),
            volume: 1.0,
            fade: None,
            effects: Vec::new(),
            keyframes: KeyframeStore::default(),
            material,
        }
    }

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

    pub fn with_fade(mut self, in_duration: i64, out_duration: i64) -> Self {
        self.fade = Some(AudioFade::new(in_duration, out_duration));
        self
    }

    pub fn with_effect(
        mut self,
        effect_type: AudioSceneEffectType,
        params: Option<&[Option<f64>]>,
    ) -> Result<Self> {
        self.effects.push(AudioEffect::new(effect_type, params)?);
        Ok(self)
    }

    pub fn with_keyframe(mut self, time_offset: i64, volume: f64) -> Self {
        self.keyframes
            .insert(KeyframeProperty::Volume, time_offset, volume);
        self
    }

    pub fn export_json(&self) -> Value {
        let mut refs = vec![self.speed.id.clone()];
        if let Some(fade) = &self.fade {
            refs.push(fade.id.clone());
        }
        refs.extend(self.effects.iter().map(|e| e.id.clone()));

        json!({
            "id": self.id,
            "type": "audio",
            "material_id": self.material.id,
            "target_timerange": self.target,
            "source_timerange": self.source,
            "speed": self.speed.speed,
            "volume": self.volume,
            "visible": true,
            "extra_material_refs": refs,
            "common_keyframes": self.keyframes.export_json(),
            "render_index": 0,
        })
    }
}
