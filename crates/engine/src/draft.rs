use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::audio::{AudioFade, AudioSegment};
use crate::effect::{EffectSegment, FilterSegment};
use crate::error::{DraftError, Result};
use crate::material::{AudioMaterial, VideoMaterial, VideoMaterialKind};
use crate::meta::{FilterType, GroupAnimationType, IntroType, OutroType};
use crate::registry::MaterialRegistry;
use crate::segment::{ClipSettings, Segment, SegmentKind, Speed};
use crate::srt::parse_srt;
use crate::text::{TextSegment, TextStyle};
use crate::time::Timerange;
use crate::track::{Track, TrackKind};
use crate::video::{VideoEffectType, VideoSegment};

/// Reconstruction defaults when the payload omits the canvas.
const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;
const DEFAULT_FPS: u32 = 30;

/// A material that can be registered on the document directly.
#[derive(Debug, Clone)]
pub enum Material {
    Video(VideoMaterial),
    Audio(AudioMaterial),
}

impl From<VideoMaterial> for Material {
    fn from(m: VideoMaterial) -> Self {
        Material::Video(m)
    }
}

impl From<AudioMaterial> for Material {
    fn from(m: AudioMaterial) -> Self {
        Material::Audio(m)
    }
}

/// Placement options for a new track.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackOptions {
    pub mute: bool,
    /// Layer offset within the kind's own band; higher is closer to the
    /// foreground.
    pub relative_index: i32,
    /// Raw render index, overriding the band arithmetic entirely.
    pub absolute_index: Option<i32>,
}

/// Options for [`DraftFile::import_srt`]. At least one of `style_reference`
/// and `clip_settings` must be present.
#[derive(Debug, Clone)]
pub struct SrtImportOptions {
    /// Whole-file shift in microseconds.
    pub time_offset: i64,
    /// Segment whose styling is cloned onto every cue.
    pub style_reference: Option<TextSegment>,
    /// Style applied when no reference is given.
    pub text_style: TextStyle,
    /// Transform applied to every cue; overrides the reference's when both
    /// are present.
    pub clip_settings: Option<ClipSettings>,
}

impl Default for SrtImportOptions {
    fn default() -> Self {
        Self {
            time_offset: 0,
            style_reference: None,
            text_style: TextStyle::subtitle(),
            // The consumer editor drops imported subtitles into the lower
            // quarter of the frame.
            clip_settings: Some(ClipSettings {
                transform_y: -0.8,
                ..ClipSettings::default()
            }),
        }
    }
}

/// What to do when a reconstructed segment's media file is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMedia {
    /// Drop the segment and record it in the report.
    #[default]
    Skip,
    /// Fail the whole reconstruction.
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconstructOptions {
    pub missing_media: MissingMedia,
}

/// One segment dropped during reconstruction.
#[derive(Debug, Clone)]
pub struct SkippedSegment {
    pub segment_id: String,
    pub reason: String,
}

/// What reconstruction could not bring back.
#[derive(Debug, Clone, Default)]
pub struct ReconstructReport {
    pub skipped: Vec<SkippedSegment>,
}

/// An editable draft document: canvas configuration, tracks, and the
/// registry of every referenced resource.
///
/// All operations are synchronous and validate before mutating; callers that
/// share one document across threads must serialize access themselves.
#[derive(Debug, Clone)]
pub struct DraftFile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Microseconds; tracks the maximum segment end ever inserted.
    pub duration: i64,
    tracks: Vec<Track>,
    registry: MaterialRegistry,
}

impl DraftFile {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            duration: 0,
            tracks: Vec::new(),
            registry: MaterialRegistry::new(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    /// Register a material without attaching it to a segment yet. Idempotent:
    /// re-adding an id the registry already holds is a no-op.
    pub fn add_material(&mut self, material: impl Into<Material>) -> &mut Self {
        match material.into() {
            Material::Video(m) => {
                self.registry.add_video(&m);
            }
            Material::Audio(m) => {
                self.registry.add_audio(&m);
            }
        }
        self
    }

    /// Create a track. The name may be omitted only for the first track of a
    /// kind (the kind name is used); it must be unique across the document.
    pub fn add_track(
        &mut self,
        kind: TrackKind,
        name: Option<&str>,
        options: TrackOptions,
    ) -> Result<&mut Self> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                if self.tracks.iter().any(|t| t.kind == kind) {
                    return Err(DraftError::UnnamedDuplicateTrack(kind));
                }
                kind.as_str().to_string()
            }
        };
        if self.tracks.iter().any(|t| t.name == name) {
            return Err(DraftError::DuplicateTrackName(name));
        }

        let render_index = options
            .absolute_index
            .unwrap_or(kind.base_render_index() + options.relative_index);
        debug!(track = %name, kind = %kind, render_index, "adding track");
        self.tracks
            .push(Track::new(kind, name, render_index, options.mute));
        Ok(self)
    }

    /// Find the track a segment of `kind` should land on: by name when given,
    /// otherwise the single track accepting the kind.
    fn resolve_track_index(&self, kind: SegmentKind, name: Option<&str>) -> Result<usize> {
        if let Some(name) = name {
            return self
                .tracks
                .iter()
                .position(|t| t.name == name)
                .ok_or_else(|| DraftError::NoSuchTrack(name.to_string()));
        }
        let mut matching = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind.accepts() == kind);
        let first = matching.next().ok_or(DraftError::NoTrackForKind(kind))?;
        if matching.next().is_some() {
            return Err(DraftError::AmbiguousTrack(kind));
        }
        Ok(first.0)
    }

    /// Insert a segment, then register its material and every attachment into
    /// the registry. Shared resources deduplicate; speed records are
    /// per-segment and always appended.
    pub fn add_segment(
        &mut self,
        segment: impl Into<Segment>,
        track_name: Option<&str>,
    ) -> Result<&mut Self> {
        self.add_segment_value(segment.into(), track_name)
    }

    fn register_segment(&mut self, segment: &Segment) {
        match segment {
            Segment::Video(s) => {
                if let Some(animations) = &s.animations {
                    self.registry.add_animations(animations);
                }
                for effect in &s.effects {
                    self.registry.add_video_effect(effect);
                }
                for filter in &s.filters {
                    self.registry.add_filter(filter);
                }
                if let Some(transition) = &s.transition {
                    self.registry.add_transition(transition);
                }
                if let Some(mask) = &s.mask {
                    self.registry.add_mask(mask);
                }
                if let Some(background) = &s.background {
                    self.registry.add_canvas(background);
                }
                self.registry.add_speed(&s.speed);
                self.registry.add_video(&s.material);
            }
            Segment::Audio(s) => {
                if let Some(fade) = &s.fade {
                    self.registry.add_audio_fade(fade);
                }
                for effect in &s.effects {
                    self.registry.add_audio_effect(effect);
                }
                self.registry.add_speed(&s.speed);
                self.registry.add_audio(&s.material);
            }
            Segment::Text(s) => {
                if let Some(animations) = &s.animations {
                    self.registry.add_animations(animations);
                }
                if let Some(bubble) = &s.bubble {
                    self.registry.add_text_bubble(bubble);
                }
                if let Some(effect) = &s.effect {
                    self.registry.add_text_effect(effect);
                }
                // The text material record itself is rebuilt at export time.
            }
            Segment::Sticker(s) => {
                self.registry.add_sticker_record(s.export_material());
            }
            Segment::Effect(s) => {
                self.registry.add_video_effect(&s.effect);
            }
            Segment::Filter(s) => {
                self.registry.add_filter(&s.filter);
            }
        }
    }

    /// Place a standalone effect on an effect track. `params` are 0–100 per
    /// the editor UI; entries beyond the effect's arity are rejected.
    pub fn add_effect(
        &mut self,
        effect_type: impl Into<VideoEffectType>,
        target: Timerange,
        track_name: Option<&str>,
        params: Option<&[Option<f64>]>,
    ) -> Result<&mut Self> {
        let segment = EffectSegment::new(effect_type, target, params)?;
        self.add_segment_value(Segment::Effect(segment), track_name)
    }

    /// Place a standalone filter on a filter track. `intensity` is 0–100 and
    /// is stored normalized.
    pub fn add_filter(
        &mut self,
        filter_type: FilterType,
        target: Timerange,
        track_name: Option<&str>,
        intensity: f64,
    ) -> Result<&mut Self> {
        if !(0.0..=100.0).contains(&intensity) {
            return Err(DraftError::ParamOutOfRange {
                effect: filter_type.meta().name.to_string(),
                index: 0,
                value: intensity,
            });
        }
        let segment = FilterSegment::new(filter_type, target, intensity / 100.0);
        self.add_segment_value(Segment::Filter(segment), track_name)
    }

    fn add_segment_value(&mut self, segment: Segment, track_name: Option<&str>) -> Result<&mut Self> {
        let index = self.resolve_track_index(segment.kind(), track_name)?;
        self.tracks[index].add_segment(segment.clone())?;
        self.duration = self.duration.max(segment.end());
        self.register_segment(&segment);
        Ok(self)
    }

    /// Import an SRT file as text segments on `track_name`, creating the
    /// track above all other text tracks if it does not exist.
    ///
    /// The whole file is parsed before any segment is inserted, so a
    /// malformed cue leaves the document untouched.
    pub fn import_srt(
        &mut self,
        path: impl AsRef<Path>,
        track_name: &str,
        options: SrtImportOptions,
    ) -> Result<&mut Self> {
        if options.style_reference.is_none() && options.clip_settings.is_none() {
            return Err(DraftError::MissingSubtitleStyle);
        }

        let content = std::fs::read_to_string(path.as_ref())?;
        let cues = parse_srt(&content, options.time_offset)?;
        debug!(
            file = %path.as_ref().display(),
            cues = cues.len(),
            track = track_name,
            "importing srt"
        );

        if self.track(track_name).is_none() {
            self.add_track(
                TrackKind::Text,
                Some(track_name),
                TrackOptions {
                    relative_index: 999,
                    ..TrackOptions::default()
                },
            )?;
        }

        for cue in cues {
            let segment = match &options.style_reference {
                Some(reference) => {
                    let mut segment = TextSegment::from_template(cue.text, cue.range, reference);
                    if let Some(clip) = options.clip_settings {
                        segment.clip = clip;
                    }
                    segment
                }
                None => {
                    let mut segment =
                        TextSegment::new(cue.text, cue.range).with_style(options.text_style.clone());
                    if let Some(clip) = options.clip_settings {
                        segment.clip = clip;
                    }
                    segment
                }
            };
            self.add_segment(segment, Some(track_name))?;
        }
        Ok(self)
    }

    /// Assemble the consumer-format document. Rebuilds the `texts` registry
    /// collection from the live text segments and orders tracks by render
    /// index (stable, so creation order breaks ties).
    pub fn export(&mut self) -> Value {
        let texts: Vec<Value> = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Text)
            .flat_map(|t| t.segments())
            .filter_map(|s| match s {
                Segment::Text(text) => Some(text.export_material()),
                _ => None,
            })
            .collect();
        self.registry.set_texts(texts);

        let mut ordered: Vec<&Track> = self.tracks.iter().collect();
        ordered.sort_by_key(|t| t.render_index);

        debug!(
            tracks = ordered.len(),
            duration = self.duration,
            "exporting draft"
        );
        json!({
            "materials": self.registry.export_json(),
            "tracks": ordered.iter().map(|t| t.export_json()).collect::<Vec<_>>(),
            "fps": self.fps,
            "duration": self.duration,
            "canvas_config": {
                "width": self.width,
                "height": self.height,
                "ratio": "original",
            },
        })
    }

    pub fn dumps(&mut self) -> Result<String> {
        let value = self.export();
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Write the exported document to `path` in one shot.
    pub fn dump(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.dumps()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Rebuild a document from previously exported JSON. Media paths are
    /// resolved against `draft_root`; segments whose media is gone are
    /// skipped (and logged). Use [`DraftFile::from_dict_with`] to fail
    /// instead, or to inspect what was skipped.
    pub fn from_dict(data: &Value, draft_root: &Path) -> Result<DraftFile> {
        Self::from_dict_with(data, draft_root, ReconstructOptions::default())
            .map(|(draft, _)| draft)
    }

    pub fn from_dict_with(
        data: &Value,
        draft_root: &Path,
        options: ReconstructOptions,
    ) -> Result<(DraftFile, ReconstructReport)> {
        let canvas = data.get("canvas_config");
        let width = canvas
            .and_then(|c| c.get("width"))
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_WIDTH as u64) as u32;
        let height = canvas
            .and_then(|c| c.get("height"))
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_HEIGHT as u64) as u32;
        let fps = data
            .get("fps")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_FPS as u64) as u32;

        let mut draft = DraftFile::new(width, height, fps);
        draft.duration = data.get("duration").and_then(Value::as_i64).unwrap_or(0);

        let materials = data.get("materials").cloned().unwrap_or_else(|| json!({}));
        let videos = index_by_id(materials.get("videos"));
        let audios = index_by_id(materials.get("audios"));
        let texts = index_by_id(materials.get("texts"));
        let animations = index_by_id(materials.get("material_animations"));
        let fades = index_by_id(materials.get("audio_fades"));
        let filters: HashMap<&str, &Value> = index_by_id(materials.get("effects"))
            .into_iter()
            .filter(|(_, record)| record["type"] == "filter")
            .collect();

        let mut report = ReconstructReport::default();

        let empty = Vec::new();
        for track_value in data
            .get("tracks")
            .and_then(Value::as_array)
            .unwrap_or(&empty)
        {
            let kind_name = track_value["type"]
                .as_str()
                .ok_or_else(|| DraftError::document("track without a type"))?;
            let kind = TrackKind::from_name(kind_name)
                .ok_or_else(|| DraftError::document(format!("unknown track type '{kind_name}'")))?;
            let name = track_value["extra_info"]["name"]
                .as_str()
                .or_else(|| track_value["name"].as_str())
                .ok_or_else(|| DraftError::document("track without a name"))?
                .to_string();

            if draft.track(&name).is_none() {
                let render_index = track_value["render_index"].as_i64().map(|i| i as i32);
                draft.add_track(
                    kind,
                    Some(&name),
                    TrackOptions {
                        absolute_index: render_index,
                        ..TrackOptions::default()
                    },
                )?;
            }

            for segment_value in track_value["segments"].as_array().unwrap_or(&empty) {
                let segment = match segment_value["type"].as_str() {
                    Some("video") => restore_video_segment(
                        segment_value,
                        &videos,
                        &animations,
                        &filters,
                        draft_root,
                        options.missing_media,
                        &mut report,
                    )?
                    .map(Segment::Video),
                    Some("audio") => restore_audio_segment(
                        segment_value,
                        &audios,
                        &fades,
                        draft_root,
                        options.missing_media,
                        &mut report,
                    )?
                    .map(Segment::Audio),
                    Some("text") => restore_text_segment(segment_value, &texts)?.map(Segment::Text),
                    other => {
                        debug!(kind = ?other, "skipping unsupported segment kind");
                        None
                    }
                };
                if let Some(segment) = segment {
                    draft.add_segment(segment, Some(&name))?;
                }
            }
        }

        Ok((draft, report))
    }
}

fn index_by_id(value: Option<&Value>) -> HashMap<&str, &Value> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(|id| (id, item)))
                .collect()
        })
        .unwrap_or_default()
}

fn required_timerange(value: &Value, key: &str) -> Result<Timerange> {
    let raw = value
        .get(key)
        .ok_or_else(|| DraftError::document(format!("segment without {key}")))?;
    serde_json::from_value(raw.clone())
        .map_err(|_| DraftError::document(format!("malformed {key}")))
}

/// Resolve a persisted material path: absolute paths pass through, relative
/// ones anchor at the draft root.
fn resolve_media_path(raw: &str, draft_root: &Path) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        draft_root.join(raw.trim_start_matches("./"))
    }
}

fn skip_or_fail(
    missing_media: MissingMedia,
    report: &mut ReconstructReport,
    segment_id: &str,
    path: &Path,
) -> Result<()> {
    match missing_media {
        MissingMedia::Fail => Err(DraftError::MissingMedia(path.to_path_buf())),
        MissingMedia::Skip => {
            warn!(
                segment = segment_id,
                path = %path.display(),
                "skipping segment, media file is missing"
            );
            report.skipped.push(SkippedSegment {
                segment_id: segment_id.to_string(),
                reason: format!("media file '{}' does not exist", path.display()),
            });
            Ok(())
        }
    }
}

fn restore_video_segment(
    value: &Value,
    videos: &HashMap<&str, &Value>,
    animations: &HashMap<&str, &Value>,
    filters: &HashMap<&str, &Value>,
    draft_root: &Path,
    missing_media: MissingMedia,
    report: &mut ReconstructReport,
) -> Result<Option<VideoSegment>> {
    let segment_id = value["id"].as_str().unwrap_or_default().to_string();
    let material_id = value["material_id"]
        .as_str()
        .ok_or_else(|| DraftError::document("video segment without material_id"))?;

    let record = match videos.get(material_id) {
        Some(record) => *record,
        None => {
            if missing_media == MissingMedia::Fail {
                return Err(DraftError::UnknownMaterial(material_id.to_string()));
            }
            warn!(
                segment = %segment_id,
                material = material_id,
                "skipping segment, material record is missing"
            );
            report.skipped.push(SkippedSegment {
                segment_id,
                reason: format!("material '{material_id}' has no record"),
            });
            return Ok(None);
        }
    };
    let raw_path = record["path"]
        .as_str()
        .ok_or_else(|| DraftError::document("video material without path"))?;
    let path = resolve_media_path(raw_path, draft_root);
    if !path.exists() {
        skip_or_fail(missing_media, report, &segment_id, &path)?;
        return Ok(None);
    }

    let mut material = VideoMaterial::new(
        path,
        record["duration"].as_i64().unwrap_or(0),
        record["width"].as_u64().unwrap_or(0) as u32,
        record["height"].as_u64().unwrap_or(0) as u32,
    );
    material.id = material_id.to_string();
    if record["type"] == "photo" {
        material.kind = VideoMaterialKind::Photo;
    }

    let target = required_timerange(value, "target_timerange")?;
    let mut segment = VideoSegment::new(material, target);
    if !segment_id.is_empty() {
        segment.id = segment_id;
    }
    if let Ok(source) = required_timerange(value, "source_timerange") {
        segment.source = source;
    }
    if let Some(speed) = value["speed"].as_f64() {
        segment.speed = Speed::new(speed);
    }
    if let Some(volume) = value["volume"].as_f64() {
        segment.volume = volume;
    }
    if let Some(clip) = value.get("clip") {
        segment.clip = clip_from_value(clip);
    }

    if let Some(record) = value["material_animation"]
        .as_str()
        .and_then(|id| animations.get(id))
    {
        if let Some(name) = record["intro_name"].as_str() {
            match IntroType::from_name(name) {
                Some(intro) => {
                    segment = segment.with_intro(intro, record["intro_duration"].as_i64())
                }
                None => warn!(name, "unknown intro animation, dropping"),
            }
        }
        if let Some(name) = record["outro_name"].as_str() {
            match OutroType::from_name(name) {
                Some(outro) => {
                    segment = segment.with_outro(outro, record["outro_duration"].as_i64())
                }
                None => warn!(name, "unknown outro animation, dropping"),
            }
        }
        if let Some(name) = record["overall_name"].as_str() {
            match GroupAnimationType::from_name(name) {
                Some(group) => segment = segment.with_group_animation(group),
                None => warn!(name, "unknown group animation, dropping"),
            }
        }
    }

    for ref_id in value["extra_material_refs"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(Value::as_str)
    {
        if let Some(record) = filters.get(ref_id) {
            let name = record["name"].as_str().unwrap_or_default();
            match FilterType::from_name(name) {
                Some(filter) => {
                    let value = record["value"].as_f64().unwrap_or(1.0);
                    segment = segment.with_filter(filter, value * 100.0);
                }
                None => warn!(name, "unknown filter, dropping"),
            }
        }
    }

    Ok(Some(segment))
}

fn restore_audio_segment(
    value: &Value,
    audios: &HashMap<&str, &Value>,
    fades: &HashMap<&str, &Value>,
    draft_root: &Path,
    missing_media: MissingMedia,
    report: &mut ReconstructReport,
) -> Result<Option<AudioSegment>> {
    let segment_id = value["id"].as_str().unwrap_or_default().to_string();
    let material_id = value["material_id"]
        .as_str()
        .ok_or_else(|| DraftError::document("audio segment without material_id"))?;

    let record = match audios.get(material_id) {
        Some(record) => *record,
        None => {
            if missing_media == MissingMedia::Fail {
                return Err(DraftError::UnknownMaterial(material_id.to_string()));
            }
            warn!(
                segment = %segment_id,
                material = material_id,
                "skipping segment, material record is missing"
            );
            report.skipped.push(SkippedSegment {
                segment_id,
                reason: format!("material '{material_id}' has no record"),
            });
            return Ok(None);
        }
    };
    let raw_path = record["path"]
        .as_str()
        .ok_or_else(|| DraftError::document("audio material without path"))?;
    let path = resolve_media_path(raw_path, draft_root);
    if !path.exists() {
        skip_or_fail(missing_media, report, &segment_id, &path)?;
        return Ok(None);
    }

    let mut material = AudioMaterial::new(path, record["duration"].as_i64().unwrap_or(0));
    material.id = material_id.to_string();

    let target = required_timerange(value, "target_timerange")?;
    let mut segment = AudioSegment::new(material, target);
    if !segment_id.is_empty() {
        segment.id = segment_id;
    }
    if let Ok(source) = required_timerange(value, "source_timerange") {
        segment.source = source;
    }
    if let Some(speed) = value["speed"].as_f64() {
        segment.speed = Speed::new(speed);
    }
    if let Some(volume) = value["volume"].as_f64() {
        segment.volume = volume;
    }

    for ref_id in value["extra_material_refs"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(Value::as_str)
    {
        if let Some(record) = fades.get(ref_id) {
            segment.fade = Some(AudioFade {
                id: ref_id.to_string(),
                in_duration: record["fade_in_duration"].as_i64().unwrap_or(0),
                out_duration: record["fade_out_duration"].as_i64().unwrap_or(0),
            });
        }
    }

    Ok(Some(segment))
}

fn restore_text_segment(
    value: &Value,
    texts: &HashMap<&str, &Value>,
) -> Result<Option<TextSegment>> {
    let segment_id = value["id"].as_str().unwrap_or_default().to_string();
    let material_id = value["material_id"]
        .as_str()
        .ok_or_else(|| DraftError::document("text segment without material_id"))?;
    let record = match texts.get(material_id) {
        Some(record) => *record,
        None => {
            warn!(
                segment = %segment_id,
                material = material_id,
                "skipping text segment, material record is missing"
            );
            return Ok(None);
        }
    };

    let content: Value = record["content"]
        .as_str()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);
    let text = content["text"].as_str().unwrap_or_default().to_string();

    let target = required_timerange(value, "target_timerange")?;
    let mut segment = TextSegment::new(text, target);
    if !segment_id.is_empty() {
        segment.id = segment_id;
    }
    segment.material_id = material_id.to_string();

    let mut style = TextStyle::default();
    if let Some(size) = record["font_size"].as_f64() {
        style.size = size;
    }
    if let Some(align) = record["alignment"].as_u64() {
        style.align = align as u8;
    }
    if let Some(alpha) = record["text_alpha"].as_f64() {
        style.alpha = alpha;
    }
    if let Some(spacing) = record["letter_spacing"].as_i64() {
        style.letter_spacing = spacing as i32;
    }
    if let Some(spacing) = record["line_spacing"].as_i64() {
        style.line_spacing = spacing as i32;
    }
    style.vertical = record["typesetting"].as_u64() == Some(1);
    if let Some(color) = record["text_color"].as_str().and_then(parse_hex_color) {
        style.color = color;
    }
    segment.style = style;

    if let Some(clip) = value.get("clip") {
        segment.clip = clip_from_value(clip);
    }

    Ok(Some(segment))
}

fn clip_from_value(value: &Value) -> ClipSettings {
    let defaults = ClipSettings::default();
    ClipSettings {
        alpha: value["alpha"].as_f64().unwrap_or(defaults.alpha),
        flip_horizontal: value["flip"]["horizontal"].as_bool().unwrap_or(false),
        flip_vertical: value["flip"]["vertical"].as_bool().unwrap_or(false),
        rotation: value["rotation"].as_f64().unwrap_or(defaults.rotation),
        scale_x: value["scale"]["x"].as_f64().unwrap_or(defaults.scale_x),
        scale_y: value["scale"]["y"].as_f64().unwrap_or(defaults.scale_y),
        transform_x: value["transform"]["x"].as_f64().unwrap_or(defaults.transform_x),
        transform_y: value["transform"]["y"].as_f64().unwrap_or(defaults.transform_y),
    }
}

fn parse_hex_color(raw: &str) -> Option<(f64, f64, f64)> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{IntroType, TransitionType, VideoSceneEffectType};
    use crate::video::VideoEffect;

    fn video_material() -> VideoMaterial {
        VideoMaterial::new("/media/clip.mp4", 10_000_000, 1920, 1080)
    }

    fn video_segment(start: i64, duration: i64) -> VideoSegment {
        VideoSegment::new(video_material(), Timerange::new(start, duration))
    }

    #[test]
    fn unnamed_track_allowed_only_once_per_kind() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap();
        let err = draft.add_track(TrackKind::Video, None, TrackOptions::default());
        assert!(matches!(err, Err(DraftError::UnnamedDuplicateTrack(_))));

        draft
            .add_track(TrackKind::Video, Some("b"), TrackOptions { relative_index: 1, ..TrackOptions::default() })
            .unwrap();
        assert_eq!(draft.tracks().len(), 2);
        assert_eq!(draft.track("video").unwrap().render_index, 0);
        assert_eq!(draft.track("b").unwrap().render_index, 1);

        let err = draft.add_track(TrackKind::Audio, Some("b"), TrackOptions::default());
        assert!(matches!(err, Err(DraftError::DuplicateTrackName(_))));
    }

    #[test]
    fn absolute_index_overrides_band_arithmetic() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(
                TrackKind::Text,
                Some("title"),
                TrackOptions {
                    relative_index: 3,
                    absolute_index: Some(42),
                    ..TrackOptions::default()
                },
            )
            .unwrap();
        assert_eq!(draft.track("title").unwrap().render_index, 42);
    }

    #[test]
    fn segment_resolution_needs_an_unambiguous_track() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        let err = draft.add_segment(video_segment(0, 1_000_000), None);
        assert!(matches!(err, Err(DraftError::NoTrackForKind(_))));

        draft
            .add_track(TrackKind::Video, Some("a"), TrackOptions::default())
            .unwrap()
            .add_track(TrackKind::Video, Some("b"), TrackOptions::default())
            .unwrap();
        let err = draft.add_segment(video_segment(0, 1_000_000), None);
        assert!(matches!(err, Err(DraftError::AmbiguousTrack(_))));

        draft
            .add_segment(video_segment(0, 1_000_000), Some("a"))
            .unwrap();
        let err = draft.add_segment(video_segment(0, 1_000_000), Some("missing"));
        assert!(matches!(err, Err(DraftError::NoSuchTrack(_))));
    }

    #[test]
    fn overlap_rejected_and_track_unchanged() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap()
            .add_segment(video_segment(0, 1_000_000), None)
            .unwrap();
        let err = draft.add_segment(video_segment(500_000, 1_000_000), None);
        assert!(matches!(err, Err(DraftError::Overlap { .. })));
        assert_eq!(draft.track("video").unwrap().segments().len(), 1);
        assert_eq!(draft.duration, 1_000_000);
    }

    #[test]
    fn duration_is_monotone_max_of_segment_ends() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap()
            .add_segment(video_segment(2_000_000, 3_000_000), None)
            .unwrap();
        assert_eq!(draft.duration, 5_000_000);
        // Inserting an earlier segment never shrinks the duration.
        draft.add_segment(video_segment(0, 1_000_000), None).unwrap();
        assert_eq!(draft.duration, 5_000_000);
    }

    #[test]
    fn add_material_is_idempotent() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        let material = video_material();
        draft.add_material(material.clone()).add_material(material);
        assert_eq!(draft.registry().videos.len(), 1);
    }

    #[test]
    fn shared_attachments_register_once_speeds_per_segment() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap();

        // Two segments sharing one material and one effect definition.
        let material = video_material();
        let effect = VideoEffect::new(VideoSceneEffectType::Glitch.into(), None).unwrap();
        let mut first = VideoSegment::new(material.clone(), Timerange::new(0, 1_000_000));
        first.effects.push(effect.clone());
        let mut second = VideoSegment::new(material, Timerange::new(1_000_000, 1_000_000));
        second.effects.push(effect);

        draft.add_segment(first, None).unwrap();
        draft.add_segment(second, None).unwrap();

        assert_eq!(draft.registry().video_effects.len(), 1);
        assert_eq!(draft.registry().videos.len(), 1);
        // Speed records stay per-segment.
        assert_eq!(draft.registry().speeds.len(), 2);
    }

    #[test]
    fn sticker_segments_register_their_records() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Sticker, None, TrackOptions::default())
            .unwrap()
            .add_segment(
                crate::video::StickerSegment::new("7012345", Timerange::new(0, 2_000_000)),
                None,
            )
            .unwrap();
        assert_eq!(draft.registry().stickers.len(), 1);
        assert_eq!(draft.registry().stickers[0]["resource_id"], "7012345");
        assert_eq!(draft.duration, 2_000_000);
    }

    #[test]
    fn add_effect_validates_params_and_updates_duration() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Effect, None, TrackOptions::default())
            .unwrap();

        let err = draft.add_effect(
            VideoSceneEffectType::Glitch,
            Timerange::new(0, 1_000_000),
            None,
            Some(&[Some(120.0)]),
        );
        assert!(matches!(err, Err(DraftError::ParamOutOfRange { .. })));
        assert!(draft.track("effect").unwrap().segments().is_empty());

        draft
            .add_effect(
                VideoSceneEffectType::Glitch,
                Timerange::new(0, 2_000_000),
                None,
                Some(&[Some(40.0)]),
            )
            .unwrap();
        assert_eq!(draft.duration, 2_000_000);
        assert_eq!(draft.registry().video_effects.len(), 1);
    }

    #[test]
    fn filter_intensity_is_stored_normalized() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Filter, None, TrackOptions::default())
            .unwrap()
            .add_filter(FilterType::Retro, Timerange::new(0, 1_000_000), None, 50.0)
            .unwrap();

        let record = &draft.registry().filters[0];
        match record {
            crate::registry::EffectsRecord::Filter(f) => assert_eq!(f.intensity, 0.5),
            other => panic!("unexpected record {other:?}"),
        }
        let exported = draft.export();
        assert_eq!(exported["materials"]["effects"][0]["value"], 0.5);

        let err = draft.add_filter(FilterType::Retro, Timerange::new(2_000_000, 1_000_000), None, 101.0);
        assert!(matches!(err, Err(DraftError::ParamOutOfRange { .. })));
    }

    #[test]
    fn export_shape_and_track_order() {
        let mut draft = DraftFile::new(1080, 1920, 25);
        draft
            .add_track(TrackKind::Text, Some("subs"), TrackOptions::default())
            .unwrap()
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap()
            .add_segment(video_segment(0, 1_500_000), None)
            .unwrap();

        let exported = draft.export();
        assert_eq!(exported["fps"], 25);
        assert_eq!(exported["duration"], 1_500_000);
        assert_eq!(exported["canvas_config"]["width"], 1080);
        assert_eq!(exported["canvas_config"]["height"], 1920);
        assert_eq!(exported["canvas_config"]["ratio"], "original");

        // Video (render_index 0) sorts before text (15000) regardless of
        // creation order.
        let tracks = exported["tracks"].as_array().unwrap();
        assert_eq!(tracks[0]["type"], "video");
        assert_eq!(tracks[1]["type"], "text");
        assert_eq!(tracks[1]["extra_info"]["name"], "subs");
    }

    #[test]
    fn export_rebuilds_text_records_from_live_segments() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Text, None, TrackOptions::default())
            .unwrap()
            .add_segment(TextSegment::new("one", Timerange::new(0, 1_000_000)), None)
            .unwrap()
            .add_segment(TextSegment::new("two", Timerange::new(1_000_000, 1_000_000)), None)
            .unwrap();

        let first = draft.export();
        assert_eq!(first["materials"]["texts"].as_array().unwrap().len(), 2);
        // A second export must not duplicate the records.
        let second = draft.export();
        assert_eq!(second["materials"]["texts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn import_srt_builds_text_segments() {
        let dir = tempfile::tempdir().unwrap();
        let srt_path = dir.path().join("subs.srt");
        std::fs::write(
            &srt_path,
            "1\n00:00:01,000 --> 00:00:02,000\nfirst cue\n\n2\n00:00:03,000 --> 00:00:04,500\nsecond cue\n",
        )
        .unwrap();

        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .import_srt(&srt_path, "subs", SrtImportOptions::default())
            .unwrap();

        let track = draft.track("subs").unwrap();
        assert_eq!(track.kind, TrackKind::Text);
        // Auto-created above every other text track.
        assert_eq!(track.render_index, TrackKind::Text.base_render_index() + 999);

        let segments = track.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].target(), Timerange::new(1_000_000, 1_000_000));
        assert_eq!(segments[1].target(), Timerange::new(3_000_000, 1_500_000));
        assert_eq!(draft.duration, 4_500_000);

        match &segments[0] {
            Segment::Text(text) => {
                assert_eq!(text.text, "first cue");
                assert_eq!(text.style.size, 5.0);
                assert_eq!(text.clip.transform_y, -0.8);
            }
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn import_srt_needs_some_style_input() {
        let mut draft = DraftFile::new(1920, 1080, 30);
        let err = draft.import_srt(
            "/nonexistent.srt",
            "subs",
            SrtImportOptions {
                clip_settings: None,
                ..SrtImportOptions::default()
            },
        );
        assert!(matches!(err, Err(DraftError::MissingSubtitleStyle)));
    }

    #[test]
    fn import_srt_aborts_cleanly_on_malformed_index() {
        let dir = tempfile::tempdir().unwrap();
        let srt_path = dir.path().join("bad.srt");
        std::fs::write(
            &srt_path,
            "1\n00:00:01,000 --> 00:00:02,000\nok\n\nnot-a-number\n00:00:03,000 --> 00:00:04,000\nx\n",
        )
        .unwrap();

        let mut draft = DraftFile::new(1920, 1080, 30);
        let err = draft.import_srt(&srt_path, "subs", SrtImportOptions::default());
        assert!(matches!(err, Err(DraftError::SrtParse { line: 5, .. })));
        // Parsed before inserted: nothing was created.
        assert!(draft.tracks().is_empty());
    }

    #[test]
    fn srt_style_reference_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let srt_path = dir.path().join("subs.srt");
        std::fs::write(&srt_path, "1\n00:00:00,000 --> 00:00:01,000\ncue\n").unwrap();

        let reference = TextSegment::new("ref", Timerange::new(0, 1))
            .with_style(TextStyle {
                bold: true,
                size: 10.0,
                ..TextStyle::default()
            })
            .with_clip_settings(ClipSettings {
                transform_y: 0.5,
                ..ClipSettings::default()
            });

        // Default clip settings override the reference's transform.
        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .import_srt(
                &srt_path,
                "a",
                SrtImportOptions {
                    style_reference: Some(reference.clone()),
                    ..SrtImportOptions::default()
                },
            )
            .unwrap();
        match &draft.track("a").unwrap().segments()[0] {
            Segment::Text(text) => {
                assert!(text.style.bold);
                assert_eq!(text.clip.transform_y, -0.8);
            }
            other => panic!("unexpected segment {other:?}"),
        }

        // Without explicit clip settings the reference's transform is kept.
        draft
            .import_srt(
                &srt_path,
                "b",
                SrtImportOptions {
                    style_reference: Some(reference),
                    clip_settings: None,
                    ..SrtImportOptions::default()
                },
            )
            .unwrap();
        match &draft.track("b").unwrap().segments()[0] {
            Segment::Text(text) => assert_eq!(text.clip.transform_y, 0.5),
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn round_trip_preserves_structure() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("clip.mp4");
        let audio_path = dir.path().join("bgm.mp3");
        std::fs::write(&video_path, b"v").unwrap();
        std::fs::write(&audio_path, b"a").unwrap();

        let mut draft = DraftFile::new(1280, 720, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap()
            .add_track(TrackKind::Audio, None, TrackOptions::default())
            .unwrap()
            .add_track(TrackKind::Text, None, TrackOptions::default())
            .unwrap();

        let video = VideoMaterial::new(&video_path, 5_000_000, 1920, 1080);
        let video_material_id = video.id.clone();
        let segment = VideoSegment::new(video, Timerange::new(0, 2_000_000))
            .with_filter(FilterType::Retro, 60.0)
            .with_intro(IntroType::FadeIn, None)
            .with_transition(TransitionType::Dissolve, None);
        draft.add_segment(segment, None).unwrap();

        let audio = AudioMaterial::new(&audio_path, 9_000_000);
        let audio_material_id = audio.id.clone();
        let audio_segment =
            AudioSegment::new(audio, Timerange::new(0, 3_000_000)).with_fade(500_000, 0);
        let fade_id = audio_segment.fade.as_ref().unwrap().id.clone();
        draft.add_segment(audio_segment, None).unwrap();

        draft
            .add_segment(TextSegment::new("hello", Timerange::new(0, 1_000_000)), None)
            .unwrap();

        let exported = draft.export();
        let (rebuilt, report) =
            DraftFile::from_dict_with(&exported, dir.path(), ReconstructOptions::default())
                .unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(rebuilt.width, 1280);
        assert_eq!(rebuilt.height, 720);
        assert_eq!(rebuilt.duration, 3_000_000);
        assert_eq!(rebuilt.tracks().len(), 3);

        let video_track = rebuilt.track("video").unwrap();
        assert_eq!(video_track.segments().len(), 1);
        match &video_track.segments()[0] {
            Segment::Video(s) => {
                assert_eq!(s.material.id, video_material_id);
                assert_eq!(s.target, Timerange::new(0, 2_000_000));
                assert_eq!(s.filters.len(), 1);
                assert!((s.filters[0].intensity - 0.6).abs() < 1e-9);
                let animations = s.animations.as_ref().unwrap().export_json();
                assert_eq!(animations["intro_name"], "Fade In");
            }
            other => panic!("unexpected segment {other:?}"),
        }

        let audio_track = rebuilt.track("audio").unwrap();
        match &audio_track.segments()[0] {
            Segment::Audio(s) => {
                assert_eq!(s.material.id, audio_material_id);
                assert_eq!(s.fade.as_ref().unwrap().id, fade_id);
                assert_eq!(s.fade.as_ref().unwrap().in_duration, 500_000);
            }
            other => panic!("unexpected segment {other:?}"),
        }

        let text_track = rebuilt.track("text").unwrap();
        match &text_track.segments()[0] {
            Segment::Text(s) => {
                assert_eq!(s.text, "hello");
                assert_eq!(s.target, Timerange::new(0, 1_000_000));
            }
            other => panic!("unexpected segment {other:?}"),
        }

        // The registries line up too. Transitions are exported but not
        // reattached on reconstruction, so that collection starts empty.
        assert_eq!(rebuilt.registry().videos.len(), 1);
        assert_eq!(rebuilt.registry().audios.len(), 1);
        assert_eq!(rebuilt.registry().transitions.len(), 0);
    }

    #[test]
    fn missing_media_skips_and_reports_or_fails() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.mp4");

        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap();
        let segment = VideoSegment::new(
            VideoMaterial::new(&gone, 1_000_000, 1920, 1080),
            Timerange::new(0, 1_000_000),
        );
        let segment_id = segment.id.clone();
        draft.add_segment(segment, None).unwrap();
        let exported = draft.export();

        let (rebuilt, report) =
            DraftFile::from_dict_with(&exported, dir.path(), ReconstructOptions::default())
                .unwrap();
        assert!(rebuilt.track("video").unwrap().segments().is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].segment_id, segment_id);

        let err = DraftFile::from_dict_with(
            &exported,
            dir.path(),
            ReconstructOptions {
                missing_media: MissingMedia::Fail,
            },
        );
        assert!(matches!(err, Err(DraftError::MissingMedia(_))));
    }

    #[test]
    fn from_dict_defaults_canvas_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let rebuilt = DraftFile::from_dict(&json!({}), dir.path()).unwrap();
        assert_eq!(rebuilt.width, 1920);
        assert_eq!(rebuilt.height, 1080);
        assert_eq!(rebuilt.fps, 30);
        assert_eq!(rebuilt.duration, 0);
        assert!(rebuilt.tracks().is_empty());
    }

    #[test]
    fn relative_media_paths_resolve_against_draft_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"v").unwrap();

        let mut draft = DraftFile::new(1920, 1080, 30);
        draft
            .add_track(TrackKind::Video, None, TrackOptions::default())
            .unwrap();
        draft
            .add_segment(
                VideoSegment::new(
                    VideoMaterial::new("./clip.mp4", 1_000_000, 1920, 1080),
                    Timerange::new(0, 1_000_000),
                ),
                None,
            )
            .unwrap();
        let exported = draft.export();

        let (rebuilt, report) =
            DraftFile::from_dict_with(&exported, dir.path(), ReconstructOptions::default())
                .unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(rebuilt.track("video").unwrap().segments().len(), 1);
    }
}
