use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Still images are given a fixed three-hour duration, matching the consumer
/// editor's own placeholder length for photos.
pub const PHOTO_DURATION: i64 = 10_800_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMaterialKind {
    Video,
    Photo,
}

impl VideoMaterialKind {
    fn as_str(&self) -> &'static str {
        match self {
            VideoMaterialKind::Video => "video",
            VideoMaterialKind::Photo => "photo",
        }
    }
}

/// Normalized crop rectangle, defaulting to the full frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSettings {
    pub upper_left_x: f64,
    pub upper_left_y: f64,
    pub upper_right_x: f64,
    pub upper_right_y: f64,
    pub lower_left_x: f64,
    pub lower_left_y: f64,
    pub lower_right_x: f64,
    pub lower_right_y: f64,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            upper_left_x: 0.0,
            upper_left_y: 0.0,
            upper_right_x: 1.0,
            upper_right_y: 0.0,
            lower_left_x: 0.0,
            lower_left_y: 1.0,
            lower_right_x: 1.0,
            lower_right_y: 1.0,
        }
    }
}

/// A reusable video (or photo) resource. Duration and dimensions come from the
/// caller — media probing happens outside the engine.
#[derive(Debug, Clone)]
pub struct VideoMaterial {
    pub id: String,
    pub path: PathBuf,
    pub name: String,
    pub duration: i64,
    pub width: u32,
    pub height: u32,
    pub kind: VideoMaterialKind,
    pub crop: CropSettings,
}

impl VideoMaterial {
    pub fn new(path: impl Into<PathBuf>, duration: i64, width: u32, height: u32) -> Self {
        let path = path.into();
        Self {
            id: Uuid::new_v4().to_string().to_uppercase(),
            name: file_name(&path),
            path,
            duration,
            width,
            height,
            kind: VideoMaterialKind::Video,
            crop: CropSettings::default(),
        }
    }

    pub fn photo(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        let mut material = Self::new(path, PHOTO_DURATION, width, height);
        material.kind = VideoMaterialKind::Photo;
        material
    }

    pub fn with_crop(mut self, crop: CropSettings) -> Self {
        self.crop = crop;
        self
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "path": self.path.to_string_lossy(),
            "material_name": self.name,
            "type": self.kind.as_str(),
            "width": self.width,
            "height": self.height,
            "duration": self.duration,
            "crop": serde_json::to_value(self.crop).unwrap_or(Value::Null),
            "crop_ratio": "free",
            "crop_scale": 1.0,
            "category_name": "local",
            "check_flag": 63,
        })
    }
}

/// A reusable audio resource.
#[derive(Debug, Clone)]
pub struct AudioMaterial {
    pub id: String,
    pub path: PathBuf,
    pub name: String,
    pub duration: i64,
}

impl AudioMaterial {
    pub fn new(path: impl Into<PathBuf>, duration: i64) -> Self {
        let path = path.into();
        Self {
            id: Uuid::new_v4().to_string().to_uppercase(),
            name: file_name(&path),
            path,
            duration,
        }
    }

    pub fn export_json(&self) -> Value {
        json!({
            "id": self.id,
            "path": self.path.to_string_lossy(),
            "name": self.name,
            "duration": self.duration,
            "type": "extract_music",
            "check_flag": 1,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
