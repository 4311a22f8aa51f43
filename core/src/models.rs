use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64, // px eller normalisert, bare forholdet teller
    pub y: f64,
    #[serde(alias = "conf", alias = "score", alias = "visibility")]
    pub confidence: f64, // [0, 1]
}

/// Ett bilde med keypoints. Nøkkel = COCO-17 landmark-indeks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeypointFrame {
    #[serde(default, alias = "t")]
    pub timestamp: f64, // sek
    #[serde(default)]
    pub keypoints: BTreeMap<usize, Keypoint>,
}

impl KeypointFrame {
    pub fn new(timestamp: f64) -> Self {
        Self { timestamp, keypoints: BTreeMap::new() }
    }

    pub fn with(mut self, id: usize, x: f64, y: f64, confidence: f64) -> Self {
        self.keypoints.insert(id, Keypoint { x, y, confidence });
        self
    }

    /// Kun keypoints med konfidens strengt over terskelen.
    pub fn confident(&self, id: usize, min_confidence: f64) -> Option<&Keypoint> {
        self.keypoints.get(&id).filter(|k| k.confidence > min_confidence)
    }

    pub fn mean_confidence(&self) -> f64 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        self.keypoints.values().map(|k| k.confidence).sum::<f64>() / self.keypoints.len() as f64
    }
}

/// Ett øvelsessegment fra ekstern segmentering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInput {
    #[serde(alias = "exercise", alias = "name")]
    pub exercise_name: String,
    #[serde(default)]
    pub variation: Option<String>,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default, alias = "start")]
    pub start_sec: f64,
    #[serde(default, alias = "end")]
    pub end_sec: f64,
    #[serde(default)]
    pub frames: Vec<KeypointFrame>,
}

fn default_fps() -> f64 {
    30.0
}

impl SegmentInput {
    pub fn new(exercise_name: &str, fps: f64, frames: Vec<KeypointFrame>) -> Self {
        let end_sec = if fps > 0.0 { frames.len() as f64 / fps } else { 0.0 };
        Self {
            exercise_name: exercise_name.to_string(),
            variation: None,
            fps,
            start_sec: 0.0,
            end_sec,
            frames,
        }
    }

    pub fn with_variation(mut self, variation: &str) -> Self {
        self.variation = Some(variation.to_string());
        self
    }

    /// end − start når satt, ellers frames/fps.
    pub fn duration_sec(&self) -> f64 {
        let span = self.end_sec - self.start_sec;
        if span > 0.0 {
            span
        } else if self.fps > 0.0 {
            self.frames.len() as f64 / self.fps
        } else {
            0.0
        }
    }
}
