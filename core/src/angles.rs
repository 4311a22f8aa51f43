use std::collections::BTreeMap;

use crate::config::ExtractionConfig;
use crate::models::{Keypoint, KeypointFrame};
use crate::types::{AngleSeries, Joint, JointAngleSample, JointKind, JointStats};

/// COCO-17 triples (proksimal, toppunkt, distal) per ledd.
pub const JOINT_TRIPLES: [(Joint, (usize, usize, usize)); 8] = [
    (Joint::LeftElbow, (5, 7, 9)),
    (Joint::RightElbow, (6, 8, 10)),
    (Joint::LeftShoulder, (7, 5, 11)),
    (Joint::RightShoulder, (8, 6, 12)),
    (Joint::LeftHip, (5, 11, 13)),
    (Joint::RightHip, (6, 12, 14)),
    (Joint::LeftKnee, (11, 13, 15)),
    (Joint::RightKnee, (12, 14, 16)),
];

const MIN_LIMB_LEN: f64 = 1e-9;

/// Vinkel i toppunktet b mellom (a−b) og (c−b), grader [0, 180].
/// None hvis en av lemvektorene har null lengde.
pub fn vertex_angle(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> Option<f64> {
    let (ux, uy) = (a.x - b.x, a.y - b.y);
    let (vx, vy) = (c.x - b.x, c.y - b.y);
    let nu = (ux * ux + uy * uy).sqrt();
    let nv = (vx * vx + vy * vy).sqrt();
    if nu < MIN_LIMB_LEN || nv < MIN_LIMB_LEN {
        return None;
    }
    let cos = ((ux * vx + uy * vy) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Vinkler for ett bilde. Ledd under konfidensterskel utelates (ingen interpolering).
pub fn sample_frame(index: usize, frame: &KeypointFrame, cfg: &ExtractionConfig) -> JointAngleSample {
    let mut angles = BTreeMap::new();
    for (joint, (p, v, d)) in JOINT_TRIPLES {
        let (Some(a), Some(b), Some(c)) = (
            frame.confident(p, cfg.min_confidence),
            frame.confident(v, cfg.min_confidence),
            frame.confident(d, cfg.min_confidence),
        ) else {
            continue;
        };
        if let Some(deg) = vertex_angle(a, b, c) {
            angles.insert(joint, deg);
        }
    }
    JointAngleSample {
        frame: index,
        timestamp: frame.timestamp,
        angles,
        confidence: frame.mean_confidence(),
    }
}

/// Alle vinkelserier for ett segment.
#[derive(Debug, Clone, Default)]
pub struct JointAngleSeries {
    pub fps: f64,
    samples: Vec<JointAngleSample>,
    series: BTreeMap<Joint, AngleSeries>,
}

impl JointAngleSeries {
    pub fn from_samples(samples: Vec<JointAngleSample>, fps: f64) -> Self {
        let mut series = BTreeMap::new();
        for joint in Joint::ALL {
            let values: Vec<Option<f64>> = samples.iter().map(|s| s.angles.get(&joint).copied()).collect();
            series.insert(joint, AngleSeries::from_frames(values));
        }
        Self { fps, samples, series }
    }

    /// Bygger direkte fra ferdige per-ledd-serier (samme lengde forutsatt).
    pub fn from_joint_series(fps: f64, joints: BTreeMap<Joint, AngleSeries>) -> Self {
        let frame_count = joints.values().map(AngleSeries::frame_count).max().unwrap_or(0);
        let samples = (0..frame_count)
            .map(|i| {
                let angles = joints
                    .iter()
                    .filter_map(|(j, s)| s.frames().get(i).copied().flatten().map(|v| (*j, v)))
                    .collect();
                JointAngleSample {
                    frame: i,
                    timestamp: if fps > 0.0 { i as f64 / fps } else { 0.0 },
                    angles,
                    confidence: 1.0,
                }
            })
            .collect();
        Self::from_samples(samples, fps)
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[JointAngleSample] {
        &self.samples
    }

    /// Antall frames der minst ett ledd har vinkel.
    pub fn sample_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.angles.is_empty()).count()
    }

    /// Tom = ingen ledd passerte konfidensterskelen i noe bilde.
    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    pub fn joint(&self, joint: Joint) -> Option<&AngleSeries> {
        self.series.get(&joint).filter(|s| !s.is_empty())
    }

    /// Frame-vis snitt av venstre/høyre (hull når begge mangler).
    pub fn pair_mean(&self, kind: JointKind) -> AngleSeries {
        let (l, r) = (kind.left(), kind.right());
        let values = self
            .samples
            .iter()
            .map(|s| match (s.angles.get(&l), s.angles.get(&r)) {
                (Some(a), Some(b)) => Some((a + b) / 2.0),
                (Some(a), None) | (None, Some(a)) => Some(*a),
                (None, None) => None,
            })
            .collect();
        AngleSeries::from_frames(values)
    }

    /// "Movement proxy": snitt av alle ledd som finnes i bildet.
    pub fn movement_proxy(&self) -> AngleSeries {
        let values = self
            .samples
            .iter()
            .map(|s| {
                if s.angles.is_empty() {
                    None
                } else {
                    Some(s.angles.values().sum::<f64>() / s.angles.len() as f64)
                }
            })
            .collect();
        AngleSeries::from_frames(values)
    }

    pub fn stats(&self) -> BTreeMap<Joint, JointStats> {
        self.series
            .iter()
            .filter_map(|(j, s)| s.stats().map(|st| (*j, st)))
            .collect()
    }

    /// Snitt av min over sider som faktisk har data.
    pub fn side_avg_min(&self, kind: JointKind) -> Option<f64> {
        side_avg([self.joint(kind.left()), self.joint(kind.right())].into_iter().flatten().filter_map(AngleSeries::min))
    }

    /// Snitt av max over sider som faktisk har data.
    pub fn side_avg_max(&self, kind: JointKind) -> Option<f64> {
        side_avg([self.joint(kind.left()), self.joint(kind.right())].into_iter().flatten().filter_map(AngleSeries::max))
    }
}

fn side_avg(values: impl Iterator<Item = f64>) -> Option<f64> {
    let v: Vec<f64> = values.collect();
    if v.is_empty() { None } else { Some(v.iter().sum::<f64>() / v.len() as f64) }
}

/// Ekstraher vinkler for alle bilder.
pub fn extract(frames: &[KeypointFrame], fps: f64, cfg: &ExtractionConfig) -> JointAngleSeries {
    let samples = frames.iter().enumerate().map(|(i, f)| sample_frame(i, f, cfg)).collect();
    let out = JointAngleSeries::from_samples(samples, fps);
    if out.is_empty() {
        log::debug!("angles: ingen ledd over konfidens {} i {} frames", cfg.min_confidence, frames.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint { x, y, confidence: 0.9 }
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let a = vertex_angle(&kp(0.0, 1.0), &kp(0.0, 0.0), &kp(1.0, 0.0)).unwrap();
        assert!((a - 90.0).abs() < 1e-9);
    }

    #[test]
    fn straight_limb_is_one_eighty() {
        let a = vertex_angle(&kp(-1.0, 0.0), &kp(0.0, 0.0), &kp(2.0, 0.0)).unwrap();
        assert!((a - 180.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_limb_gives_gap() {
        assert!(vertex_angle(&kp(0.0, 0.0), &kp(0.0, 0.0), &kp(1.0, 0.0)).is_none());
    }

    #[test]
    fn confidence_at_threshold_is_excluded() {
        // 0.5 er ikke "strengt over" 0.5
        let frame = KeypointFrame::new(0.0)
            .with(11, 0.0, 0.0, 0.9)
            .with(13, 0.0, 1.0, 0.5)
            .with(15, 1.0, 1.0, 0.9);
        let s = sample_frame(0, &frame, &ExtractionConfig::default());
        assert!(s.angles.get(&Joint::LeftKnee).is_none());
    }

    #[test]
    fn pair_mean_uses_single_side_when_other_missing() {
        let mut joints = BTreeMap::new();
        joints.insert(Joint::LeftKnee, AngleSeries::from_frames(vec![Some(90.0), Some(100.0), None]));
        joints.insert(Joint::RightKnee, AngleSeries::from_frames(vec![Some(110.0), None, None]));
        let s = JointAngleSeries::from_joint_series(30.0, joints);
        assert_eq!(s.pair_mean(JointKind::Knee).frames(), &[Some(100.0), Some(100.0), None]);
        // venstre min 90, høyre min 110
        assert_eq!(s.side_avg_min(JointKind::Knee), Some(100.0));
    }
}
