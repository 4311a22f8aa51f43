use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ──────────────────────────────────────────────────────────────────────────────
// Konstanter (standardverdier for AnalysisConfig)
// ──────────────────────────────────────────────────────────────────────────────

// Ekstraksjon
pub const KEYPOINT_CONFIDENCE_MIN: f64 = 0.5;

// Reps
pub const MIN_REP_SAMPLES: usize = 10;
pub const MIN_REP_RANGE_DEG: f64 = 20.0;
pub const REP_HIGH_THRESHOLD: f64 = 0.7;
pub const REP_LOW_THRESHOLD: f64 = 0.3;
pub const REP_COOLDOWN_SEC: f64 = 1.0;

// Kvalitet
pub const QUALITY_MIN: f64 = 0.5;
pub const QUALITY_MAX: f64 = 1.5;
pub const DEPTH_EXCELLENT_DEG: f64 = 80.0;
pub const DEPTH_PARALLEL_DEG: f64 = 95.0;
pub const DEPTH_SHALLOW_DEG: f64 = 115.0;
pub const LOCKOUT_FULL_DEG: f64 = 165.0;
pub const LOCKOUT_PARTIAL_DEG: f64 = 150.0;
pub const LOCKOUT_POOR_DEG: f64 = 140.0;
pub const HIP_HINGE_GOOD_DEG: f64 = 60.0;
pub const SYMMETRY_SCALE_DEG: f64 = 30.0;
pub const ASYMMETRY_FLAG_DEG: f64 = 15.0;
pub const SYMMETRY_GOOD: f64 = 0.9;
pub const SYMMETRY_POOR: f64 = 0.7;
pub const TEMPO_GOOD: f64 = 0.8;
pub const TEMPO_POOR: f64 = 0.5;

// Mapper
pub const POSE_DEEP_KNEE_DEG: f64 = 70.0;
pub const POSE_SHALLOW_KNEE_DEG: f64 = 100.0;
pub const MIN_TOKEN_OVERLAP: usize = 1;

// Økt
pub const MIN_SEGMENT_WEIGHT_SEC: f64 = 30.0;
pub const REPS_SCALE_DIVISOR: f64 = 10.0;
pub const PRIMARY_CUT: f64 = 0.5;
pub const SECONDARY_CUT: f64 = 0.2;

// Balanse
pub const PUSH_DOMINANT_RATIO: f64 = 1.5;
pub const PULL_DOMINANT_RATIO: f64 = 0.667;
pub const UNDERTRAINED_THRESHOLD: f64 = 0.3;
pub const NEGLECTED_THRESHOLD: f64 = 0.1;
pub const HISTORY_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 36_500;

// Worker-pool
pub const MAX_WORKERS: usize = 4;
pub const FRAME_BATCH_SIZE: usize = 32;

// ──────────────────────────────────────────────────────────────────────────────
// Config-structs
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Keypoints må ha konfidens strengt over denne.
    pub min_confidence: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { min_confidence: KEYPOINT_CONFIDENCE_MIN }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepConfig {
    pub min_samples: usize,
    pub min_range_deg: f64,
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub cooldown_sec: f64,
}

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            min_samples: MIN_REP_SAMPLES,
            min_range_deg: MIN_REP_RANGE_DEG,
            high_threshold: REP_HIGH_THRESHOLD,
            low_threshold: REP_LOW_THRESHOLD,
            cooldown_sec: REP_COOLDOWN_SEC,
        }
    }
}

impl RepConfig {
    /// Cooldown i frames, minst 1.
    pub fn cooldown_frames(&self, fps: f64) -> u32 {
        ((fps * self.cooldown_sec).floor() as u32).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub depth_excellent_deg: f64,
    pub depth_parallel_deg: f64,
    pub depth_shallow_deg: f64,
    pub lockout_full_deg: f64,
    pub lockout_partial_deg: f64,
    pub lockout_poor_deg: f64,
    pub hip_hinge_good_deg: f64,
    pub symmetry_scale_deg: f64,
    pub asymmetry_flag_deg: f64,
    pub symmetry_good: f64,
    pub symmetry_poor: f64,
    pub tempo_good: f64,
    pub tempo_poor: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            depth_excellent_deg: DEPTH_EXCELLENT_DEG,
            depth_parallel_deg: DEPTH_PARALLEL_DEG,
            depth_shallow_deg: DEPTH_SHALLOW_DEG,
            lockout_full_deg: LOCKOUT_FULL_DEG,
            lockout_partial_deg: LOCKOUT_PARTIAL_DEG,
            lockout_poor_deg: LOCKOUT_POOR_DEG,
            hip_hinge_good_deg: HIP_HINGE_GOOD_DEG,
            symmetry_scale_deg: SYMMETRY_SCALE_DEG,
            asymmetry_flag_deg: ASYMMETRY_FLAG_DEG,
            symmetry_good: SYMMETRY_GOOD,
            symmetry_poor: SYMMETRY_POOR,
            tempo_good: TEMPO_GOOD,
            tempo_poor: TEMPO_POOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub deep_knee_deg: f64,
    pub shallow_knee_deg: f64,
    pub min_token_overlap: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            deep_knee_deg: POSE_DEEP_KNEE_DEG,
            shallow_knee_deg: POSE_SHALLOW_KNEE_DEG,
            min_token_overlap: MIN_TOKEN_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub min_segment_weight_sec: f64,
    pub scale_by_reps: bool,
    pub reps_scale_divisor: f64,
    pub primary_cut: f64,
    pub secondary_cut: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_segment_weight_sec: MIN_SEGMENT_WEIGHT_SEC,
            scale_by_reps: false,
            reps_scale_divisor: REPS_SCALE_DIVISOR,
            primary_cut: PRIMARY_CUT,
            secondary_cut: SECONDARY_CUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub push_dominant_ratio: f64,
    pub pull_dominant_ratio: f64,
    pub undertrained_threshold: f64,
    pub neglected_threshold: f64,
    pub window_days: i64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            push_dominant_ratio: PUSH_DOMINANT_RATIO,
            pull_dominant_ratio: PULL_DOMINANT_RATIO,
            undertrained_threshold: UNDERTRAINED_THRESHOLD,
            neglected_threshold: NEGLECTED_THRESHOLD,
            window_days: HISTORY_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_workers: usize,
    pub batch_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_workers: MAX_WORKERS, batch_size: FRAME_BATCH_SIZE }
    }
}

/// Samlet konfig. Alle seksjoner er valgfrie i JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub extraction: ExtractionConfig,
    pub reps: RepConfig,
    pub quality: QualityConfig,
    pub mapper: MapperConfig,
    pub session: SessionConfig,
    pub balance: BalanceConfig,
    pub pool: PoolConfig,
}

fn check(ok: bool, msg: &str) -> Result<(), ConfigError> {
    if ok { Ok(()) } else { Err(ConfigError::Validation(msg.to_string())) }
}

impl AnalysisConfig {
    /// Parse + valider. Feilmelding inneholder JSON-stien.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let cfg: AnalysisConfig = serde_path_to_error::deserialize(de)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.extraction;
        check((0.0..1.0).contains(&e.min_confidence), "extraction.min_confidence must be in [0, 1)")?;

        let r = &self.reps;
        check(r.min_samples >= 2, "reps.min_samples must be >= 2")?;
        check(r.min_range_deg >= 0.0, "reps.min_range_deg must be >= 0")?;
        check(
            0.0 < r.low_threshold && r.low_threshold < r.high_threshold && r.high_threshold < 1.0,
            "reps thresholds must satisfy 0 < low < high < 1",
        )?;
        check(r.cooldown_sec >= 0.0, "reps.cooldown_sec must be >= 0")?;

        let q = &self.quality;
        check(
            q.depth_excellent_deg < q.depth_parallel_deg && q.depth_parallel_deg <= q.depth_shallow_deg,
            "quality depth thresholds must be increasing",
        )?;
        check(
            q.lockout_poor_deg <= q.lockout_partial_deg && q.lockout_partial_deg < q.lockout_full_deg,
            "quality lockout thresholds must be increasing",
        )?;
        check(q.symmetry_scale_deg > 0.0, "quality.symmetry_scale_deg must be positive")?;
        check(q.symmetry_poor <= q.symmetry_good, "quality.symmetry_poor must be <= symmetry_good")?;
        check(q.tempo_poor <= q.tempo_good, "quality.tempo_poor must be <= tempo_good")?;

        let m = &self.mapper;
        check(m.deep_knee_deg < m.shallow_knee_deg, "mapper.deep_knee_deg must be < shallow_knee_deg")?;
        check(m.min_token_overlap >= 1, "mapper.min_token_overlap must be >= 1")?;

        let s = &self.session;
        check(s.min_segment_weight_sec >= 0.0, "session.min_segment_weight_sec must be >= 0")?;
        check(s.reps_scale_divisor > 0.0, "session.reps_scale_divisor must be positive")?;
        check(
            0.0 <= s.secondary_cut && s.secondary_cut <= s.primary_cut && s.primary_cut <= 1.0,
            "session cuts must satisfy 0 <= secondary <= primary <= 1",
        )?;

        let b = &self.balance;
        check(
            0.0 < b.pull_dominant_ratio && b.pull_dominant_ratio < b.push_dominant_ratio,
            "balance ratios must satisfy 0 < pull_dominant < push_dominant",
        )?;
        check(
            b.neglected_threshold <= b.undertrained_threshold,
            "balance.neglected_threshold must be <= undertrained_threshold",
        )?;
        check(
            0 < b.window_days && b.window_days <= MAX_WINDOW_DAYS,
            "balance.window_days must be in 1..=36500",
        )?;

        let p = &self.pool;
        check(p.max_workers >= 1, "pool.max_workers must be >= 1")?;
        check(p.batch_size >= 1, "pool.batch_size must be >= 1")?;
        Ok(())
    }
}
