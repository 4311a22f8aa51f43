// JSON inn/ut-grense. Tåler eldre feltnavn og flere keypoint-former.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{self as json, Value};
use serde_path_to_error as spte;

use crate::balance::analyze_history;
use crate::catalog::ExerciseCatalog;
use crate::config::AnalysisConfig;
use crate::mapper::{MuscleActivationMapper, PoseSignals};
use crate::metrics::{unknown_exercises_total, Metrics};
use crate::models::{Keypoint, KeypointFrame, SegmentInput};
use crate::pipeline::{CancelToken, SegmentAnalyzer, SegmentResult};
use crate::session::aggregate_session;
use crate::types::{ActivationVector, ExerciseObservation, SessionActivationVector};

// ──────────────────────────────────────────────────────────────────────────────
// Felles
// ──────────────────────────────────────────────────────────────────────────────

// OBJECT eller legacy-liste, valgt på JSON-formen. Begge går gjennom spte,
// så feltfeil rapporteres med sti (f.eks. `exercises[0].reps`).
enum Repr<O, L> {
    Object(O),
    Legacy(L),
}

fn parse<O: DeserializeOwned, L: DeserializeOwned>(json_in: &str, what: &str) -> Result<Repr<O, L>, String> {
    let val: Value = json::from_str(json_in).map_err(|e| format!("parse error ({what}): {e}"))?;
    let err = |e: spte::Error<json::Error>| format!("parse error ({}) at {}: {}", what, e.path(), e.inner());
    if val.is_array() {
        spte::deserialize(val).map(Repr::Legacy).map_err(err)
    } else {
        spte::deserialize(val).map(Repr::Object).map_err(err)
    }
}

fn resolve_config(cfg: Option<AnalysisConfig>) -> Result<AnalysisConfig, String> {
    let cfg = cfg.unwrap_or_default();
    cfg.validate().map_err(|e| e.to_string())?;
    Ok(cfg)
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<String, String> {
    json::to_string(v).map_err(|e| format!("serialize error: {e}"))
}

// ──────────────────────────────────────────────────────────────────────────────
// Keypoints (tolerant)
// ──────────────────────────────────────────────────────────────────────────────

// Objekt {x, y, confidence} eller triple [x, y, c]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeypointTol {
    Object(Keypoint),
    Triple([f64; 3]),
}

impl From<KeypointTol> for Keypoint {
    fn from(k: KeypointTol) -> Self {
        match k {
            KeypointTol::Object(k) => k,
            KeypointTol::Triple([x, y, confidence]) => Keypoint { x, y, confidence },
        }
    }
}

// Map {"5": ...} eller COCO-liste i indeksrekkefølge (null = mangler).
// Nøkler som String: untagged bufring mister serde_json sin tall-nøkkel-parsing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeypointsTol {
    Map(BTreeMap<String, KeypointTol>),
    List(Vec<Option<KeypointTol>>),
}

#[derive(Debug, Deserialize)]
struct FrameTol {
    #[serde(default, alias = "t", alias = "ts")]
    timestamp: f64,
    #[serde(alias = "kps", alias = "landmarks")]
    keypoints: KeypointsTol,
}

impl From<FrameTol> for KeypointFrame {
    fn from(f: FrameTol) -> Self {
        let keypoints = match f.keypoints {
            KeypointsTol::Map(m) => m
                .into_iter()
                .filter_map(|(id, k)| match id.trim().parse::<usize>() {
                    Ok(i) => Some((i, k.into())),
                    Err(_) => {
                        log::warn!("json_api: ignorerer keypoint-nøkkel '{}'", id);
                        None
                    }
                })
                .collect(),
            KeypointsTol::List(v) => v
                .into_iter()
                .enumerate()
                .filter_map(|(i, k)| k.map(|k| (i, k.into())))
                .collect(),
        };
        KeypointFrame { timestamp: f.timestamp, keypoints }
    }
}

#[derive(Debug, Deserialize)]
struct SegmentTol {
    #[serde(alias = "exercise", alias = "name")]
    exercise_name: String,
    #[serde(default)]
    variation: Option<String>,
    #[serde(default = "default_fps")]
    fps: f64,
    #[serde(default, alias = "start", alias = "start_time")]
    start_sec: f64,
    #[serde(default, alias = "end", alias = "end_time")]
    end_sec: f64,
    #[serde(default, alias = "pose_frames")]
    frames: Vec<FrameTol>,
}

fn default_fps() -> f64 {
    30.0
}

impl From<SegmentTol> for SegmentInput {
    fn from(s: SegmentTol) -> Self {
        SegmentInput {
            exercise_name: s.exercise_name,
            variation: s.variation,
            fps: s.fps,
            start_sec: s.start_sec,
            end_sec: s.end_sec,
            frames: s.frames.into_iter().map(KeypointFrame::from).collect(),
        }
    }
}

// Objektform; legacy er en ren liste av segmenter
#[derive(Debug, Deserialize)]
struct AnalyzeIn {
    segments: Vec<SegmentTol>,
    #[serde(default)]
    config: Option<AnalysisConfig>,
    #[serde(default)]
    recorded_at: Option<DateTime<Utc>>,
}

/// Segmenter med keypoints → `SessionAnalysis` som JSON.
pub fn analyze_segments_json(json_in: &str, catalog: &ExerciseCatalog, metrics: &Metrics) -> Result<String, String> {
    let (segments, config, recorded_at) = match parse::<AnalyzeIn, Vec<SegmentTol>>(json_in, "AnalyzeIn")? {
        Repr::Object(AnalyzeIn { segments, config, recorded_at }) => (segments, config, recorded_at),
        Repr::Legacy(segments) => (segments, None, None),
    };
    let cfg = resolve_config(config)?;
    let inputs: Vec<SegmentInput> = segments.into_iter().map(SegmentInput::from).collect();

    let analyzer = SegmentAnalyzer::new(catalog, &cfg, metrics);
    let out = analyzer.analyze_session(&inputs, &CancelToken::new(), recorded_at.unwrap_or_else(Utc::now));
    to_json(&out)
}

// ──────────────────────────────────────────────────────────────────────────────
// Økt fra rapporterte øvelser (uten keypoints)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReportedTol {
    #[serde(alias = "exercise", alias = "exercise_name")]
    name: String,
    #[serde(default)]
    variation: Option<String>,
    #[serde(default, alias = "duration", alias = "duration_seconds")]
    duration_sec: f64,
    #[serde(default, alias = "rep_count")]
    reps: u32,
    #[serde(default, alias = "quality")]
    quality_score: Option<f64>,
    #[serde(default, alias = "knee_rom_min")]
    knee_min: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SessionIn {
    exercises: Vec<ReportedTol>,
    #[serde(default)]
    config: Option<AnalysisConfig>,
    #[serde(default)]
    recorded_at: Option<DateTime<Utc>>,
}

/// Rapporterte øvelser (navn, varighet, reps) → `SessionActivationVector` som JSON.
pub fn session_activation_json(json_in: &str, catalog: &ExerciseCatalog, metrics: &Metrics) -> Result<String, String> {
    let (exercises, config, recorded_at) = match parse::<SessionIn, Vec<ReportedTol>>(json_in, "SessionIn")? {
        Repr::Object(SessionIn { exercises, config, recorded_at }) => (exercises, config, recorded_at),
        Repr::Legacy(exercises) => (exercises, None, None),
    };
    let cfg = resolve_config(config)?;
    let mapper = MuscleActivationMapper::new(catalog, cfg.mapper.clone());

    let results: Vec<SegmentResult> = exercises
        .into_iter()
        .map(|e| {
            let mut obs = ExerciseObservation::reported(&e.name, e.duration_sec, e.reps);
            obs.variation = e.variation.clone();
            if let Some(q) = e.quality_score {
                obs.quality_score = q.clamp(crate::config::QUALITY_MIN, crate::config::QUALITY_MAX);
            }
            let act = mapper.activation(&e.name, e.variation.as_deref(), &PoseSignals { knee_min: e.knee_min });
            if act.is_unknown() {
                unknown_exercises_total(metrics).inc();
            }
            SegmentResult::new(obs, act)
        })
        .collect();

    let session = aggregate_session(&results, &cfg.session, recorded_at.unwrap_or_else(Utc::now));
    to_json(&session)
}

// ──────────────────────────────────────────────────────────────────────────────
// Balanse
// ──────────────────────────────────────────────────────────────────────────────

// Full øktvektor, eller bare muskel → verdi (legacy)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryEntryTol {
    Session {
        #[serde(default)]
        recorded_at: Option<DateTime<Utc>>,
        #[serde(alias = "activation", alias = "muscle_totals")]
        muscles: ActivationVector,
    },
    Bare(ActivationVector),
}

#[derive(Debug, Deserialize)]
struct BalanceIn {
    #[serde(alias = "history", alias = "activation_history")]
    sessions: Vec<HistoryEntryTol>,
    #[serde(default)]
    now: Option<DateTime<Utc>>,
    #[serde(default)]
    window_days: Option<i64>,
    #[serde(default)]
    config: Option<AnalysisConfig>,
}

fn to_session(entry: HistoryEntryTol, now: DateTime<Utc>, cfg: &AnalysisConfig) -> SessionActivationVector {
    let (recorded_at, muscles) = match entry {
        HistoryEntryTol::Session { recorded_at, muscles } => (recorded_at.unwrap_or(now), muscles),
        HistoryEntryTol::Bare(muscles) => (now, muscles),
    };
    SessionActivationVector {
        recorded_at,
        primary_muscles: muscles.primary_muscles(cfg.session.primary_cut),
        secondary_muscles: muscles.secondary_muscles(cfg.session.secondary_cut, cfg.session.primary_cut),
        muscles,
        exercise_count: 0,
        form_score: 1.0,
    }
}

/// Økthistorikk → `BalanceReport` som JSON.
pub fn balance_report_json(json_in: &str) -> Result<String, String> {
    let (sessions, now, window_days, config) = match parse::<BalanceIn, Vec<HistoryEntryTol>>(json_in, "BalanceIn")? {
        Repr::Object(BalanceIn { sessions, now, window_days, config }) => (sessions, now, window_days, config),
        Repr::Legacy(sessions) => (sessions, None, None, None),
    };
    let mut cfg = resolve_config(config)?;
    if let Some(days) = window_days {
        cfg.balance.window_days = days;
        cfg.validate().map_err(|e| e.to_string())?;
    }
    let now = now.unwrap_or_else(Utc::now);
    let history: Vec<SessionActivationVector> = sessions.into_iter().map(|s| to_session(s, now, &cfg)).collect();
    to_json(&analyze_history(&history, now, &cfg.balance))
}
