use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{normalize_name, ExerciseCatalog, ExerciseCatalogEntry};
use crate::config::MapperConfig;
use crate::types::{ActivationVector, Category, Muscle};

pub const UNKNOWN_EXERCISE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Substring,
    TokenOverlap,
    Unknown,
}

impl MatchKind {
    pub fn confidence(self) -> f64 {
        match self {
            MatchKind::Exact => 1.0,
            MatchKind::Substring => 0.8,
            MatchKind::TokenOverlap => 0.5,
            MatchKind::Unknown => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExerciseMatch<'c> {
    pub entry: Option<&'c ExerciseCatalogEntry>,
    pub kind: MatchKind,
}

impl ExerciseMatch<'_> {
    fn unknown() -> Self {
        Self { entry: None, kind: MatchKind::Unknown }
    }
}

/// Signaler fra posedata som kan utløse modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseSignals {
    pub knee_min: Option<f64>,
}

/// Aktivering for én øvelse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseActivation {
    pub exercise_name: String,
    pub matched_exercise: String,
    pub variation: Option<String>,
    pub category: Option<Category>,
    pub match_kind: MatchKind,
    pub confidence: f64,
    pub activation: ActivationVector,
    pub primary_muscles: Vec<Muscle>,
    pub secondary_muscles: Vec<Muscle>,
    pub modifiers_applied: Vec<String>,
}

impl ExerciseActivation {
    pub fn unknown(exercise_name: &str, variation: Option<&str>) -> Self {
        Self {
            exercise_name: exercise_name.to_string(),
            matched_exercise: UNKNOWN_EXERCISE.to_string(),
            variation: variation.map(str::to_string),
            category: None,
            match_kind: MatchKind::Unknown,
            confidence: 0.0,
            activation: ActivationVector::new(),
            primary_muscles: Vec::new(),
            secondary_muscles: Vec::new(),
            modifiers_applied: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.match_kind == MatchKind::Unknown
    }
}

/// Lengste alias først, deretter leksikografisk minste.
fn prefer(a: &str, b: &str) -> std::cmp::Ordering {
    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
}

fn keyword_modifiers(variation: &str) -> Vec<&'static str> {
    let v = normalize_name(variation);
    let stance = v.contains("stance");
    let table: [(&str, &'static str); 14] = [
        ("wide", if stance { "wide_stance" } else { "wide_grip" }),
        ("narrow", if stance { "narrow_stance" } else { "close_grip" }),
        ("close", "close_grip"),
        ("sumo", "sumo"),
        ("conventional", "conventional"),
        ("incline", "incline"),
        ("decline", "decline"),
        ("high bar", "high_bar"),
        ("low bar", "low_bar"),
        ("underhand", "underhand"),
        ("overhand", "overhand"),
        ("chin", "chin_up"),
        ("diamond", "diamond"),
        ("deep", "deep"),
    ];
    table.iter().filter(|(k, _)| v.contains(k)).map(|(_, m)| *m).collect()
}

pub struct MuscleActivationMapper<'c> {
    catalog: &'c ExerciseCatalog,
    cfg: MapperConfig,
}

impl<'c> MuscleActivationMapper<'c> {
    pub fn new(catalog: &'c ExerciseCatalog, cfg: MapperConfig) -> Self {
        Self { catalog, cfg }
    }

    /// eksakt → delstreng (begge veier) → ordoverlapp → ukjent.
    pub fn resolve(&self, name: &str) -> ExerciseMatch<'c> {
        let q = normalize_name(name);
        if q.is_empty() {
            return ExerciseMatch::unknown();
        }

        if let Some(entry) = self.catalog.get(&q) {
            return ExerciseMatch { entry: Some(entry), kind: MatchKind::Exact };
        }

        let substring = self
            .catalog
            .aliases()
            .filter(|(alias, _)| alias.contains(q.as_str()) || q.contains(*alias))
            .min_by(|a, b| prefer(a.0, b.0));
        if let Some((_, entry)) = substring {
            return ExerciseMatch { entry: Some(entry), kind: MatchKind::Substring };
        }

        let q_tokens: Vec<&str> = q.split_whitespace().collect();
        let overlap = self
            .catalog
            .aliases()
            .map(|(alias, entry)| {
                let shared = alias.split_whitespace().filter(|t| q_tokens.contains(t)).count();
                (shared, alias, entry)
            })
            .filter(|(shared, _, _)| *shared >= self.cfg.min_token_overlap)
            .min_by(|a, b| b.0.cmp(&a.0).then_with(|| prefer(a.1, b.1)));
        if let Some((_, _, entry)) = overlap {
            return ExerciseMatch { entry: Some(entry), kind: MatchKind::TokenOverlap };
        }

        ExerciseMatch::unknown()
    }

    /// Modifiers fra variasjonstekst og posesignaler, uten duplikater.
    pub fn detect_modifiers(&self, variation: Option<&str>, pose: &PoseSignals) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |m: &str| {
            if !out.iter().any(|x| x == m) {
                out.push(m.to_string());
            }
        };
        if let Some(v) = variation {
            keyword_modifiers(v).into_iter().for_each(&mut push);
        }
        match pose.knee_min {
            Some(k) if k < self.cfg.deep_knee_deg => push("deep"),
            Some(k) if k > self.cfg.shallow_knee_deg => push("shallow"),
            _ => {}
        }
        out
    }

    pub fn activation(&self, name: &str, variation: Option<&str>, pose: &PoseSignals) -> ExerciseActivation {
        let found = self.resolve(name);
        let Some(entry) = found.entry else {
            log::warn!("mapper: ukjent øvelse '{}'", name);
            return ExerciseActivation::unknown(name, variation);
        };

        let detected = self.detect_modifiers(variation, pose);
        let mut raw: BTreeMap<Muscle, f64> = entry.primary.clone();
        for (m, v) in &entry.secondary {
            *raw.entry(*m).or_insert(0.0) += v;
        }

        let mut modifiers_applied = Vec::new();
        for key in detected {
            let Some(deltas) = entry.modifier_deltas(&key) else {
                continue;
            };
            for (m, d) in deltas {
                *raw.entry(*m).or_insert(0.0) += d;
            }
            modifiers_applied.push(key);
        }

        // klem etter summering
        let activation: ActivationVector = raw.into_iter().collect();

        log::debug!(
            "mapper: '{}' → '{}' ({:?}), modifiers {:?}",
            name,
            entry.name,
            found.kind,
            modifiers_applied
        );
        ExerciseActivation {
            exercise_name: name.to_string(),
            matched_exercise: entry.name.clone(),
            variation: variation.map(str::to_string),
            category: Some(entry.category),
            match_kind: found.kind,
            confidence: found.kind.confidence(),
            activation,
            primary_muscles: entry.primary.keys().copied().collect(),
            secondary_muscles: entry.secondary.keys().copied().collect(),
            modifiers_applied,
        }
    }
}
