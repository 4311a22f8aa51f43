use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Deserializer, Serialize};

// ──────────────────────────────────────────────────────────────────────────────
// Muskler og kategorier (lukket sett)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Muscle {
    Chest,
    Shoulders,
    Triceps,
    Biceps,
    Forearms,
    Lats,
    Traps,
    Rhomboids,
    LowerBack,
    Core,
    Obliques,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
    HipFlexors,
}

impl Muscle {
    pub const ALL: [Muscle; 16] = [
        Muscle::Chest,
        Muscle::Shoulders,
        Muscle::Triceps,
        Muscle::Biceps,
        Muscle::Forearms,
        Muscle::Lats,
        Muscle::Traps,
        Muscle::Rhomboids,
        Muscle::LowerBack,
        Muscle::Core,
        Muscle::Obliques,
        Muscle::Quadriceps,
        Muscle::Hamstrings,
        Muscle::Glutes,
        Muscle::Calves,
        Muscle::HipFlexors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Muscle::Chest => "chest",
            Muscle::Shoulders => "shoulders",
            Muscle::Triceps => "triceps",
            Muscle::Biceps => "biceps",
            Muscle::Forearms => "forearms",
            Muscle::Lats => "lats",
            Muscle::Traps => "traps",
            Muscle::Rhomboids => "rhomboids",
            Muscle::LowerBack => "lower_back",
            Muscle::Core => "core",
            Muscle::Obliques => "obliques",
            Muscle::Quadriceps => "quadriceps",
            Muscle::Hamstrings => "hamstrings",
            Muscle::Glutes => "glutes",
            Muscle::Calves => "calves",
            Muscle::HipFlexors => "hip_flexors",
        }
    }

    /// Slår opp muskel fra navn. Tåler noen vanlige kortformer ("quads", "abs", "delts").
    pub fn from_name(name: &str) -> Option<Muscle> {
        let n = name.trim().to_lowercase().replace([' ', '-'], "_");
        let m = match n.as_str() {
            "quads" => Muscle::Quadriceps,
            "abs" => Muscle::Core,
            "delts" => Muscle::Shoulders,
            "upper_back" => Muscle::Rhomboids,
            other => return Muscle::ALL.iter().copied().find(|m| m.as_str() == other),
        };
        Some(m)
    }

    pub fn category(self) -> Category {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.members().contains(&self))
            .unwrap_or(Category::Core)
    }
}

impl fmt::Display for Muscle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Push,
    Pull,
    Legs,
    Core,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Push, Category::Pull, Category::Legs, Category::Core];

    /// Fast medlemskap brukt av balanseanalysen.
    pub fn members(self) -> &'static [Muscle] {
        match self {
            Category::Push => &[Muscle::Chest, Muscle::Shoulders, Muscle::Triceps],
            Category::Pull => &[
                Muscle::Lats,
                Muscle::Traps,
                Muscle::Rhomboids,
                Muscle::Biceps,
                Muscle::Forearms,
            ],
            Category::Legs => &[
                Muscle::Quadriceps,
                Muscle::Hamstrings,
                Muscle::Glutes,
                Muscle::Calves,
                Muscle::HipFlexors,
            ],
            Category::Core => &[Muscle::Core, Muscle::Obliques, Muscle::LowerBack],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Push => "push",
            Category::Pull => "pull",
            Category::Legs => "legs",
            Category::Core => "core",
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Aktiveringsvektor
// ──────────────────────────────────────────────────────────────────────────────

/// Klemmer en aktiveringsverdi til [0, 1]. NaN blir 0.
#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Muskel → aktivering i [0, 1]. Alle skrivinger går gjennom `set`, som klemmer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActivationVector(BTreeMap<Muscle, f64>);

impl ActivationVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Alle muskler i settet, satt til 0.0.
    pub fn zeros() -> Self {
        Self(Muscle::ALL.iter().map(|m| (*m, 0.0)).collect())
    }

    pub fn get(&self, muscle: Muscle) -> f64 {
        self.0.get(&muscle).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, muscle: Muscle, value: f64) {
        self.0.insert(muscle, clamp_unit(value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Muscle, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }

    /// Tom = ingen muskel med positiv aktivering.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v <= 0.0)
    }

    pub fn max_value(&self) -> f64 {
        self.0.values().copied().fold(0.0, f64::max)
    }

    /// Muskler med verdi ≥ `cut`, i fast muskelrekkefølge.
    pub fn primary_muscles(&self, cut: f64) -> Vec<Muscle> {
        self.iter().filter(|(_, v)| *v >= cut).map(|(m, _)| m).collect()
    }

    /// Muskler i [low, high).
    pub fn secondary_muscles(&self, low: f64, high: f64) -> Vec<Muscle> {
        self.iter()
            .filter(|(_, v)| *v >= low && *v < high)
            .map(|(m, _)| m)
            .collect()
    }

    /// Synkende etter verdi; likt → fast muskelrekkefølge. Deterministisk.
    pub fn ranked(&self) -> Vec<(Muscle, f64)> {
        let mut out: Vec<(Muscle, f64)> = self.iter().collect();
        out.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)).then(a.0.cmp(&b.0)));
        out
    }

    pub fn top(&self, n: usize) -> Vec<Muscle> {
        self.ranked()
            .into_iter()
            .filter(|(_, v)| *v > 0.0)
            .take(n)
            .map(|(m, _)| m)
            .collect()
    }
}

impl FromIterator<(Muscle, f64)> for ActivationVector {
    fn from_iter<I: IntoIterator<Item = (Muscle, f64)>>(iter: I) -> Self {
        let mut v = ActivationVector::new();
        for (m, x) in iter {
            v.set(m, x);
        }
        v
    }
}

// Inndata fra JSON klemmes også
impl<'de> Deserialize<'de> for ActivationVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Muscle, f64>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Ledd og vinkelserier
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    Elbow,
    Shoulder,
    Hip,
    Knee,
}

impl JointKind {
    pub const ALL: [JointKind; 4] = [JointKind::Elbow, JointKind::Shoulder, JointKind::Hip, JointKind::Knee];

    pub fn left(self) -> Joint {
        match self {
            JointKind::Elbow => Joint::LeftElbow,
            JointKind::Shoulder => Joint::LeftShoulder,
            JointKind::Hip => Joint::LeftHip,
            JointKind::Knee => Joint::LeftKnee,
        }
    }

    pub fn right(self) -> Joint {
        match self {
            JointKind::Elbow => Joint::RightElbow,
            JointKind::Shoulder => Joint::RightShoulder,
            JointKind::Hip => Joint::RightHip,
            JointKind::Knee => Joint::RightKnee,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JointKind::Elbow => "elbow",
            JointKind::Shoulder => "shoulder",
            JointKind::Hip => "hip",
            JointKind::Knee => "knee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
    ];

    pub fn kind(self) -> JointKind {
        match self {
            Joint::LeftElbow | Joint::RightElbow => JointKind::Elbow,
            Joint::LeftShoulder | Joint::RightShoulder => JointKind::Shoulder,
            Joint::LeftHip | Joint::RightHip => JointKind::Hip,
            Joint::LeftKnee | Joint::RightKnee => JointKind::Knee,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
        }
    }
}

/// Vinkler fra ett bilde. Produseres én gang per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSample {
    pub frame: usize,
    pub timestamp: f64,
    pub angles: BTreeMap<Joint, f64>, // grader, [0, 180]
    pub confidence: f64,
}

/// Én verdi per frame; `None` der leddet ikke passerte konfidensterskelen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AngleSeries(Vec<Option<f64>>);

impl AngleSeries {
    pub fn from_frames(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    /// Tett serie uten hull (praktisk i tester og for eksterne vinkler).
    pub fn dense(values: &[f64]) -> Self {
        Self(values.iter().map(|v| Some(*v)).collect())
    }

    /// Antall frames (inkl. hull).
    pub fn frame_count(&self) -> usize {
        self.0.len()
    }

    pub fn present_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }

    pub fn frames(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(|v| *v)
    }

    pub fn min(&self) -> Option<f64> {
        self.present().fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }

    pub fn max(&self) -> Option<f64> {
        self.present().fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    pub fn mean(&self) -> Option<f64> {
        let n = self.present_count();
        if n == 0 { None } else { Some(self.present().sum::<f64>() / n as f64) }
    }

    pub fn stats(&self) -> Option<JointStats> {
        Some(JointStats { min: self.min()?, max: self.max()?, avg: self.mean()? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

// ──────────────────────────────────────────────────────────────────────────────
// Reps, tilbakemelding og observasjon
// ──────────────────────────────────────────────────────────────────────────────

/// Bevegelsesfamilie, valgt på delstreng i øvelsesnavnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseFamily {
    Squat,     // squat, lunge
    PressCurl, // press, curl
    Hinge,     // deadlift
    Other,
}

impl ExerciseFamily {
    pub fn from_name(name: &str) -> Self {
        let n = name.to_lowercase();
        if n.contains("squat") || n.contains("lunge") {
            ExerciseFamily::Squat
        } else if n.contains("press") || n.contains("curl") {
            ExerciseFamily::PressCurl
        } else if n.contains("deadlift") {
            ExerciseFamily::Hinge
        } else {
            ExerciseFamily::Other
        }
    }
}

/// Spenn mellom to påfølgende rep-starter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepCycle {
    pub start_frame: usize,
    pub end_frame: usize,
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientData {
    NoConfidentKeypoints,
    TooFewSamples,
    FlatSignal,
}

impl InsufficientData {
    pub fn as_str(self) -> &'static str {
        match self {
            InsufficientData::NoConfidentKeypoints => "no_confident_keypoints",
            InsufficientData::TooFewSamples => "too_few_samples",
            InsufficientData::FlatSignal => "flat_signal",
        }
    }
}

/// Strukturerte tilbakemeldingskoder. Tekst rendres av ekstern tjeneste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackCode {
    DepthExcellent { knee_min: f64 },
    DepthParallel { knee_min: f64 },
    DepthSlightlyShallow { knee_min: f64 },
    DepthShallow { knee_min: f64 },
    FullExtension { elbow_max: f64 },
    PartialLockout { elbow_max: f64 },
    LimitedExtension { elbow_max: f64 },
    IncompleteExtension { elbow_max: f64 },
    HipHingeGood { hip_min: f64 },
    HipHingeShallow { hip_min: f64 },
    AsymmetryDetected { joint: JointKind, degrees: f64 },
    TempoInconsistent { consistency: f64 },
    InsufficientData { reason: InsufficientData },
    FormOk,
}

impl FeedbackCode {
    pub fn code(&self) -> &'static str {
        match self {
            FeedbackCode::DepthExcellent { .. } => "DEPTH_EXCELLENT",
            FeedbackCode::DepthParallel { .. } => "DEPTH_PARALLEL",
            FeedbackCode::DepthSlightlyShallow { .. } => "DEPTH_SLIGHTLY_SHALLOW",
            FeedbackCode::DepthShallow { .. } => "DEPTH_SHALLOW",
            FeedbackCode::FullExtension { .. } => "FULL_EXTENSION",
            FeedbackCode::PartialLockout { .. } => "PARTIAL_LOCKOUT",
            FeedbackCode::LimitedExtension { .. } => "LIMITED_EXTENSION",
            FeedbackCode::IncompleteExtension { .. } => "INCOMPLETE_EXTENSION",
            FeedbackCode::HipHingeGood { .. } => "HIP_HINGE_GOOD",
            FeedbackCode::HipHingeShallow { .. } => "HIP_HINGE_SHALLOW",
            FeedbackCode::AsymmetryDetected { .. } => "ASYMMETRY_DETECTED",
            FeedbackCode::TempoInconsistent { .. } => "TEMPO_INCONSISTENT",
            FeedbackCode::InsufficientData { .. } => "INSUFFICIENT_DATA",
            FeedbackCode::FormOk => "FORM_OK",
        }
    }
}

/// En regel som faktisk slo inn under kvalitetsscoringen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule: String,
    pub delta: f64,
}

/// Resultat for ett øvelsessegment. Opprettes én gang, muteres ikke etter scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseObservation {
    pub name: String,
    pub variation: Option<String>,
    pub duration_sec: f64,
    pub rep_count: u32,
    pub quality_score: f64,     // [0.5, 1.5]
    pub symmetry_score: f64,    // [0, 1]
    pub tempo_consistency: f64, // [0, 1]
    #[serde(default)]
    pub joints: BTreeMap<Joint, JointStats>,
    #[serde(default)]
    pub rep_cycles: Vec<RepCycle>,
    #[serde(default)]
    pub feedback: Vec<FeedbackCode>,
    #[serde(default)]
    pub applied_rules: Vec<AppliedRule>,
    #[serde(default)]
    pub insufficient: Option<InsufficientData>,
}

impl ExerciseObservation {
    /// Nøytralt resultat: 0 reps, kvalitet 1.0. Brukes når posedata mangler.
    pub fn neutral(name: &str, variation: Option<&str>, duration_sec: f64, reason: InsufficientData) -> Self {
        Self {
            name: name.to_string(),
            variation: variation.map(str::to_string),
            duration_sec: duration_sec.max(0.0),
            rep_count: 0,
            quality_score: 1.0,
            symmetry_score: 1.0,
            tempo_consistency: 1.0,
            joints: BTreeMap::new(),
            rep_cycles: Vec::new(),
            feedback: vec![FeedbackCode::InsufficientData { reason }],
            applied_rules: Vec::new(),
            insufficient: Some(reason),
        }
    }

    /// Observasjon rapportert av ekstern segmentering (navn, varighet, reps) uten posedata.
    pub fn reported(name: &str, duration_sec: f64, rep_count: u32) -> Self {
        Self {
            name: name.to_string(),
            variation: None,
            duration_sec: duration_sec.max(0.0),
            rep_count,
            quality_score: 1.0,
            symmetry_score: 1.0,
            tempo_consistency: 1.0,
            joints: BTreeMap::new(),
            rep_cycles: Vec::new(),
            feedback: Vec::new(),
            applied_rules: Vec::new(),
            insufficient: None,
        }
    }

    pub fn with_variation(mut self, variation: &str) -> Self {
        self.variation = Some(variation.to_string());
        self
    }

    pub fn is_insufficient(&self) -> bool {
        self.insufficient.is_some()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Økt og balanse
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionActivationVector {
    pub recorded_at: DateTime<Utc>,
    pub muscles: ActivationVector,
    pub primary_muscles: Vec<Muscle>,
    pub secondary_muscles: Vec<Muscle>,
    pub exercise_count: usize,
    /// Varighetsvektet snitt av kvalitetsscore (1.0 uten data).
    pub form_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub push: f64,
    pub pull: f64,
    pub legs: f64,
    pub core: f64,
}

impl CategoryTotals {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Push => self.push,
            Category::Pull => self.pull,
            Category::Legs => self.legs,
            Category::Core => self.core,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceFlag {
    PushDominant,
    PullDominant,
}

impl ImbalanceFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ImbalanceFlag::PushDominant => "push_dominant",
            ImbalanceFlag::PullDominant => "pull_dominant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Analyzed,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub status: BalanceStatus,
    pub session_count: usize,
    pub muscle_totals: ActivationVector,
    pub category_totals: CategoryTotals,
    pub push_pull_ratio: Option<f64>,
    pub imbalance_flags: Vec<ImbalanceFlag>,
    pub undertrained_muscles: Vec<Muscle>,
    pub neglected_muscles: Vec<Muscle>,
}

impl BalanceReport {
    pub fn no_data() -> Self {
        Self {
            status: BalanceStatus::NoData,
            session_count: 0,
            muscle_totals: ActivationVector::zeros(),
            category_totals: CategoryTotals::default(),
            push_pull_ratio: None,
            imbalance_flags: Vec::new(),
            undertrained_muscles: Vec::new(),
            neglected_muscles: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: ImbalanceFlag) -> bool {
        self.imbalance_flags.contains(&flag)
    }
}
