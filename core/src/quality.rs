use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::angles::JointAngleSeries;
use crate::config::{QualityConfig, QUALITY_MAX, QUALITY_MIN};
use crate::reps::RepCount;
use crate::types::{AppliedRule, ExerciseFamily, FeedbackCode, JointKind};

/// Det scoringen ser av ett segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringInputs {
    pub family: ExerciseFamily,
    pub knee_min: Option<f64>,
    pub elbow_max: Option<f64>,
    pub hip_min: Option<f64>,
    pub symmetry: f64,
    pub tempo: f64,
}

/// Navngitt regel: predikat, delta og begrunnelse. Alle treff summeres før klemming.
pub struct QualityRule {
    pub name: &'static str,
    pub applies: fn(&ScoringInputs, &QualityConfig) -> bool,
    pub delta: f64,
    pub rationale: &'static str,
    pub feedback: fn(&ScoringInputs) -> Option<FeedbackCode>,
}

// ── predikater ────────────────────────────────────────────────────────────────

fn squat_knee(i: &ScoringInputs) -> Option<f64> {
    i.knee_min.filter(|_| i.family == ExerciseFamily::Squat)
}

fn press_elbow(i: &ScoringInputs) -> Option<f64> {
    i.elbow_max.filter(|_| i.family == ExerciseFamily::PressCurl)
}

fn hinge_hip(i: &ScoringInputs) -> Option<f64> {
    i.hip_min.filter(|_| i.family == ExerciseFamily::Hinge)
}

fn depth_excellent(i: &ScoringInputs, c: &QualityConfig) -> bool {
    squat_knee(i).is_some_and(|k| k < c.depth_excellent_deg)
}
fn depth_parallel(i: &ScoringInputs, c: &QualityConfig) -> bool {
    squat_knee(i).is_some_and(|k| k >= c.depth_excellent_deg && k < c.depth_parallel_deg)
}
fn depth_slightly_shallow(i: &ScoringInputs, c: &QualityConfig) -> bool {
    squat_knee(i).is_some_and(|k| k >= c.depth_parallel_deg && k <= c.depth_shallow_deg)
}
fn depth_shallow(i: &ScoringInputs, c: &QualityConfig) -> bool {
    squat_knee(i).is_some_and(|k| k > c.depth_shallow_deg)
}
fn full_extension(i: &ScoringInputs, c: &QualityConfig) -> bool {
    press_elbow(i).is_some_and(|e| e > c.lockout_full_deg)
}
fn partial_lockout(i: &ScoringInputs, c: &QualityConfig) -> bool {
    press_elbow(i).is_some_and(|e| e > c.lockout_partial_deg && e <= c.lockout_full_deg)
}
fn limited_extension(i: &ScoringInputs, c: &QualityConfig) -> bool {
    press_elbow(i).is_some_and(|e| e >= c.lockout_poor_deg && e <= c.lockout_partial_deg)
}
fn incomplete_extension(i: &ScoringInputs, c: &QualityConfig) -> bool {
    press_elbow(i).is_some_and(|e| e < c.lockout_poor_deg)
}
fn hip_hinge_good(i: &ScoringInputs, c: &QualityConfig) -> bool {
    hinge_hip(i).is_some_and(|h| h < c.hip_hinge_good_deg)
}
fn hip_hinge_shallow(i: &ScoringInputs, c: &QualityConfig) -> bool {
    hinge_hip(i).is_some_and(|h| h >= c.hip_hinge_good_deg)
}
fn symmetry_good(i: &ScoringInputs, c: &QualityConfig) -> bool {
    i.symmetry > c.symmetry_good
}
fn symmetry_poor(i: &ScoringInputs, c: &QualityConfig) -> bool {
    i.symmetry < c.symmetry_poor
}
fn tempo_good(i: &ScoringInputs, c: &QualityConfig) -> bool {
    i.tempo > c.tempo_good
}
fn tempo_poor(i: &ScoringInputs, c: &QualityConfig) -> bool {
    i.tempo < c.tempo_poor
}

// ── koder ─────────────────────────────────────────────────────────────────────

fn code_depth_excellent(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.knee_min.map(|knee_min| FeedbackCode::DepthExcellent { knee_min })
}
fn code_depth_parallel(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.knee_min.map(|knee_min| FeedbackCode::DepthParallel { knee_min })
}
fn code_depth_slightly_shallow(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.knee_min.map(|knee_min| FeedbackCode::DepthSlightlyShallow { knee_min })
}
fn code_depth_shallow(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.knee_min.map(|knee_min| FeedbackCode::DepthShallow { knee_min })
}
fn code_full_extension(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.elbow_max.map(|elbow_max| FeedbackCode::FullExtension { elbow_max })
}
fn code_partial_lockout(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.elbow_max.map(|elbow_max| FeedbackCode::PartialLockout { elbow_max })
}
fn code_limited_extension(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.elbow_max.map(|elbow_max| FeedbackCode::LimitedExtension { elbow_max })
}
fn code_incomplete_extension(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.elbow_max.map(|elbow_max| FeedbackCode::IncompleteExtension { elbow_max })
}
fn code_hip_hinge_good(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.hip_min.map(|hip_min| FeedbackCode::HipHingeGood { hip_min })
}
fn code_hip_hinge_shallow(i: &ScoringInputs) -> Option<FeedbackCode> {
    i.hip_min.map(|hip_min| FeedbackCode::HipHingeShallow { hip_min })
}
fn code_tempo_inconsistent(i: &ScoringInputs) -> Option<FeedbackCode> {
    Some(FeedbackCode::TempoInconsistent { consistency: i.tempo })
}
fn no_code(_: &ScoringInputs) -> Option<FeedbackCode> {
    None
}

/// Regelliste i evalueringsrekkefølge. ROM først, så symmetri, så tempo.
pub static RULES: &[QualityRule] = &[
    QualityRule { name: "depth_excellent", applies: depth_excellent, delta: 0.2, rationale: "kne-min under 80°", feedback: code_depth_excellent },
    QualityRule { name: "depth_parallel", applies: depth_parallel, delta: 0.1, rationale: "kne-min rundt parallell", feedback: code_depth_parallel },
    QualityRule { name: "depth_slightly_shallow", applies: depth_slightly_shallow, delta: 0.0, rationale: "kne-min litt over parallell", feedback: code_depth_slightly_shallow },
    QualityRule { name: "depth_shallow", applies: depth_shallow, delta: -0.2, rationale: "kne-min over 115°", feedback: code_depth_shallow },
    QualityRule { name: "full_extension", applies: full_extension, delta: 0.1, rationale: "albue-max over 165°", feedback: code_full_extension },
    QualityRule { name: "partial_lockout", applies: partial_lockout, delta: 0.0, rationale: "albue-max 150–165°", feedback: code_partial_lockout },
    QualityRule { name: "limited_extension", applies: limited_extension, delta: 0.0, rationale: "albue-max 140–150°", feedback: code_limited_extension },
    QualityRule { name: "incomplete_extension", applies: incomplete_extension, delta: -0.15, rationale: "albue-max under 140°", feedback: code_incomplete_extension },
    QualityRule { name: "hip_hinge_good", applies: hip_hinge_good, delta: 0.0, rationale: "hofte-min under 60°", feedback: code_hip_hinge_good },
    QualityRule { name: "hip_hinge_shallow", applies: hip_hinge_shallow, delta: 0.0, rationale: "hofte-min 60° eller mer", feedback: code_hip_hinge_shallow },
    QualityRule { name: "symmetry_bonus", applies: symmetry_good, delta: 0.1, rationale: "symmetri over 0.9", feedback: no_code },
    QualityRule { name: "symmetry_penalty", applies: symmetry_poor, delta: -0.15, rationale: "symmetri under 0.7", feedback: no_code },
    QualityRule { name: "tempo_bonus", applies: tempo_good, delta: 0.05, rationale: "jevnt tempo", feedback: no_code },
    QualityRule { name: "tempo_penalty", applies: tempo_poor, delta: -0.1, rationale: "ujevnt tempo", feedback: code_tempo_inconsistent },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOutcome {
    pub score: f64,
    pub applied_rules: Vec<AppliedRule>,
    pub feedback: Vec<FeedbackCode>,
}

/// Summer alle treff fra 1.0 og klem til [0.5, 1.5].
pub fn score_rules(inputs: &ScoringInputs, cfg: &QualityConfig) -> QualityOutcome {
    let mut total: f64 = 1.0;
    let mut applied_rules = Vec::new();
    let mut feedback = Vec::new();
    for rule in RULES.iter().filter(|r| (r.applies)(inputs, cfg)) {
        total += rule.delta;
        applied_rules.push(AppliedRule { rule: rule.name.to_string(), delta: rule.delta });
        if let Some(code) = (rule.feedback)(inputs) {
            feedback.push(code);
        }
        log::debug!("quality: {} ({:+.2}) {}", rule.name, rule.delta, rule.rationale);
    }
    QualityOutcome { score: total.clamp(QUALITY_MIN, QUALITY_MAX), applied_rules, feedback }
}

// ──────────────────────────────────────────────────────────────────────────────
// Symmetri og tempo
// ──────────────────────────────────────────────────────────────────────────────

/// |snitt venstre − snitt høyre| per ledd der begge sider har data.
pub fn pair_diffs(angles: &JointAngleSeries) -> BTreeMap<JointKind, f64> {
    JointKind::ALL
        .iter()
        .filter_map(|k| {
            let l = angles.joint(k.left())?.mean()?;
            let r = angles.joint(k.right())?.mean()?;
            Some((*k, (l - r).abs()))
        })
        .collect()
}

/// max(0, 1 − snittdiff/skala). Ingen par → 1.0.
pub fn symmetry_score(diffs: &BTreeMap<JointKind, f64>, cfg: &QualityConfig) -> f64 {
    if diffs.is_empty() {
        return 1.0;
    }
    let avg = diffs.values().sum::<f64>() / diffs.len() as f64;
    (1.0 - avg / cfg.symmetry_scale_deg).clamp(0.0, 1.0)
}

/// 1 − std/mean av rep-varigheter, klemt [0,1]. Under 2 varigheter → 1.0.
pub fn tempo_consistency(durations: &[f64]) -> f64 {
    if durations.len() < 2 {
        return 1.0;
    }
    let n = durations.len() as f64;
    let mean = durations.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let var = durations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    (1.0 - var.sqrt() / mean).clamp(0.0, 1.0)
}

/// Samlet vurdering for ett segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: f64,
    pub symmetry: f64,
    pub tempo: f64,
    pub applied_rules: Vec<AppliedRule>,
    pub feedback: Vec<FeedbackCode>,
}

/// Ledd som kan gi ASYMMETRY_DETECTED. Hofte teller i symmetriscoren, men flagges ikke.
pub const ASYMMETRY_JOINTS: [JointKind; 3] = [JointKind::Elbow, JointKind::Knee, JointKind::Shoulder];

pub fn assess(
    family: ExerciseFamily,
    angles: &JointAngleSeries,
    reps: &RepCount,
    cfg: &QualityConfig,
) -> QualityAssessment {
    let diffs = pair_diffs(angles);
    let symmetry = symmetry_score(&diffs, cfg);
    let tempo = tempo_consistency(&reps.durations());

    let inputs = ScoringInputs {
        family,
        knee_min: angles.side_avg_min(JointKind::Knee),
        elbow_max: angles.side_avg_max(JointKind::Elbow),
        hip_min: angles.side_avg_min(JointKind::Hip),
        symmetry,
        tempo,
    };
    let outcome = score_rules(&inputs, cfg);

    // ROM-koder, så asymmetri, så tempo
    let mut feedback: Vec<FeedbackCode> = outcome
        .feedback
        .iter()
        .filter(|f| !matches!(f, FeedbackCode::TempoInconsistent { .. }))
        .cloned()
        .collect();
    for (joint, degrees) in diffs
        .iter()
        .filter(|(k, d)| ASYMMETRY_JOINTS.contains(*k) && **d > cfg.asymmetry_flag_deg)
    {
        feedback.push(FeedbackCode::AsymmetryDetected { joint: *joint, degrees: *degrees });
    }
    feedback.extend(
        outcome
            .feedback
            .iter()
            .filter(|f| matches!(f, FeedbackCode::TempoInconsistent { .. }))
            .cloned(),
    );
    if feedback.is_empty() {
        feedback.push(FeedbackCode::FormOk);
    }

    QualityAssessment {
        score: outcome.score,
        symmetry,
        tempo,
        applied_rules: outcome.applied_rules,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(family: ExerciseFamily) -> ScoringInputs {
        ScoringInputs { family, knee_min: None, elbow_max: None, hip_min: None, symmetry: 0.8, tempo: 0.6 }
    }

    fn rule_names(o: &QualityOutcome) -> Vec<&str> {
        o.applied_rules.iter().map(|r| r.rule.as_str()).collect()
    }

    #[test]
    fn neutral_inputs_score_one() {
        let o = score_rules(&inputs(ExerciseFamily::Other), &QualityConfig::default());
        assert_eq!(o.score, 1.0);
        assert!(o.applied_rules.is_empty());
    }

    #[test]
    fn deep_squat_gets_depth_bonus_only_once() {
        let mut i = inputs(ExerciseFamily::Squat);
        i.knee_min = Some(70.0);
        let o = score_rules(&i, &QualityConfig::default());
        assert_eq!(rule_names(&o), vec!["depth_excellent"]);
        assert!((o.score - 1.2).abs() < 1e-12);
    }

    #[test]
    fn depth_rules_are_ignored_for_press() {
        let mut i = inputs(ExerciseFamily::PressCurl);
        i.knee_min = Some(60.0);
        i.elbow_max = Some(130.0);
        let o = score_rules(&i, &QualityConfig::default());
        assert_eq!(rule_names(&o), vec!["incomplete_extension"]);
        assert!((o.score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn limited_extension_has_its_own_code() {
        let mut i = inputs(ExerciseFamily::PressCurl);
        i.elbow_max = Some(145.0);
        let o = score_rules(&i, &QualityConfig::default());
        assert_eq!(rule_names(&o), vec!["limited_extension"]);
        assert_eq!(o.feedback, vec![FeedbackCode::LimitedExtension { elbow_max: 145.0 }]);
        assert_eq!(o.score, 1.0);
    }

    #[test]
    fn hip_asymmetry_lowers_symmetry_but_is_not_flagged() {
        use crate::types::{AngleSeries, Joint};

        let mut joints = BTreeMap::new();
        joints.insert(Joint::LeftHip, AngleSeries::dense(&[100.0; 20]));
        joints.insert(Joint::RightHip, AngleSeries::dense(&[120.0; 20]));
        let angles = JointAngleSeries::from_joint_series(30.0, joints);

        let a = assess(ExerciseFamily::Other, &angles, &RepCount::default(), &QualityConfig::default());
        assert!(a.symmetry < 0.7, "symmetri {}", a.symmetry);
        assert!(!a.feedback.iter().any(|f| f.code() == "ASYMMETRY_DETECTED"), "{:?}", a.feedback);

        let mut joints = BTreeMap::new();
        joints.insert(Joint::LeftKnee, AngleSeries::dense(&[100.0; 20]));
        joints.insert(Joint::RightKnee, AngleSeries::dense(&[120.0; 20]));
        let angles = JointAngleSeries::from_joint_series(30.0, joints);
        let a = assess(ExerciseFamily::Other, &angles, &RepCount::default(), &QualityConfig::default());
        assert!(a.feedback.contains(&FeedbackCode::AsymmetryDetected { joint: JointKind::Knee, degrees: 20.0 }));
    }

    #[test]
    fn score_is_clamped_to_bounds() {
        let mut worst = inputs(ExerciseFamily::Squat);
        worst.knee_min = Some(150.0);
        worst.symmetry = 0.1;
        worst.tempo = 0.1;
        let lo = score_rules(&worst, &QualityConfig::default());
        // 1.0 − 0.2 − 0.15 − 0.1 = 0.55, fortsatt innenfor
        assert!((lo.score - 0.55).abs() < 1e-12);

        let mut best = inputs(ExerciseFamily::Squat);
        best.knee_min = Some(60.0);
        best.symmetry = 1.0;
        best.tempo = 1.0;
        let hi = score_rules(&best, &QualityConfig::default());
        assert!((hi.score - 1.35).abs() < 1e-12);
        assert!(hi.score <= QUALITY_MAX);
    }

    #[test]
    fn symmetry_score_edges() {
        let cfg = QualityConfig::default();
        let zero: BTreeMap<JointKind, f64> = [(JointKind::Knee, 0.0)].into_iter().collect();
        let wide: BTreeMap<JointKind, f64> = [(JointKind::Knee, 30.0), (JointKind::Elbow, 45.0)].into_iter().collect();
        assert_eq!(symmetry_score(&zero, &cfg), 1.0);
        assert_eq!(symmetry_score(&wide, &cfg), 0.0);
        assert_eq!(symmetry_score(&BTreeMap::new(), &cfg), 1.0);
    }

    #[test]
    fn tempo_consistency_cases() {
        assert_eq!(tempo_consistency(&[2.0]), 1.0);
        assert_eq!(tempo_consistency(&[2.0, 2.0, 2.0]), 1.0);
        // std = 1, mean = 2
        assert!((tempo_consistency(&[1.0, 3.0]) - 0.5).abs() < 1e-12);
        assert_eq!(tempo_consistency(&[0.5, 0.5, 5.0]), 0.0);
    }
}
