use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;

use crate::config::SessionConfig;
use crate::pipeline::SegmentResult;
use crate::types::{ActivationVector, Muscle, SessionActivationVector};

/// Vekt for ett segment: varighet (gulv 30 s), ev. skalert med reps/10.
pub fn segment_weight(duration_sec: f64, rep_count: u32, cfg: &SessionConfig) -> f64 {
    let base = duration_sec.max(cfg.min_segment_weight_sec);
    if cfg.scale_by_reps && rep_count > 0 {
        base * rep_count as f64 / cfg.reps_scale_divisor
    } else {
        base
    }
}

/// Sum i sortert rekkefølge: samme multimengde gir samme bits uansett inputrekkefølge.
pub fn ordered_sum(mut terms: Vec<f64>) -> f64 {
    terms.sort_by_key(|t| OrderedFloat(*t));
    terms.into_iter().sum()
}

/// Vektet sum per muskel, delt på største total. Max = 0 → alt 0.
/// Produktene summeres sortert, så resultatet er bit-likt for alle permutasjoner.
pub fn weighted_normalize<'a, I>(items: I) -> ActivationVector
where
    I: IntoIterator<Item = (f64, &'a ActivationVector)>,
{
    let mut terms: BTreeMap<Muscle, Vec<f64>> = Muscle::ALL.iter().map(|m| (*m, Vec::new())).collect();
    for (w, v) in items {
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        for (m, x) in v.iter() {
            terms.entry(m).or_default().push(x * w);
        }
    }
    let totals: BTreeMap<Muscle, f64> = terms.into_iter().map(|(m, t)| (m, ordered_sum(t))).collect();
    let max = totals.values().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return ActivationVector::zeros();
    }
    totals.into_iter().map(|(m, t)| (m, t / max)).collect()
}

/// Slår sammen alle segmenter i én økt.
pub fn aggregate_session(
    results: &[SegmentResult],
    cfg: &SessionConfig,
    recorded_at: DateTime<Utc>,
) -> SessionActivationVector {
    let weighted = results
        .iter()
        .filter(|r| !r.activation.is_unknown())
        .map(|r| {
            let w = segment_weight(r.observation.duration_sec, r.observation.rep_count, cfg);
            (w, &r.activation.activation)
        });
    let muscles = weighted_normalize(weighted);

    // formscore: kun segmenter med posedata
    let (mut num, mut den) = (Vec::new(), Vec::new());
    for r in results.iter().filter(|r| !r.observation.is_insufficient()) {
        let w = r.observation.duration_sec.max(cfg.min_segment_weight_sec);
        num.push(r.observation.quality_score * w);
        den.push(w);
    }
    let (num, den) = (ordered_sum(num), ordered_sum(den));
    let form_score = if den > 0.0 { num / den } else { 1.0 };

    log::debug!("session: {} segmenter, formscore {:.3}", results.len(), form_score);
    SessionActivationVector {
        recorded_at,
        primary_muscles: muscles.primary_muscles(cfg.primary_cut),
        secondary_muscles: muscles.secondary_muscles(cfg.secondary_cut, cfg.primary_cut),
        muscles,
        exercise_count: results.len(),
        form_score,
    }
}

impl SessionActivationVector {
    /// Topp-N muskler, verdi synkende og deretter fast muskelrekkefølge.
    pub fn top_muscles(&self, n: usize) -> Vec<Muscle> {
        self.muscles.top(n)
    }
}
