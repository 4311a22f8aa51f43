use serde::{Deserialize, Serialize};

use crate::angles::JointAngleSeries;
use crate::config::RepConfig;
use crate::types::{AngleSeries, ExerciseFamily, InsufficientData, JointKind, RepCycle};

/// Tilstand i Schmitt-triggeren.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepState {
    Idle,
    InRep,
    Cooldown(u32), // gjenstående frames
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub high: f64,
    pub low: f64,
    pub cooldown_frames: u32,
}

impl Thresholds {
    pub fn from_config(cfg: &RepConfig, fps: f64) -> Self {
        Self {
            high: cfg.high_threshold,
            low: cfg.low_threshold,
            cooldown_frames: cfg.cooldown_frames(fps),
        }
    }
}

/// Én overgang. `value` er normalisert [0,1]; `None` = hull i serien.
///
/// - Cooldown teller ned på hvert bilde, også hull. Bildet som tømmer
///   cooldown konsumeres og gir `InRep`, så signalet må under `low` før neste rep.
/// - Idle: stigning over `high` teller en rep og starter cooldown.
/// - InRep: fall under `low` gir Idle.
pub fn step(state: RepState, value: Option<f64>, t: &Thresholds) -> (RepState, bool) {
    match (state, value) {
        (RepState::Cooldown(n), _) if n > 1 => (RepState::Cooldown(n - 1), false),
        (RepState::Cooldown(_), _) => (RepState::InRep, false),
        (RepState::Idle, Some(v)) if v > t.high => (RepState::Cooldown(t.cooldown_frames), true),
        (RepState::InRep, Some(v)) if v < t.low => (RepState::Idle, false),
        (s, _) => (s, false),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepCount {
    pub reps: u32,
    /// Spenn mellom påfølgende rep-starter (reps − 1 stykker).
    pub cycles: Vec<RepCycle>,
    pub onsets: Vec<usize>,
    pub insufficient: Option<InsufficientData>,
}

impl RepCount {
    fn insufficient(reason: InsufficientData) -> Self {
        Self { insufficient: Some(reason), ..Self::default() }
    }

    pub fn durations(&self) -> Vec<f64> {
        self.cycles.iter().map(|c| c.duration_sec).collect()
    }
}

/// Representativ serie per familie: kne for squat/lunge, albue for press/curl,
/// ellers snitt av alle ledd.
pub fn representative_series(family: ExerciseFamily, angles: &JointAngleSeries) -> AngleSeries {
    match family {
        ExerciseFamily::Squat => angles.pair_mean(JointKind::Knee),
        ExerciseFamily::PressCurl => angles.pair_mean(JointKind::Elbow),
        ExerciseFamily::Hinge | ExerciseFamily::Other => angles.movement_proxy(),
    }
}

fn frame_time(frame: usize, fps: f64) -> f64 {
    if fps > 0.0 { frame as f64 / fps } else { 0.0 }
}

/// Teller reps i én vinkelserie.
pub fn count_reps(series: &AngleSeries, fps: f64, cfg: &RepConfig) -> RepCount {
    if series.present_count() < cfg.min_samples {
        log::debug!("reps: {} samples < {}, ingen reps", series.present_count(), cfg.min_samples);
        return RepCount::insufficient(InsufficientData::TooFewSamples);
    }
    let (Some(lo), Some(hi)) = (series.min(), series.max()) else {
        return RepCount::insufficient(InsufficientData::TooFewSamples);
    };
    let range = hi - lo;
    if range < cfg.min_range_deg {
        log::debug!("reps: range {:.1}° < {:.1}°, ingen repeterbar bevegelse", range, cfg.min_range_deg);
        return RepCount::insufficient(InsufficientData::FlatSignal);
    }

    let t = Thresholds::from_config(cfg, fps);
    let mut state = RepState::Idle;
    let mut onsets = Vec::new();
    for (i, v) in series.frames().iter().enumerate() {
        let norm = v.map(|x| (x - lo) / range);
        let (next, counted) = step(state, norm, &t);
        if counted {
            onsets.push(i);
        }
        state = next;
    }

    let cycles = onsets
        .windows(2)
        .map(|w| {
            let (start_sec, end_sec) = (frame_time(w[0], fps), frame_time(w[1], fps));
            RepCycle {
                start_frame: w[0],
                end_frame: w[1],
                start_sec,
                end_sec,
                duration_sec: end_sec - start_sec,
            }
        })
        .collect();

    log::debug!("reps: {} reps (cooldown {} frames)", onsets.len(), t.cooldown_frames);
    RepCount { reps: onsets.len() as u32, cycles, onsets, insufficient: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Thresholds = Thresholds { high: 0.7, low: 0.3, cooldown_frames: 3 };

    #[test]
    fn idle_rise_counts_and_enters_cooldown() {
        assert_eq!(step(RepState::Idle, Some(0.8), &T), (RepState::Cooldown(3), true));
        assert_eq!(step(RepState::Idle, Some(0.7), &T), (RepState::Idle, false));
    }

    #[test]
    fn cooldown_ticks_on_gaps_and_expiry_frame_is_consumed() {
        let (s, c) = step(RepState::Cooldown(2), None, &T);
        assert_eq!((s, c), (RepState::Cooldown(1), false));
        // utløp samtidig med høy verdi: ingen ny rep
        assert_eq!(step(s, Some(0.95), &T), (RepState::InRep, false));
    }

    #[test]
    fn in_rep_needs_drop_below_low() {
        assert_eq!(step(RepState::InRep, Some(0.9), &T), (RepState::InRep, false));
        assert_eq!(step(RepState::InRep, Some(0.3), &T), (RepState::InRep, false));
        assert_eq!(step(RepState::InRep, Some(0.29), &T), (RepState::Idle, false));
        assert_eq!(step(RepState::InRep, None, &T), (RepState::InRep, false));
    }

    #[test]
    fn short_series_gives_zero_reps() {
        let s = AngleSeries::dense(&[60.0, 170.0, 60.0, 170.0, 60.0, 170.0, 60.0, 170.0, 60.0]);
        let rc = count_reps(&s, 30.0, &RepConfig::default());
        assert_eq!(rc.reps, 0);
        assert_eq!(rc.insufficient, Some(InsufficientData::TooFewSamples));
    }

    #[test]
    fn flat_series_gives_zero_reps() {
        let vals: Vec<f64> = (0..300).map(|i| 100.0 + 9.0 * ((i as f64) * 0.2).sin()).collect();
        let rc = count_reps(&AngleSeries::dense(&vals), 30.0, &RepConfig::default());
        assert_eq!(rc.reps, 0);
        assert_eq!(rc.insufficient, Some(InsufficientData::FlatSignal));
    }

    #[test]
    fn cycles_span_consecutive_onsets() {
        let vals: Vec<f64> = (0..300)
            .map(|i| 115.0 - 55.0 * (std::f64::consts::PI * i as f64 / 30.0).cos())
            .collect();
        let rc = count_reps(&AngleSeries::dense(&vals), 30.0, &RepConfig::default());
        assert_eq!(rc.reps, 5);
        assert_eq!(rc.cycles.len(), 4);
        for d in rc.durations() {
            assert!((d - 2.0).abs() < 0.05, "varighet {d}");
        }
    }
}
