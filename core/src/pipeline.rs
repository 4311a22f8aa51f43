use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::angles::{self, sample_frame, JointAngleSeries};
use crate::catalog::ExerciseCatalog;
use crate::config::AnalysisConfig;
use crate::mapper::{ExerciseActivation, MuscleActivationMapper, PoseSignals};
use crate::metrics::{
    reps_counted_total, segments_analyzed_total, segments_cancelled_total, segments_insufficient_total,
    unknown_exercises_total, Metrics,
};
use crate::models::SegmentInput;
use crate::quality::assess;
use crate::reps::{count_reps, representative_series};
use crate::session::aggregate_session;
use crate::types::{
    ActivationVector, ExerciseFamily, ExerciseObservation, FeedbackCode, InsufficientData, JointKind,
    SessionActivationVector,
};

/// Kooperativ kansellering, sjekkes mellom frame-batcher.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observasjon + aktivering for ett segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub observation: ExerciseObservation,
    pub activation: ExerciseActivation,
}

impl SegmentResult {
    pub fn new(observation: ExerciseObservation, activation: ExerciseActivation) -> Self {
        Self { observation, activation }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub segments: Vec<SegmentResult>,
    pub session: SessionActivationVector,
}

pub struct SegmentAnalyzer<'a> {
    cfg: &'a AnalysisConfig,
    mapper: MuscleActivationMapper<'a>,
    metrics: &'a Metrics,
}

impl<'a> SegmentAnalyzer<'a> {
    pub fn new(catalog: &'a ExerciseCatalog, cfg: &'a AnalysisConfig, metrics: &'a Metrics) -> Self {
        Self {
            cfg,
            mapper: MuscleActivationMapper::new(catalog, cfg.mapper.clone()),
            metrics,
        }
    }

    pub fn mapper(&self) -> &MuscleActivationMapper<'a> {
        &self.mapper
    }

    /// Ett segment, uten kansellering.
    pub fn analyze(&self, seg: &SegmentInput) -> SegmentResult {
        let series = angles::extract(&seg.frames, seg.fps, &self.cfg.extraction);
        self.analyze_angles(&seg.exercise_name, seg.variation.as_deref(), seg.duration_sec(), &series)
    }

    /// Som `analyze`, men gir `None` hvis tokenet kanselleres underveis.
    /// Et segment gir enten en hel observasjon eller ingenting.
    pub fn analyze_cancellable(&self, seg: &SegmentInput, token: &CancelToken) -> Option<SegmentResult> {
        let batch = self.cfg.pool.batch_size.max(1);
        let mut samples = Vec::with_capacity(seg.frames.len());
        for (b, chunk) in seg.frames.chunks(batch).enumerate() {
            if token.is_cancelled() {
                segments_cancelled_total(self.metrics).inc();
                log::warn!("pipeline: '{}' kansellert etter {} frames", seg.exercise_name, b * batch);
                return None;
            }
            for (i, frame) in chunk.iter().enumerate() {
                samples.push(sample_frame(b * batch + i, frame, &self.cfg.extraction));
            }
        }
        let series = JointAngleSeries::from_samples(samples, seg.fps);
        Some(self.analyze_angles(&seg.exercise_name, seg.variation.as_deref(), seg.duration_sec(), &series))
    }

    /// Kjernen: vinkelserier → reps + kvalitet → observasjon, navn → aktivering.
    pub fn analyze_angles(
        &self,
        name: &str,
        variation: Option<&str>,
        duration_sec: f64,
        series: &JointAngleSeries,
    ) -> SegmentResult {
        segments_analyzed_total(self.metrics).inc();

        let insufficient = if series.is_empty() {
            Some(InsufficientData::NoConfidentKeypoints)
        } else if series.sample_count() < self.cfg.reps.min_samples {
            Some(InsufficientData::TooFewSamples)
        } else {
            None
        };
        if let Some(reason) = insufficient {
            segments_insufficient_total(self.metrics).inc();
            log::warn!("pipeline: '{}' mangler posedata ({})", name, reason.as_str());
            let observation = ExerciseObservation::neutral(name, variation, duration_sec, reason);
            return SegmentResult::new(observation, self.empty_activation(name, variation));
        }

        let family = ExerciseFamily::from_name(name);
        let rep_series = representative_series(family, series);
        let reps = count_reps(&rep_series, series.fps, &self.cfg.reps);
        let quality = assess(family, series, &reps, &self.cfg.quality);

        let mut feedback = quality.feedback;
        if let Some(reason) = reps.insufficient {
            feedback.retain(|f| *f != FeedbackCode::FormOk);
            feedback.push(FeedbackCode::InsufficientData { reason });
        }
        reps_counted_total(self.metrics).inc_by(u64::from(reps.reps));

        let observation = ExerciseObservation {
            name: name.to_string(),
            variation: variation.map(str::to_string),
            duration_sec: duration_sec.max(0.0),
            rep_count: reps.reps,
            quality_score: quality.score,
            symmetry_score: quality.symmetry,
            tempo_consistency: quality.tempo,
            joints: series.stats(),
            rep_cycles: reps.cycles,
            feedback,
            applied_rules: quality.applied_rules,
            insufficient: None,
        };

        let pose = PoseSignals { knee_min: series.side_avg_min(JointKind::Knee) };
        let activation = self.mapper.activation(name, variation, &pose);
        if activation.is_unknown() {
            unknown_exercises_total(self.metrics).inc();
        }

        log::debug!(
            "pipeline: '{}' ({:?}) reps={} quality={:.2}",
            name,
            family,
            observation.rep_count,
            observation.quality_score
        );
        SegmentResult::new(observation, activation)
    }

    /// Identiteten beholdes, men uten aktivering.
    fn empty_activation(&self, name: &str, variation: Option<&str>) -> ExerciseActivation {
        let mut act = self.mapper.activation(name, variation, &PoseSignals::default());
        if act.is_unknown() {
            unknown_exercises_total(self.metrics).inc();
        }
        act.activation = ActivationVector::new();
        act.primary_muscles.clear();
        act.secondary_muscles.clear();
        act.modifiers_applied.clear();
        act
    }

    /// Segmenter parallelt i en pool med min(max_workers, n) tråder.
    /// Kansellerte segmenter utelates; rekkefølgen på resten beholdes.
    pub fn analyze_batch(&self, segments: &[SegmentInput], token: &CancelToken) -> Vec<SegmentResult> {
        if segments.is_empty() {
            return Vec::new();
        }
        let workers = self.cfg.pool.max_workers.min(segments.len()).max(1);
        let run = || {
            segments
                .par_iter()
                .filter_map(|s| self.analyze_cancellable(s, token))
                .collect::<Vec<_>>()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("pipeline: kunne ikke bygge trådpool ({e}), kjører sekvensielt");
                segments.iter().filter_map(|s| self.analyze_cancellable(s, token)).collect()
            }
        }
    }

    /// Batch + aggregering til én økt.
    pub fn analyze_session(
        &self,
        segments: &[SegmentInput],
        token: &CancelToken,
        recorded_at: DateTime<Utc>,
    ) -> SessionAnalysis {
        let results = self.analyze_batch(segments, token);
        let session = aggregate_session(&results, &self.cfg.session, recorded_at);
        SessionAnalysis { segments: results, session }
    }
}
