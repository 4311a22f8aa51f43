// ───────────────── Moduler ─────────────────
pub mod angles;
pub mod balance;
pub mod catalog;
pub mod config;
pub mod error;
pub mod json_api;
pub mod mapper;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod reps;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(feature = "python")]
mod py;

// ───────────────── Re-eksporter ─────────────────
pub use angles::{extract, vertex_angle, JointAngleSeries};
pub use balance::{analyze_history, analyze_vector, category_totals, push_pull_ratio};
pub use catalog::{normalize_name, ExerciseCatalog, ExerciseCatalogEntry};
pub use config::AnalysisConfig;
pub use error::{CatalogError, ConfigError};
pub use json_api::{analyze_segments_json, balance_report_json, session_activation_json};
pub use mapper::{ExerciseActivation, MatchKind, MuscleActivationMapper, PoseSignals, UNKNOWN_EXERCISE};
pub use metrics::Metrics;
pub use models::{Keypoint, KeypointFrame, SegmentInput};
pub use pipeline::{CancelToken, SegmentAnalyzer, SegmentResult, SessionAnalysis};
pub use quality::{assess, QualityAssessment};
pub use reps::{count_reps, RepCount, RepState};
pub use session::{aggregate_session, segment_weight};
pub use storage::{load_catalog, load_config};
pub use types::{
    ActivationVector, AngleSeries, BalanceReport, BalanceStatus, Category, CategoryTotals, ExerciseFamily,
    ExerciseObservation, FeedbackCode, ImbalanceFlag, InsufficientData, Joint, JointKind, JointStats, Muscle,
    RepCycle, SessionActivationVector,
};
