use chrono::{DateTime, Duration, Utc};

use crate::config::BalanceConfig;
use crate::session::weighted_normalize;
use crate::types::{
    ActivationVector, BalanceReport, BalanceStatus, Category, CategoryTotals, ImbalanceFlag, Muscle,
    SessionActivationVector,
};

/// Kategori-total = snitt av medlemsverdiene.
pub fn category_totals(v: &ActivationVector) -> CategoryTotals {
    let mean = |c: Category| {
        let members = c.members();
        members.iter().map(|m| v.get(*m)).sum::<f64>() / members.len() as f64
    };
    CategoryTotals {
        push: mean(Category::Push),
        pull: mean(Category::Pull),
        legs: mean(Category::Legs),
        core: mean(Category::Core),
    }
}

/// push/pull. None når en av sidene er 0.
pub fn push_pull_ratio(push: f64, pull: f64) -> Option<f64> {
    if push > 0.0 && pull > 0.0 { Some(push / pull) } else { None }
}

pub fn imbalance_flags(push: f64, pull: f64, cfg: &BalanceConfig) -> Vec<ImbalanceFlag> {
    let flag = match push_pull_ratio(push, pull) {
        Some(r) if r > cfg.push_dominant_ratio => Some(ImbalanceFlag::PushDominant),
        Some(r) if r < cfg.pull_dominant_ratio => Some(ImbalanceFlag::PullDominant),
        Some(_) => None,
        // én side helt fraværende
        None if push > 0.0 => Some(ImbalanceFlag::PushDominant),
        None if pull > 0.0 => Some(ImbalanceFlag::PullDominant),
        None => None,
    };
    flag.into_iter().collect()
}

/// Økter med `recorded_at` innenfor de siste `days` dagene.
/// Vindu som går forbi chrono sitt tidsområde er ubegrenset bakover.
pub fn within_window<'a>(
    sessions: &'a [SessionActivationVector],
    now: DateTime<Utc>,
    days: i64,
) -> Vec<&'a SessionActivationVector> {
    let Some(cutoff) = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d)) else {
        return sessions.iter().collect();
    };
    sessions.iter().filter(|s| s.recorded_at >= cutoff).collect()
}

/// Historikk: vekt 1 per økt, samme sum-så-normaliser-regel som for én økt.
pub fn aggregate_history<'a, I>(sessions: I) -> ActivationVector
where
    I: IntoIterator<Item = &'a SessionActivationVector>,
{
    weighted_normalize(sessions.into_iter().map(|s| (1.0, &s.muscles)))
}

/// Rapport for en ferdig normalisert vektor.
pub fn analyze_vector(totals: &ActivationVector, session_count: usize, cfg: &BalanceConfig) -> BalanceReport {
    let cats = category_totals(totals);
    let any = totals.max_value() > 0.0;
    let below = |t: f64| -> Vec<Muscle> {
        if !any {
            return Vec::new();
        }
        Muscle::ALL.iter().copied().filter(|m| totals.get(*m) < t).collect()
    };
    let report = BalanceReport {
        status: BalanceStatus::Analyzed,
        session_count,
        muscle_totals: Muscle::ALL.iter().map(|m| (*m, totals.get(*m))).collect(),
        category_totals: cats,
        push_pull_ratio: push_pull_ratio(cats.push, cats.pull),
        imbalance_flags: imbalance_flags(cats.push, cats.pull, cfg),
        undertrained_muscles: below(cfg.undertrained_threshold),
        neglected_muscles: below(cfg.neglected_threshold),
    };
    log::debug!(
        "balance: push {:.3} pull {:.3} ratio {:?} flags {:?}",
        cats.push,
        cats.pull,
        report.push_pull_ratio,
        report.imbalance_flags
    );
    report
}

/// Vindu → aggreger → analyser. Tom historikk gir `no_data`.
pub fn analyze_history(
    sessions: &[SessionActivationVector],
    now: DateTime<Utc>,
    cfg: &BalanceConfig,
) -> BalanceReport {
    let recent = within_window(sessions, now, cfg.window_days);
    if recent.is_empty() {
        log::debug!("balance: ingen økter siste {} dager", cfg.window_days);
        return BalanceReport::no_data();
    }
    let totals = aggregate_history(recent.iter().copied());
    analyze_vector(&totals, recent.len(), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_thresholds() {
        let cfg = BalanceConfig::default();
        assert_eq!(imbalance_flags(0.9, 0.3, &cfg), vec![ImbalanceFlag::PushDominant]);
        assert_eq!(imbalance_flags(0.3, 0.9, &cfg), vec![ImbalanceFlag::PullDominant]);
        assert!(imbalance_flags(0.5, 0.5, &cfg).is_empty());
    }

    #[test]
    fn zero_side_is_flagged_without_ratio() {
        let cfg = BalanceConfig::default();
        assert_eq!(push_pull_ratio(0.4, 0.0), None);
        assert_eq!(imbalance_flags(0.4, 0.0, &cfg), vec![ImbalanceFlag::PushDominant]);
        assert_eq!(imbalance_flags(0.0, 0.2, &cfg), vec![ImbalanceFlag::PullDominant]);
        assert!(imbalance_flags(0.0, 0.0, &cfg).is_empty());
    }

    #[test]
    fn category_total_is_member_mean() {
        let v: ActivationVector = [(Muscle::Chest, 0.9), (Muscle::Shoulders, 0.6), (Muscle::Triceps, 0.3)]
            .into_iter()
            .collect();
        let c = category_totals(&v);
        assert!((c.push - 0.6).abs() < 1e-12);
        assert_eq!(c.pull, 0.0);
    }

    #[test]
    fn all_zero_vector_has_no_undertrained_list() {
        let r = analyze_vector(&ActivationVector::zeros(), 1, &BalanceConfig::default());
        assert!(r.undertrained_muscles.is_empty());
        assert!(r.imbalance_flags.is_empty());
    }

    #[test]
    fn huge_window_does_not_overflow() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let old = SessionActivationVector {
            recorded_at: now - Duration::days(3650),
            muscles: [(Muscle::Chest, 0.5), (Muscle::Lats, 0.5)].into_iter().collect(),
            primary_muscles: vec![Muscle::Chest, Muscle::Lats],
            secondary_muscles: Vec::new(),
            exercise_count: 1,
            form_score: 1.0,
        };
        let sessions = [old];
        assert_eq!(within_window(&sessions, now, i64::MAX).len(), 1);
        assert_eq!(within_window(&sessions, now, 1_000_000_000).len(), 1);
        assert!(within_window(&sessions, now, 30).is_empty());
    }
}
