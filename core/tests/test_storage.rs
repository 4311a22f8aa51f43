use liftgraph_core::{load_catalog, load_config, MatchKind, MuscleActivationMapper, PoseSignals};
use std::fs;

#[test]
fn test_load_catalog_fra_disk() {
    let path = "tests/tmp_catalog.json";
    let json = r#"{
        "version": 1,
        "exercises": [
            { "name": "zercher squat", "aliases": ["zercher"], "category": "legs",
              "primary": { "quads": 0.45, "glutes": 0.35 }, "secondary": { "abs": 0.2 } }
        ]
    }"#;
    fs::write(path, json).expect("kunne ikke skrive katalog");

    let cat = load_catalog(path).expect("kunne ikke laste katalog");
    assert_eq!(cat.len(), 1);

    let m = MuscleActivationMapper::new(&cat, Default::default());
    let a = m.activation("Zercher", None, &PoseSignals::default());
    assert_eq!(a.match_kind, MatchKind::Exact);
    assert_eq!(a.primary_muscles.len(), 2);

    fs::remove_file(path).ok();
}

#[test]
fn test_load_catalog_med_feil_vekt() {
    let path = "tests/tmp_catalog_bad.json";
    let json = r#"{ "exercises": [ { "name": "x", "category": "push", "primary": { "chest": 1.4 } } ] }"#;
    fs::write(path, json).unwrap();

    let err = load_catalog(path).unwrap_err();
    assert!(format!("{err:#}").contains("chest"), "{err:#}");

    fs::remove_file(path).ok();
}

#[test]
fn test_load_config_mangler_gir_standard() {
    let cfg = load_config("tests/finnes_ikke.json").expect("mangler skal gi standard");
    assert_eq!(cfg.balance.window_days, 30);
    assert_eq!(cfg.pool.max_workers, 4);
}

#[test]
fn test_load_config_delvis() {
    let path = "tests/tmp_config.json";
    fs::write(path, r#"{ "balance": { "window_days": 14 }, "session": { "scale_by_reps": true } }"#).unwrap();

    let cfg = load_config(path).expect("kunne ikke laste config");
    assert_eq!(cfg.balance.window_days, 14);
    assert!(cfg.session.scale_by_reps);
    assert_eq!(cfg.reps.min_samples, 10);

    fs::remove_file(path).ok();
}
