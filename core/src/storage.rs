use std::path::Path;

use anyhow::Context;

use crate::catalog::ExerciseCatalog;
use crate::config::AnalysisConfig;

/// Leser øvelseskatalog fra disk (JSON). Ugyldig katalog er fatal for kalleren.
pub fn load_catalog(path: impl AsRef<Path>) -> anyhow::Result<ExerciseCatalog> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("kunne ikke lese katalog {}", path.display()))?;
    let catalog = ExerciseCatalog::from_json_str(&contents)
        .with_context(|| format!("ugyldig katalog {}", path.display()))?;
    log::info!("📂 Katalog lastet fra {} ({} øvelser)", path.display(), catalog.len());
    Ok(catalog)
}

/// Leser analysekonfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres standardkonfig.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<AnalysisConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("⚠️ Fant ikke config på {}, bruker standardverdier", path.display());
        return Ok(AnalysisConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("kunne ikke lese config {}", path.display()))?;
    let cfg = AnalysisConfig::from_json_str(&contents)
        .with_context(|| format!("ugyldig config {}", path.display()))?;
    log::info!("📂 Config lastet fra {}", path.display());
    Ok(cfg)
}
