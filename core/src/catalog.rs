use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::{ActivationVector, Category, Muscle};

const BUILTIN_JSON: &str = include_str!("../data/exercise_catalog.json");

static BUILTIN: OnceCell<ExerciseCatalog> = OnceCell::new();

/// Små bokstaver, trim, '-' og '_' → mellomrom, sammenslått whitespace.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ──────────────────────────────────────────────────────────────────────────────
// Rå JSON-form (muskelnavn som strenger, valideres ved lasting)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    #[allow(dead_code)]
    version: u32,
    exercises: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    category: Category,
    #[serde(default)]
    primary: BTreeMap<String, f64>,
    #[serde(default)]
    secondary: BTreeMap<String, f64>,
    #[serde(default)]
    modifiers: BTreeMap<String, BTreeMap<String, f64>>,
}

fn parse_muscles(exercise: &str, raw: BTreeMap<String, f64>) -> Result<BTreeMap<Muscle, f64>, CatalogError> {
    raw.into_iter()
        .map(|(name, v)| {
            Muscle::from_name(&name)
                .map(|m| (m, v))
                .ok_or_else(|| CatalogError::UnknownMuscle { exercise: exercise.to_string(), muscle: name })
        })
        .collect()
}

impl RawEntry {
    fn into_entry(self) -> Result<ExerciseCatalogEntry, CatalogError> {
        let primary = parse_muscles(&self.name, self.primary)?;
        let secondary = parse_muscles(&self.name, self.secondary)?;
        let mut modifiers = BTreeMap::new();
        for (key, deltas) in self.modifiers {
            modifiers.insert(key, parse_muscles(&self.name, deltas)?);
        }
        Ok(ExerciseCatalogEntry {
            name: self.name,
            aliases: self.aliases,
            category: self.category,
            primary,
            secondary,
            modifiers,
        })
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Katalog
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCatalogEntry {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: Category,
    pub primary: BTreeMap<Muscle, f64>,   // typ. 0.3–0.5
    pub secondary: BTreeMap<Muscle, f64>, // typ. 0.1–0.2
    pub modifiers: BTreeMap<String, BTreeMap<Muscle, f64>>,
}

impl ExerciseCatalogEntry {
    pub fn new(name: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            category,
            primary: BTreeMap::new(),
            secondary: BTreeMap::new(),
            modifiers: BTreeMap::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn primary(mut self, muscle: Muscle, weight: f64) -> Self {
        self.primary.insert(muscle, weight);
        self
    }

    pub fn secondary(mut self, muscle: Muscle, weight: f64) -> Self {
        self.secondary.insert(muscle, weight);
        self
    }

    pub fn modifier(mut self, key: &str, muscle: Muscle, delta: f64) -> Self {
        self.modifiers.entry(key.to_string()).or_default().insert(muscle, delta);
        self
    }

    /// Basisaktivering: primær, deretter sekundær.
    pub fn base_activation(&self) -> ActivationVector {
        self.primary.iter().chain(self.secondary.iter()).map(|(m, v)| (*m, *v)).collect()
    }

    pub fn modifier_deltas(&self, key: &str) -> Option<&BTreeMap<Muscle, f64>> {
        self.modifiers.get(key)
    }

    fn validate(&self, index: usize) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName { index });
        }
        for (m, v) in self.primary.iter().chain(self.secondary.iter()) {
            if !v.is_finite() || !(0.0..=1.0).contains(v) {
                return Err(CatalogError::InvalidWeight {
                    exercise: self.name.clone(),
                    muscle: m.to_string(),
                    value: *v,
                });
            }
        }
        for (key, deltas) in &self.modifiers {
            for (m, d) in deltas {
                if !d.is_finite() || !(-1.0..=1.0).contains(d) {
                    return Err(CatalogError::InvalidModifierDelta {
                        exercise: self.name.clone(),
                        modifier: key.clone(),
                        muscle: m.to_string(),
                        value: *d,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Lukket, uforanderlig katalog. Lastes én gang og sendes eksplisitt til mapperen.
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    entries: Vec<ExerciseCatalogEntry>,
    // normalisert alias/navn → indeks i `entries`
    alias_index: BTreeMap<String, usize>,
}

impl ExerciseCatalog {
    pub fn from_entries(entries: Vec<ExerciseCatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut alias_index: BTreeMap<String, usize> = BTreeMap::new();
        for (i, entry) in entries.iter().enumerate() {
            entry.validate(i)?;
            let keys = std::iter::once(&entry.name).chain(entry.aliases.iter()).map(|a| normalize_name(a));
            for key in keys {
                if key.is_empty() {
                    continue;
                }
                match alias_index.get(&key) {
                    Some(&j) if j != i => {
                        return Err(CatalogError::DuplicateAlias {
                            alias: key,
                            first: entries[j].name.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    Some(_) => {} // samme øvelse, f.eks. "push-up" vs "push up"
                    None => {
                        alias_index.insert(key, i);
                    }
                }
            }
        }
        Ok(Self { entries, alias_index })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let raw: RawCatalog = serde_path_to_error::deserialize(de)?;
        let entries = raw
            .exercises
            .into_iter()
            .map(RawEntry::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Innebygd katalog (data/exercise_catalog.json), parset ved første kall.
    pub fn builtin() -> Result<&'static ExerciseCatalog, CatalogError> {
        BUILTIN.get_or_try_init(|| {
            let cat = Self::from_json_str(BUILTIN_JSON)?;
            log::info!("catalog: innebygd katalog lastet ({} øvelser)", cat.len());
            Ok(cat)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ExerciseCatalogEntry] {
        &self.entries
    }

    /// Oppslag på eksakt (normalisert) navn eller alias.
    pub fn get(&self, name: &str) -> Option<&ExerciseCatalogEntry> {
        self.alias_index.get(&normalize_name(name)).map(|&i| &self.entries[i])
    }

    /// (normalisert alias, øvelse) i leksikografisk rekkefølge.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &ExerciseCatalogEntry)> + '_ {
        self.alias_index.iter().map(|(a, &i)| (a.as_str(), &self.entries[i]))
    }
}
