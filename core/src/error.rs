use thiserror::Error;

/// Feil i øvelseskatalogen. Fatal ved oppstart, aldri under analyse.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("katalog-JSON ugyldig ved {path}: {message}")]
    Parse { path: String, message: String },

    #[error("øvelse #{index} mangler navn")]
    EmptyName { index: usize },

    #[error("{exercise}: ukjent muskel '{muscle}'")]
    UnknownMuscle { exercise: String, muscle: String },

    #[error("{exercise}: vekt for {muscle} utenfor [0,1]: {value}")]
    InvalidWeight { exercise: String, muscle: String, value: f64 },

    #[error("{exercise}: modifier '{modifier}' har delta utenfor [-1,1] for {muscle}: {value}")]
    InvalidModifierDelta {
        exercise: String,
        modifier: String,
        muscle: String,
        value: f64,
    },

    #[error("alias '{alias}' brukes av både '{first}' og '{second}'")]
    DuplicateAlias { alias: String, first: String, second: String },

    #[error("katalogen er tom")]
    Empty,
}

impl<E: std::fmt::Display> From<serde_path_to_error::Error<E>> for CatalogError {
    fn from(e: serde_path_to_error::Error<E>) -> Self {
        CatalogError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    }
}

/// Ugyldige terskler i `AnalysisConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config-JSON ugyldig ved {path}: {message}")]
    Parse { path: String, message: String },

    #[error("config validation error: {0}")]
    Validation(String),
}

impl<E: std::fmt::Display> From<serde_path_to_error::Error<E>> for ConfigError {
    fn from(e: serde_path_to_error::Error<E>) -> Self {
        ConfigError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    }
}
