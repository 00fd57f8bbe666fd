//! Types d'erreurs pour le crate cycleroutes

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'import ou du traitement des itinéraires
#[derive(Debug, Error)]
pub enum RouteError {
    /// Erreur d'I/O lors de la lecture du fichier source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document JSON illisible
    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Structure de premier niveau inattendue (ni collection, ni feature, ni liste)
    #[error("Unexpected top-level shape in {path}: {found}")]
    UnexpectedShape { path: PathBuf, found: String },

    /// Aucune feature dans le document
    #[error("No features found in {0}")]
    NoFeatures(PathBuf),

    /// Géométrie GeoJSON non convertible
    #[error("Invalid geometry for feature {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// Aucune feature n'a survécu au traitement
    #[error("No valid results extracted from {0}")]
    NoValidResults(String),

    /// Échec de construction ou d'application d'une reprojection
    #[error("Reprojection EPSG:{source_epsg} -> EPSG:{target_epsg} failed: {reason}")]
    Reprojection {
        source_epsg: u32,
        target_epsg: u32,
        reason: String,
    },

    /// Couple de projections non supporté par les implémentations disponibles
    #[error("Unsupported reprojection EPSG:{source_epsg} -> EPSG:{target_epsg}")]
    UnsupportedReprojection { source_epsg: u32, target_epsg: u32 },
}

impl RouteError {
    /// Crée une erreur de reprojection avec contexte
    pub fn reprojection(source_epsg: u32, target_epsg: u32, reason: impl Into<String>) -> Self {
        Self::Reprojection {
            source_epsg,
            target_epsg,
            reason: reason.into(),
        }
    }

    /// Vrai si l'erreur signifie "pas de données" plutôt qu'un échec de parsing
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            Self::NoFeatures(_) | Self::UnexpectedShape { .. } | Self::NoValidResults(_)
        )
    }
}
