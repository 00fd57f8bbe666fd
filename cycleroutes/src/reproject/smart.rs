//! Reprojection intelligente : reproject lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use geo::Geometry;

use super::ReprojectorLite;
use crate::types::Crs;
use crate::RouteError;

/// Reprojection intelligente
///
/// Essaie d'abord la reprojection légère (pure Rust), puis proj si disponible.
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(super::proj_backend::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source: Crs, target: Crs) -> Result<Self, RouteError> {
        if source == target {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source, target) {
            return Ok(Self::Lite(ReprojectorLite::new(source, target)?));
        }

        #[cfg(feature = "reproject")]
        {
            let proj = super::proj_backend::Reprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        Err(RouteError::UnsupportedReprojection {
            source_epsg: source.epsg,
            target_epsg: target.epsg,
        })
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, RouteError> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (no reprojection)",
            Self::Lite(_) => "lite (pure Rust OSGB36)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}
