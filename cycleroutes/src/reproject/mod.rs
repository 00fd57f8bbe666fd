//! Normalisation des systèmes de coordonnées
//!
//! Reprojection légère en Rust pur pour le British National Grid :
//! - Source : EPSG:27700 (OSGB36 / British National Grid)
//! - Cible : EPSG:4326 (WGS84)
//!
//! Les autres couples passent par PROJ avec la feature `reproject`
//! (voir [`SmartReprojector`]).

mod ellipsoid;
mod osgb;
#[cfg(feature = "reproject")]
mod proj_backend;
mod smart;

pub use smart::SmartReprojector;

use geo::{Coord, Geometry, MapCoords};

use crate::types::Crs;
use crate::RouteError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés (lon, lat)
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }
}

/// Reprojection légère British National Grid → WGS84
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Crs,
    target: Crs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source: Crs, target: Crs) -> Result<Self, RouteError> {
        if !Self::is_supported(source, target) {
            return Err(RouteError::UnsupportedReprojection {
                source_epsg: source.epsg,
                target_epsg: target.epsg,
            });
        }
        Ok(Self { source, target })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: Crs, target: Crs) -> bool {
        source == Crs::BRITISH_NATIONAL_GRID && target == Crs::WGS84
    }

    /// Transforme un point (easting, northing) en (lon, lat) degrés
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), RouteError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(RouteError::reprojection(
                self.source.epsg,
                self.target.epsg,
                format!("non-finite coordinate ({}, {})", x, y),
            ));
        }
        let osgb36 = osgb::grid_to_osgb36(x, y);
        Ok(osgb::osgb36_to_wgs84(osgb36).to_degrees())
    }

    /// Transforme une géométrie (tous types, collections comprises)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, RouteError> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}
