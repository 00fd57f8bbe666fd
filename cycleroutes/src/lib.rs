//! # cycleroutes
//!
//! Import et traitement d'itinéraires cyclables publiés en GeoJSON dans le
//! British National Grid (EPSG:27700).
//!
//! ## Features
//!
//! - Import tolérant : `FeatureCollection`, `Feature` isolée ou liste nue
//! - Longueur des itinéraires calculée dans le système projeté, avant reprojection
//! - Reprojection pure Rust OSGB36 → WGS84, PROJ en option (feature `reproject`)
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cycleroutes::{process, Crs, ProcessOptions};
//! use std::path::Path;
//!
//! let table = process(
//!     Path::new("cycling_network.json"),
//!     Crs::BRITISH_NATIONAL_GRID,
//!     &ProcessOptions::default(),
//! )?;
//! for route in &table.routes {
//!     println!("{}: {:.1} m", route.source_file, route.route_length_m);
//! }
//! ```

pub mod error;
pub mod grid_ref;
pub mod import;
pub mod process;
pub mod reproject;
pub mod types;

pub use error::RouteError;
pub use import::{import_processed, import_routes};
pub use process::{process_routes, ProcessOptions};
pub use reproject::SmartReprojector;
pub use types::{Crs, ProcessedRoute, ProcessedTable, Properties, RouteFeature, RouteTable};

use std::path::Path;

/// Importe puis traite un fichier d'itinéraires.
///
/// # Arguments
///
/// * `path` - Fichier JSON source
/// * `source` - Système de coordonnées déclaré des géométries du fichier
/// * `options` - Système cible et unité linéaire
///
/// # Errors
///
/// Propage les erreurs d'import (JSON invalide, document vide ou de forme
/// inattendue) et de traitement (aucun résultat valide, reprojection).
pub fn process(
    path: &Path,
    source: Crs,
    options: &ProcessOptions,
) -> Result<ProcessedTable, RouteError> {
    let table = import_routes(path, source)?;
    process_routes(table, path, options)
}
