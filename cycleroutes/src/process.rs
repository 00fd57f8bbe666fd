//! Traitement des itinéraires : longueur, provenance, reprojection
//!
//! L'ordre des étapes est imposé : la longueur est mesurée dans le système
//! projeté d'origine, **avant** toute reprojection vers le système géographique.
//! Une longueur mesurée en degrés n'a aucun sens métrique.

use std::path::Path;

use geo::{EuclideanLength, Geometry, Polygon};
use tracing::{debug, info, warn};

use crate::reproject::SmartReprojector;
use crate::types::{Crs, ProcessedRoute, ProcessedTable, RouteTable};
use crate::RouteError;

/// Options du traitement
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    /// Système cible de la table traitée
    pub target: Crs,

    /// Facteur de conversion de l'unité linéaire source vers le mètre
    /// (1.0 pour le British National Grid)
    pub unit_to_metres: f64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            target: Crs::WGS84,
            unit_to_metres: 1.0,
        }
    }
}

/// Calcule les attributs dérivés et reprojette la table
///
/// # Errors
///
/// - [`RouteError::UnsupportedReprojection`] / [`RouteError::Reprojection`] si la
///   reprojection ne peut pas être construite ou appliquée (fatal pour le fichier)
/// - [`RouteError::NoValidResults`] si aucune feature n'est mesurable
pub fn process_routes(
    table: RouteTable,
    source_path: &Path,
    options: &ProcessOptions,
) -> Result<ProcessedTable, RouteError> {
    // Construit la transformation avant de toucher aux features
    let reprojector = SmartReprojector::new(table.crs, options.target)?;
    debug!(
        from = %table.crs,
        from_name = table.crs.name(),
        to = %options.target,
        to_name = options.target.name(),
        reprojector = reprojector.description(),
        "Reprojector ready"
    );

    if table.crs.is_geographic() {
        warn!(
            crs = %table.crs,
            "Source CRS is geographic: route lengths will not be metric"
        );
    }

    let source_file = source_file_name(source_path);
    let mut routes = Vec::with_capacity(table.len());
    let mut skipped = 0;

    for (index, feature) in table.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(index, file = %source_file, "Skipping feature without geometry");
            skipped += 1;
            continue;
        };

        let Some(length) = measure_length(&geometry) else {
            warn!(index, file = %source_file, "Skipping feature with unmeasurable geometry");
            skipped += 1;
            continue;
        };

        routes.push(ProcessedRoute {
            geometry,
            properties: feature.properties,
            route_length_m: length * options.unit_to_metres,
            source_file: source_file.clone(),
        });
    }

    if routes.is_empty() {
        return Err(RouteError::NoValidResults(source_file));
    }

    // Reprojection de la table entière : un échec invalide tout le fichier
    let routes = routes
        .into_iter()
        .map(|mut route| {
            route.geometry = reprojector.transform_geometry(&route.geometry)?;
            Ok(route)
        })
        .collect::<Result<Vec<_>, RouteError>>()?;

    info!(
        file = %source_file,
        routes = routes.len(),
        skipped,
        crs = %options.target,
        "Routes processed"
    );

    Ok(ProcessedTable {
        routes,
        crs: options.target,
        skipped,
    })
}

/// Longueur géométrique dans les unités du système courant
///
/// Lignes : longueur euclidienne ; polygones : périmètre ; points : 0.
/// Retourne `None` si le résultat n'est pas fini.
pub fn measure_length(geom: &Geometry) -> Option<f64> {
    let length = match geom {
        Geometry::Point(_) | Geometry::MultiPoint(_) => 0.0,
        Geometry::Line(line) => line.euclidean_length(),
        Geometry::LineString(ls) => ls.euclidean_length(),
        Geometry::MultiLineString(mls) => mls.euclidean_length(),
        Geometry::Polygon(poly) => perimeter(poly),
        Geometry::MultiPolygon(mp) => mp.iter().map(perimeter).sum(),
        Geometry::Rect(rect) => perimeter(&rect.to_polygon()),
        Geometry::Triangle(tri) => perimeter(&tri.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            let mut total = 0.0;
            for member in gc.iter() {
                total += measure_length(member)?;
            }
            total
        }
    };

    length.is_finite().then_some(length)
}

fn perimeter(poly: &Polygon) -> f64 {
    poly.exterior().euclidean_length()
        + poly
            .interiors()
            .iter()
            .map(|ring| ring.euclidean_length())
            .sum::<f64>()
}

/// Nom de base du fichier source
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
