//! Import de documents GeoJSON d'itinéraires cyclables
//!
//! Trois formes de document sont acceptées :
//! - `FeatureCollection` (liste `features`)
//! - `Feature` isolée
//! - liste nue d'objets de type feature
//!
//! La table produite est toujours étiquetée avec le système de coordonnées
//! déclaré par l'appelant, quel que soit le membre `crs` du fichier.

use std::path::Path;

use geo::Geometry;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::{Crs, Properties, RouteFeature, RouteTable};
use crate::RouteError;

/// Importe un fichier JSON d'itinéraires dans le système `declared`
pub fn import_routes(path: &Path, declared: Crs) -> Result<RouteTable, RouteError> {
    info!(path = %path.display(), crs = %declared, "Importing file");
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    import_value(value, path, declared)
}

/// Importe un document déjà chargé en mémoire
pub fn import_str(json: &str, origin: &Path, declared: Crs) -> Result<RouteTable, RouteError> {
    let value: Value = serde_json::from_str(json)?;
    import_value(value, origin, declared)
}

/// Importe une valeur JSON (`origin` sert uniquement aux messages d'erreur)
pub fn import_value(value: Value, origin: &Path, declared: Crs) -> Result<RouteTable, RouteError> {
    let raw_features = collect_features(value, origin)?;
    if raw_features.is_empty() {
        return Err(RouteError::NoFeatures(origin.to_path_buf()));
    }

    let features = raw_features
        .into_iter()
        .enumerate()
        .map(|(index, raw)| parse_feature(index, raw, origin))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = features.len(), path = %origin.display(), "Features imported");

    Ok(RouteTable {
        features,
        crs: declared,
    })
}

/// Importe un fichier déjà traité en respectant son membre `crs`
///
/// Sans membre `crs`, le document est supposé en WGS84 (convention GeoJSON).
pub fn import_processed(path: &Path) -> Result<RouteTable, RouteError> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let crs = declared_crs(&value).unwrap_or(Crs::WGS84);
    info!(path = %path.display(), crs = %crs, "Reading processed file");
    import_value(value, path, crs)
}

/// Lit le membre `crs` (nommé) d'un document GeoJSON
pub fn declared_crs(value: &Value) -> Option<Crs> {
    let name = value
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    parse_crs_name(name)
}

/// Interprète un nom de CRS (`urn:ogc:def:crs:EPSG::27700`, `EPSG:4326`, `CRS84`)
pub fn parse_crs_name(name: &str) -> Option<Crs> {
    if name.ends_with("CRS84") {
        return Some(Crs::WGS84);
    }
    if !name.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    name.rsplit(':')
        .next()
        .and_then(|code| code.trim().parse::<u32>().ok())
        .map(Crs::new)
}

/// Ramène les trois formes acceptées à une liste de features brutes
fn collect_features(value: Value, origin: &Path) -> Result<Vec<Value>, RouteError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            let kind = obj.get("type").and_then(Value::as_str).map(str::to_owned);
            match kind.as_deref() {
                Some("FeatureCollection") => match obj.remove("features") {
                    Some(Value::Array(items)) => Ok(items),
                    Some(Value::Null) | None => Ok(Vec::new()),
                    Some(other) => Err(unexpected(origin, &other, "features")),
                },
                Some("Feature") => Ok(vec![Value::Object(obj)]),
                Some(other) => Err(RouteError::UnexpectedShape {
                    path: origin.to_path_buf(),
                    found: format!("object of type {:?}", other),
                }),
                None => Err(RouteError::UnexpectedShape {
                    path: origin.to_path_buf(),
                    found: "object without type".into(),
                }),
            }
        }
        other => Err(unexpected(origin, &other, "document")),
    }
}

fn parse_feature(index: usize, raw: Value, origin: &Path) -> Result<RouteFeature, RouteError> {
    let mut obj = match raw {
        Value::Object(obj) => obj,
        other => return Err(unexpected(origin, &other, &format!("feature {}", index))),
    };

    let properties = match obj.remove("properties") {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => Properties::new(),
        Some(other) => {
            return Err(unexpected(
                origin,
                &other,
                &format!("properties of feature {}", index),
            ))
        }
    };

    // Géométrie illisible : feature conservée sans géométrie
    let geometry = match parse_geometry(index, obj.remove("geometry")) {
        Ok(geometry) => geometry,
        Err(e) => {
            warn!(path = %origin.display(), "{}", e);
            None
        }
    };

    Ok(RouteFeature {
        geometry,
        properties,
    })
}

fn parse_geometry(index: usize, raw: Option<Value>) -> Result<Option<Geometry>, RouteError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };

    let geojson_geom = geojson::Geometry::from_json_value(raw).map_err(|e| {
        RouteError::InvalidGeometry {
            index,
            reason: e.to_string(),
        }
    })?;

    let geometry = Geometry::<f64>::try_from(geojson_geom).map_err(|e| {
        RouteError::InvalidGeometry {
            index,
            reason: e.to_string(),
        }
    })?;

    Ok(Some(geometry))
}

fn unexpected(origin: &Path, value: &Value, what: &str) -> RouteError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    RouteError::UnexpectedShape {
        path: origin.to_path_buf(),
        found: format!("{} is a {}", what, found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString};

    fn origin() -> &'static Path {
        Path::new("test.json")
    }

    const LINE: &str =
        r#"{"type":"LineString","coordinates":[[300000,700000],[300100,700100]]}"#;

    #[test]
    fn test_feature_collection() {
        let json = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"street":"Main St","type":"Cycle Lane"}},"geometry":{}}},
                {{"type":"Feature","properties":{{"street":"High St"}},"geometry":{}}}
            ]}}"#,
            LINE, LINE
        );

        let table = import_str(&json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.crs, Crs::BRITISH_NATIONAL_GRID);
        assert_eq!(table.features[0].properties["street"], "Main St");
        assert_eq!(table.features[1].properties["street"], "High St");

        match &table.features[0].geometry {
            Some(Geometry::LineString(ls)) => {
                assert_eq!(
                    ls,
                    &LineString::from(vec![(300000.0, 700000.0), (300100.0, 700100.0)])
                );
            }
            other => panic!("Expected LineString, got {:?}", other),
        }
    }

    #[test]
    fn test_single_feature() {
        let json = format!(
            r#"{{"type":"Feature","properties":{{"route_id":"R1"}},"geometry":{}}}"#,
            LINE
        );
        let table = import_str(&json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.features[0].properties["route_id"], "R1");
    }

    #[test]
    fn test_bare_list() {
        let json = format!(
            r#"[{{"properties":{{"a":1}},"geometry":{}}},{{"properties":null,"geometry":null}}]"#,
            LINE
        );
        let table = import_str(&json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.features[0].geometry.is_some());
        assert!(table.features[1].geometry.is_none());
        assert!(table.features[1].properties.is_empty());
    }

    #[test]
    fn test_declared_crs_ignores_file_hint() {
        let json = format!(
            r#"{{"type":"FeatureCollection",
                "crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::4326"}}}},
                "features":[{{"type":"Feature","properties":{{}},"geometry":{}}}]}}"#,
            LINE
        );
        let table = import_str(&json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(table.crs, Crs::BRITISH_NATIONAL_GRID);
    }

    #[test]
    fn test_empty_collection_is_no_data() {
        let err = import_str(
            r#"{"type":"FeatureCollection","features":[]}"#,
            origin(),
            Crs::BRITISH_NATIONAL_GRID,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::NoFeatures(_)));
        assert!(err.is_no_data());

        let err = import_str("[]", origin(), Crs::BRITISH_NATIONAL_GRID).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_unexpected_shape_is_no_data() {
        for json in [r#"{"type":"Polygon","coordinates":[]}"#, "42", r#"{"foo":1}"#] {
            let err = import_str(json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap_err();
            assert!(
                matches!(err, RouteError::UnexpectedShape { .. }),
                "{} -> {:?}",
                json,
                err
            );
            assert!(err.is_no_data());
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = import_str("{\"type\":", origin(), Crs::BRITISH_NATIONAL_GRID).unwrap_err();
        assert!(matches!(err, RouteError::Json(_)));
        assert!(!err.is_no_data());
    }

    #[test]
    fn test_invalid_geometry_kept_as_none() {
        let json = r#"{"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":"oops"}}"#;
        let table = import_str(json, origin(), Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.features[0].geometry.is_none());
    }

    #[test]
    fn test_parse_crs_name() {
        assert_eq!(
            parse_crs_name("urn:ogc:def:crs:EPSG::27700"),
            Some(Crs::BRITISH_NATIONAL_GRID)
        );
        assert_eq!(parse_crs_name("EPSG:4326"), Some(Crs::WGS84));
        assert_eq!(
            parse_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(Crs::WGS84)
        );
        assert_eq!(parse_crs_name("something else"), None);
    }

    #[test]
    fn test_import_processed_defaults_to_wgs84() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[-3.6,56.2]}}]}"#,
        )
        .unwrap();
        let table = import_processed(&path).unwrap();
        assert_eq!(table.crs, Crs::WGS84);

        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","crs":{"type":"name","properties":{"name":"EPSG:27700"}},"features":[{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[300000,700000]}}]}"#,
        )
        .unwrap();
        let table = import_processed(&path).unwrap();
        assert_eq!(table.crs, Crs::BRITISH_NATIONAL_GRID);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = import_routes(Path::new("/nonexistent/routes.json"), Crs::default()).unwrap_err();
        assert!(matches!(err, RouteError::Io(_)));
    }
}
