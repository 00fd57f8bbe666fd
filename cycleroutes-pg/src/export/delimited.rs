//! Export CSV : attributs, champs dérivés et géométrie en WKT

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::Value;

use cycleroutes::ProcessedTable;

use super::wkt::to_wkt;

/// Colonnes dérivées, toujours en fin de ligne
const DERIVED_COLUMNS: [&str; 3] = ["route_length_m", "source_file", "geometry_wkt"];

/// Colonnes d'attributs, dans l'ordre de première apparition
pub fn attribute_columns(table: &ProcessedTable) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for route in &table.routes {
        for key in route.properties.keys() {
            if DERIVED_COLUMNS.contains(&key.as_str()) || columns.contains(key) {
                continue;
            }
            columns.push(key.clone());
        }
    }
    columns
}

/// Écrit la table en CSV
pub fn write_csv<W: Write>(writer: W, table: &ProcessedTable) -> Result<()> {
    let attributes = attribute_columns(table);
    let mut csv = csv::Writer::from_writer(writer);

    let header = attributes
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS.iter().copied());
    csv.write_record(header)?;

    for (index, route) in table.routes.iter().enumerate() {
        let wkt = to_wkt(&route.geometry)
            .with_context(|| format!("Failed to encode geometry of route {}", index))?;

        let mut record: Vec<String> = attributes
            .iter()
            .map(|key| cell(route.properties.get(key)))
            .collect();
        record.push(route.route_length_m.to_string());
        record.push(route.source_file.clone());
        record.push(wkt);

        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycleroutes::{Crs, ProcessedRoute, Properties};
    use geo::{line_string, Geometry};
    use serde_json::json;

    fn route(props: Value, length: f64) -> ProcessedRoute {
        let properties: Properties = match props {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        };
        ProcessedRoute {
            geometry: Geometry::LineString(line_string![(x: -3.6, y: 56.2), (x: -3.5, y: 56.3)]),
            properties,
            route_length_m: length,
            source_file: "routes.json".into(),
        }
    }

    fn table() -> ProcessedTable {
        ProcessedTable {
            routes: vec![
                route(json!({"route_id": "R1", "street": "Main St, North"}), 141.42),
                route(json!({"route_id": "R2", "surface": "tarmac", "sh_src_id": 7}), 50.0),
            ],
            crs: Crs::WGS84,
            skipped: 0,
        }
    }

    #[test]
    fn test_attribute_columns_first_seen_order() {
        assert_eq!(
            attribute_columns(&table()),
            vec!["route_id", "street", "surface", "sh_src_id"]
        );
    }

    #[test]
    fn test_write_csv() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &table()).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "route_id",
                "street",
                "surface",
                "sh_src_id",
                "route_length_m",
                "source_file",
                "geometry_wkt"
            ]
        );

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Main St, North");
        assert_eq!(&records[0][2], "");
        assert_eq!(&records[0][4], "141.42");
        assert_eq!(&records[1][3], "7");
        assert_eq!(&records[1][5], "routes.json");
        assert!(records[1][6].starts_with("LINESTRING"));
        assert!(!headers.iter().any(|h| h == "geometry"));
    }
}
