//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostgreSQL/PostGIS disponible.
//! Configuration via variables d'environnement:
//! - DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME
//!
//! Exécution:
//! ```bash
//! # Avec Docker
//! docker run -d --name postgis-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgis/postgis
//! DB_PASSWORD=test cargo test --test postgres_integration -- --ignored
//! ```

use std::path::{Path, PathBuf};

use tokio_postgres::Client;

use cycleroutes_pg::config::Config;
use cycleroutes_pg::db::{self, schema, PgSink};
use cycleroutes_pg::report::{FileOutcome, RunReport, RunStatus};
use cycleroutes_pg::viewer;

const TEST_SCHEMA: &str = "cycleroutes_test";

const PROCESSED: &str = r#"{
  "type": "FeatureCollection",
  "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4326" } },
  "features": [
    {
      "type": "Feature",
      "geometry": { "type": "LineString", "coordinates": [[-3.6126, 56.1821], [-3.6110, 56.1830]] },
      "properties": { "route_id": "R1", "type": "Cycle Path", "local_authority": "Fife",
                      "route_length_m": 141.42, "source_file": "network.json" }
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": { "route_id": "R2", "local_authority": "Fife" }
    },
    {
      "type": "Feature",
      "geometry": { "type": "MultiLineString", "coordinates": [[[-3.19, 55.95], [-3.18, 55.96]]] },
      "properties": { "route_id": "R3", "route_type": "Quiet Road", "local_authority": "City of Edinburgh",
                      "sh_src_id": "12", "route_length_m": 1000.0, "source_file": "network.json" }
    }
  ]
}"#;

/// Configuration de test (défauts locaux)
fn test_config(table: &str) -> Config {
    let mut config = Config::from_lookup(|key| {
        std::env::var(key).ok().or_else(|| match key {
            "DB_HOST" => Some("localhost".into()),
            "DB_NAME" => Some("postgres".into()),
            "DB_USER" => Some("postgres".into()),
            _ => None,
        })
    });
    config.schema = TEST_SCHEMA.into();
    config.table = table.into();
    config
}

/// Connexion et table vierge
async fn setup(table: &str) -> (Client, Config) {
    let config = test_config(table);
    let client = db::connect(&config.database)
        .await
        .expect("Failed to connect");
    schema::bootstrap_schema(&client, &config.schema)
        .await
        .expect("Failed to bootstrap");
    schema::reset_schema(&client, &config.schema, &config.table)
        .await
        .expect("Failed to reset");
    schema::ensure_schema(&client, &config.schema, &config.table)
        .await
        .expect("Failed to create table");
    (client, config)
}

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("network_20240101_120000.geojson");
    std::fs::write(&path, PROCESSED).unwrap();
    path
}

async fn count(client: &Client, config: &Config) -> i64 {
    client
        .query_one(
            format!(
                "SELECT COUNT(*) FROM {}",
                schema::qualified(&config.schema, &config.table)
            )
            .as_str(),
            &[],
        )
        .await
        .expect("Count failed")
        .get(0)
}

/// Test de connexion basique
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_database_connection() {
    let config = test_config("unused");
    let client = db::connect(&config.database)
        .await
        .expect("Failed to connect");
    db::test_connection(&client).await.expect("Query failed");
}

/// La création de table est idempotente
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_ensure_schema_idempotent() {
    let (client, config) = setup("routes_idempotent").await;
    schema::ensure_schema(&client, &config.schema, &config.table)
        .await
        .expect("Second ensure failed");

    let columns: Vec<String> = client
        .query(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2",
            &[&config.schema, &config.table],
        )
        .await
        .expect("Failed to query columns")
        .iter()
        .map(|r| r.get(0))
        .collect();

    for expected in ["id", "route_id", "route_type", "route_length_m", "geometry", "updated_at"] {
        assert!(columns.iter().any(|c| c == expected), "missing {}", expected);
    }
}

/// Charger deux fois le même fichier produit des clés distinctes
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_load_twice_appends() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let (mut client, config) = setup("routes_append").await;

    let mut report = RunReport::new("load");
    {
        let mut sink = PgSink::new(&mut client, &config.schema, &config.table);
        db::load_paths(&mut sink, &[file.clone(), file], 1, &mut report).await;
    }
    report.finalize();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records_inserted(), 4);
    assert!(matches!(
        report.files[0],
        FileOutcome::Loaded { rows: 2, skipped: 1, .. }
    ));
    assert_eq!(count(&client, &config).await, 4);

    let ids: Vec<i32> = client
        .query(
            format!(
                "SELECT DISTINCT id FROM {}",
                schema::qualified(&config.schema, &config.table)
            )
            .as_str(),
            &[],
        )
        .await
        .expect("Query failed")
        .iter()
        .map(|r| r.get(0))
        .collect();
    assert_eq!(ids.len(), 4);

    let srid: i32 = client
        .query_one(
            format!(
                "SELECT DISTINCT ST_SRID(geometry) FROM {}",
                schema::qualified(&config.schema, &config.table)
            )
            .as_str(),
            &[],
        )
        .await
        .expect("Query failed")
        .get(0);
    assert_eq!(srid, 4326);
}

/// Renommage `type` → `route_type` et lecture par la visualisation
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_viewer_queries() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let (mut client, config) = setup("routes_viewer").await;

    {
        let mut sink = PgSink::new(&mut client, &config.schema, &config.table);
        let outcome = db::load_file(&mut sink, &file, 64_000).await;
        assert_eq!(outcome.rows_in_store(), 2);
    }

    let authorities = viewer::local_authorities(&client, &config.schema, &config.table)
        .await
        .expect("Failed to list authorities");
    assert_eq!(authorities, vec!["City of Edinburgh", "Fife"]);

    let routes = viewer::fetch_routes(&client, &config.schema, &config.table, Some("Fife"), 10)
        .await
        .expect("Failed to fetch routes");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].route_type.as_deref(), Some("Cycle Path"));
    assert!(routes[0]
        .geometry_wkt
        .as_deref()
        .is_some_and(|wkt| wkt.starts_with("LINESTRING")));

    let limited = viewer::fetch_routes(&client, &config.schema, &config.table, None, 1)
        .await
        .expect("Failed to fetch routes");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].route_id.as_deref(), Some("R1"));
}

/// Le trigger met à jour `updated_at`
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_updated_at_trigger() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let (mut client, config) = setup("routes_trigger").await;

    {
        let mut sink = PgSink::new(&mut client, &config.schema, &config.table);
        db::load_file(&mut sink, &file, 64_000).await;
    }

    let table = schema::qualified(&config.schema, &config.table);
    client
        .batch_execute(&format!(
            "UPDATE {table} SET created_at = NOW() - INTERVAL '1 day', \
             updated_at = NOW() - INTERVAL '1 day'; \
             UPDATE {table} SET notes = 'resurfaced' WHERE route_id = 'R1';"
        ))
        .await
        .expect("Update failed");

    let row = client
        .query_one(
            format!("SELECT updated_at > created_at FROM {table} WHERE route_id = 'R1'").as_str(),
            &[],
        )
        .await
        .expect("Query failed");
    let refreshed: bool = row.get(0);
    assert!(refreshed);
}
