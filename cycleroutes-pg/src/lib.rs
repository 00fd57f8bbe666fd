//! # cycleroutes-pg
//!
//! Traitement des réseaux cyclables GeoJSON et chargement dans PostGIS.
//!
//! ## Features
//!
//! - Export GeoJSON ou CSV (géométrie WKT) sans base de données
//! - Chargement par lots transactionnels via COPY
//! - Lecture pour la visualisation (autorités locales, itinéraires)
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Traitement (British National Grid → WGS84)
//! cycleroutes process --input-file ./Cycling_Network.json --format geojson
//!
//! # Chargement PostGIS
//! cycleroutes load --input-dir ./generated_data --drop-existing
//! ```

pub mod config;
pub mod db;
pub mod export;
pub mod report;
pub mod viewer;

pub use config::Config;
pub use export::{process_file, ExportError, OutputFormat};
pub use report::{FileOutcome, RunReport, RunStatus};
