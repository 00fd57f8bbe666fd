//! Chargement PostGIS : connexion, schéma, correspondance des champs, lots

pub mod connection;
pub mod loader;
pub mod mapping;
pub mod schema;
pub mod transaction;

pub use connection::{connect, test_connection};
pub use loader::{insert_batched, load_file, load_paths, BatchSink, LoadError, PgSink};
