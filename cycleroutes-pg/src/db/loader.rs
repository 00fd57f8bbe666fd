//! Chargement des fichiers traités dans la table des itinéraires
//!
//! Insertion en ajout seul : charger deux fois le même fichier produit deux
//! jeux de lignes indépendants.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio_postgres::Client;
use tracing::{info, warn};

use cycleroutes::process::source_file_name;
use cycleroutes::{import_processed, Crs, RouteTable, SmartReprojector};

use super::mapping::{copy_columns, RouteRow};
use super::schema::qualified;
use super::transaction::BatchTransaction;
use crate::report::{FileOutcome, RunReport};

/// Taille de lot par défaut
pub const DEFAULT_BATCH_SIZE: usize = 64_000;

/// Échec d'un lot ; les lots précédents restent validés
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("batch {batch} failed ({committed} rows already committed): {source}")]
    BatchFailed {
        /// Numéro du lot en échec (à partir de 1)
        batch: usize,
        /// Lignes validées par les lots précédents
        committed: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    /// Lignes validées avant l'échec
    pub fn committed(&self) -> u64 {
        match self {
            Self::BatchFailed { committed, .. } => *committed,
        }
    }
}

/// Destination d'écriture par lots
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    /// Écrit un lot de façon atomique ; retourne le nombre de lignes écrites
    async fn write_batch(&mut self, batch: usize, rows: &[RouteRow]) -> Result<u64>;
}

/// Écriture par COPY dans PostgreSQL, une transaction par lot
pub struct PgSink<'a> {
    client: &'a mut Client,
    copy_sql: String,
}

impl<'a> PgSink<'a> {
    pub fn new(client: &'a mut Client, schema: &str, table: &str) -> Self {
        let copy_sql = format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, DELIMITER '|', QUOTE '\"', ESCAPE '\"', NULL '')",
            qualified(schema, table),
            copy_columns()
        );
        Self { client, copy_sql }
    }
}

impl BatchSink for PgSink<'_> {
    async fn write_batch(&mut self, batch: usize, rows: &[RouteRow]) -> Result<u64> {
        let mut tx = BatchTransaction::begin(&mut *self.client, batch).await?;
        match tx.copy_rows(&self.copy_sql, rows).await {
            Ok(()) => tx.commit().await,
            Err(e) => {
                tx.rollback(&e.to_string()).await;
                Err(e)
            }
        }
    }
}

/// Insère les lignes par lots de `batch_size`
pub async fn insert_batched<S: BatchSink>(
    sink: &mut S,
    rows: &[RouteRow],
    batch_size: usize,
) -> Result<u64, LoadError> {
    let batch_size = batch_size.max(1);
    let total_batches = rows.len().div_ceil(batch_size);
    let mut committed = 0;

    for (index, chunk) in rows.chunks(batch_size).enumerate() {
        let batch = index + 1;
        match sink.write_batch(batch, chunk).await {
            Ok(written) => {
                committed += written;
                info!(batch, total_batches, rows = written, "Batch inserted");
            }
            Err(e) => {
                return Err(LoadError::BatchFailed {
                    batch,
                    committed,
                    source: e.into(),
                })
            }
        }
    }

    Ok(committed)
}

/// Lignes prêtes à insérer pour un fichier
#[derive(Debug)]
pub struct PreparedFile {
    pub rows: Vec<RouteRow>,

    /// Features écartées (géométrie absente ou non encodable)
    pub skipped: usize,
}

/// Lit un fichier traité et le convertit en lignes EPSG:4326
///
/// Un fichier déclaré dans un autre système est reprojeté au préalable.
pub fn prepare_file(table: RouteTable) -> Result<PreparedFile> {
    let reprojector = if table.crs == Crs::WGS84 {
        None
    } else {
        info!(crs = %table.crs, "Converting to WGS84 (EPSG:4326)");
        Some(SmartReprojector::new(table.crs, Crs::WGS84)?)
    };

    let mut rows = Vec::with_capacity(table.len());
    let mut skipped = 0;

    for (index, feature) in table.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(index, "Skipping feature without geometry");
            skipped += 1;
            continue;
        };

        let geometry = match &reprojector {
            Some(r) => r.transform_geometry(&geometry)?,
            None => geometry,
        };

        match RouteRow::new(&feature.properties, &geometry) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(index, error = %e, "Skipping feature with unencodable geometry");
                skipped += 1;
            }
        }
    }

    Ok(PreparedFile { rows, skipped })
}

/// Charge un fichier traité
pub async fn load_file<S: BatchSink>(sink: &mut S, path: &Path, batch_size: usize) -> FileOutcome {
    let file = source_file_name(path);

    let table = match import_processed(path) {
        Ok(table) => table,
        Err(e) if e.is_no_data() => {
            warn!(file = %file, reason = %e, "No data found");
            return FileOutcome::Empty { file };
        }
        Err(e) => {
            return FileOutcome::Failed {
                file,
                error: e.to_string(),
                committed: 0,
            }
        }
    };

    let prepared = match prepare_file(table) {
        Ok(prepared) => prepared,
        Err(e) => {
            return FileOutcome::Failed {
                file,
                error: format!("{:#}", e),
                committed: 0,
            }
        }
    };

    if prepared.rows.is_empty() {
        warn!(file = %file, "No rows with geometry");
        return FileOutcome::Empty { file };
    }

    match insert_batched(sink, &prepared.rows, batch_size).await {
        Ok(rows) => FileOutcome::Loaded {
            file,
            rows,
            skipped: prepared.skipped,
        },
        Err(e) => FileOutcome::Failed {
            file,
            committed: e.committed(),
            error: e.to_string(),
        },
    }
}

/// Charge une liste de fichiers dans l'ordre ; un échec n'interrompt pas la suite
pub async fn load_paths<S: BatchSink>(
    sink: &mut S,
    paths: &[PathBuf],
    batch_size: usize,
    report: &mut RunReport,
) {
    let total = paths.len();
    for (i, path) in paths.iter().enumerate() {
        info!(
            file = %path.display(),
            "Processing file {}/{}",
            i + 1,
            total
        );

        let outcome = load_file(sink, path, batch_size).await;
        match &outcome {
            FileOutcome::Loaded { file, rows, .. } => {
                info!(file = %file, rows, "Successfully inserted records")
            }
            FileOutcome::Empty { file } => info!(file = %file, "Nothing to insert"),
            FileOutcome::Failed { file, error, .. } => {
                warn!(file = %file, error = %error, "Error processing file")
            }
        }
        report.record(outcome);
    }
}

/// Liste les fichiers d'un répertoire correspondant au motif
pub fn collect_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Input directory not found: {}", dir.display());
    }

    let full = dir.join(pattern);
    let full = full
        .to_str()
        .with_context(|| format!("Non UTF-8 path: {}", full.display()))?;

    let mut files = Vec::new();
    for entry in glob::glob(full).with_context(|| format!("Invalid pattern: {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Unreadable directory entry"),
        }
    }
    Ok(files)
}
