//! Définition et implémentation des commandes CLI
//!
//! - `process` : fichier brut → GeoJSON/CSV traité (sans DB)
//! - `load` : fichiers traités → PostGIS
//! - `routes` : consultation de la table chargée
//! - `grid-ref` : référence OS National Grid

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::{error, info, warn};

use cycleroutes::grid_ref::{os_grid_reference, GridPrecision};
use cycleroutes::{Crs, ProcessOptions};
use cycleroutes_pg::config::{Config, ConnectionOverrides};
use cycleroutes_pg::db::loader::{collect_inputs, DEFAULT_BATCH_SIZE};
use cycleroutes_pg::db::{self, schema, PgSink};
use cycleroutes_pg::export::{self, OutputFormat};
use cycleroutes_pg::report::{RunReport, RunStatus};
use cycleroutes_pg::viewer;

/// Répertoire des données générées par défaut
const DEFAULT_DATA_DIR: &str = "generated_data";

#[derive(Subcommand)]
pub enum Commands {
    /// Compute route lengths, reproject to WGS84 and save GeoJSON or CSV
    Process {
        /// JSON file containing cycling routes
        #[arg(short, long)]
        input_file: PathBuf,

        /// Directory to save processed data
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        output_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Geojson)]
        format: OutputFormat,

        /// EPSG code of the input coordinates
        #[arg(long, default_value_t = 27700)]
        source_epsg: u32,

        /// Factor converting source length units to metres
        #[arg(long, default_value_t = 1.0)]
        unit_to_metres: f64,
    },

    /// Load processed GeoJSON files into PostGIS
    Load {
        /// Processed GeoJSON file to load
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Directory containing processed GeoJSON files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// File pattern to match when using --input-dir
        #[arg(long, default_value = "*.geojson")]
        pattern: String,

        /// Number of records inserted per transaction
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Drop the routes table before loading
        #[arg(long)]
        drop_existing: bool,

        /// Create the schema and the PostGIS extension if missing
        #[arg(long)]
        bootstrap: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// List loaded routes
    Routes {
        /// Only routes of this local authority
        #[arg(long)]
        local_authority: Option<String>,

        /// Maximum number of routes
        #[arg(long, default_value_t = viewer::DEFAULT_LIMIT)]
        limit: i64,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Format an OS National Grid reference
    GridRef {
        /// Easting in metres (EPSG:27700)
        #[arg(long)]
        easting: f64,

        /// Northing in metres (EPSG:27700)
        #[arg(long)]
        northing: f64,

        /// Number of digits: 6, 8 or 10
        #[arg(long, default_value_t = 10, value_parser = parse_precision)]
        precision: u8,
    },
}

/// Surcharges de connexion (défaut : variables d'environnement)
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// PostgreSQL host (défaut : env DB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL port (défaut : env DB_PORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// PostgreSQL database name (défaut : env DB_NAME)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env DB_USER)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env DB_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// SSL mode: disable, prefer, require (défaut : env DB_SSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,

    /// Target schema (défaut : env DB_SCHEMA / public)
    #[arg(long)]
    pub schema: Option<String>,

    /// Routes table (défaut : env ROUTES_TABLE_NAME / cycling_routes)
    #[arg(long)]
    pub table: Option<String>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            database: args.database,
            user: args.user,
            password: args.password,
            ssl: args.ssl,
            schema: args.schema,
            table: args.table,
        }
    }
}

fn parse_precision(raw: &str) -> Result<u8, String> {
    let digits: u8 = raw.parse().map_err(|_| format!("not a number: {}", raw))?;
    GridPrecision::try_from(digits).map_err(|e| e.to_string())?;
    Ok(digits)
}

fn resolve_config(connection: ConnectionArgs) -> Config {
    let mut config = Config::from_env();
    config.apply_overrides(connection.into());
    config
}

/// Exécute la commande process
pub fn cmd_process(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
    source_epsg: u32,
    unit_to_metres: f64,
) -> Result<()> {
    let options = ProcessOptions {
        unit_to_metres,
        ..ProcessOptions::default()
    };

    match export::process_file(input, output_dir, format, Crs::new(source_epsg), &options) {
        Ok(output) => {
            println!("Saved processed data to {}", output.display());
            println!("Processing complete!");
            Ok(())
        }
        Err(e) => {
            error!(input = %input.display(), error = %e, "Error processing file");
            println!("Processing failed.");
            Err(e.into())
        }
    }
}

/// Fichiers à charger : `--input-file` prioritaire sur `--input-dir`
fn resolve_inputs(
    input_file: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    pattern: &str,
) -> Result<Vec<PathBuf>> {
    if let Some(file) = input_file {
        if input_dir.is_some() {
            println!("Warning: Both --input-file and --input-dir provided. Using --input-file only.");
        }
        if !file.is_file() {
            bail!("Input file not found: {}", file.display());
        }
        return Ok(vec![file]);
    }

    let dir = input_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    collect_inputs(&dir, pattern)
}

/// Exécute la commande load
#[allow(clippy::too_many_arguments)]
pub async fn cmd_load(
    input_file: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    pattern: &str,
    batch_size: usize,
    drop_existing: bool,
    bootstrap: bool,
    report_path: Option<PathBuf>,
    connection: ConnectionArgs,
) -> Result<()> {
    let started = Instant::now();

    let inputs = resolve_inputs(input_file, input_dir, pattern)?;
    if inputs.is_empty() {
        println!("No files matching pattern '{}' found", pattern);
        return Ok(());
    }
    println!("Found {} files to process", inputs.len());

    let config = resolve_config(connection);
    println!("Database: {}", config.database.describe());
    println!("Target: {}", schema::qualified(&config.schema, &config.table));
    println!("Batch size: {}", batch_size);

    let mut client = db::connect(&config.database).await?;
    db::test_connection(&client).await?;
    println!("Connected to PostgreSQL");

    if bootstrap {
        schema::bootstrap_schema(&client, &config.schema).await?;
    }
    if drop_existing {
        schema::reset_schema(&client, &config.schema, &config.table).await?;
    }
    schema::ensure_schema(&client, &config.schema, &config.table).await?;

    let mut report = RunReport::new("load");
    {
        let mut sink = PgSink::new(&mut client, &config.schema, &config.table);
        db::load_paths(&mut sink, &inputs, batch_size, &mut report).await;
    }
    report.set_duration(started.elapsed());
    report.finalize();
    report.display();

    if let Some(path) = report_path {
        report
            .save_to_file(&path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    info!("{}", report.summary());

    if report.status == RunStatus::Failed {
        bail!("No file could be loaded");
    }
    Ok(())
}

/// Exécute la commande routes
pub async fn cmd_routes(
    local_authority: Option<String>,
    limit: i64,
    connection: ConnectionArgs,
) -> Result<()> {
    let config = resolve_config(connection);
    println!(
        "{}",
        routes_view(&config, local_authority.as_deref(), limit).await
    );
    Ok(())
}

/// Rendu de la consultation ; les erreurs sont affichées en ligne
async fn routes_view(config: &Config, local_authority: Option<&str>, limit: i64) -> String {
    let client = match db::connect(&config.database).await {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Database connection failed");
            return format!(
                "Error connecting to database: {:#}\n{}",
                e,
                viewer::render_routes(&[])
            );
        }
    };

    let mut out = String::new();
    if local_authority.is_none() {
        match viewer::local_authorities(&client, &config.schema, &config.table).await {
            Ok(authorities) if authorities.is_empty() => out.push_str("Local authorities: none\n"),
            Ok(authorities) => {
                out.push_str(&format!("Local authorities: {}\n", authorities.join(", ")))
            }
            Err(e) => out.push_str(&format!("Error loading local authorities: {:#}\n", e)),
        }
    }

    match viewer::fetch_routes(&client, &config.schema, &config.table, local_authority, limit).await
    {
        Ok(routes) => out.push_str(&viewer::render_routes(&routes)),
        Err(e) => {
            warn!(error = %e, "Route query failed");
            out.push_str(&format!(
                "Error loading routes: {:#}\n{}",
                e,
                viewer::render_routes(&[])
            ));
        }
    }
    out
}

/// Exécute la commande grid-ref
pub fn cmd_grid_ref(easting: f64, northing: f64, precision: u8) -> Result<()> {
    let precision = GridPrecision::try_from(precision)?;
    match os_grid_reference(easting, northing, precision) {
        Some(reference) => {
            println!("{}", reference);
            Ok(())
        }
        None => bail!(
            "Coordinates outside the National Grid: {}, {}",
            easting,
            northing
        ),
    }
}
