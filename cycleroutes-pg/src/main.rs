//! Point d'entrée CLI pour cycleroutes

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Traiter les réseaux cyclables GeoJSON et les charger dans PostGIS
#[derive(Parser)]
#[command(name = "cycleroutes")]
#[command(author, version)]
#[command(about = "Process cycling-route GeoJSON files and load them into PostGIS")]
#[command(long_about = "Calcule la longueur des itinéraires en British National Grid, reprojette en WGS84, exporte en GeoJSON/CSV et charge le résultat dans PostGIS.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Process {
            input_file,
            output_dir,
            format,
            source_epsg,
            unit_to_metres,
        } => {
            info!(input = %input_file.display(), output = %output_dir.display(), ?format, "Processing routes");
            cli::cmd_process(&input_file, &output_dir, format, source_epsg, unit_to_metres)?;
        }
        Commands::Load {
            input_file,
            input_dir,
            pattern,
            batch_size,
            drop_existing,
            bootstrap,
            report,
            connection,
        } => {
            cli::cmd_load(
                input_file,
                input_dir,
                &pattern,
                batch_size,
                drop_existing,
                bootstrap,
                report,
                connection,
            )
            .await?;
        }
        Commands::Routes {
            local_authority,
            limit,
            connection,
        } => {
            cli::cmd_routes(local_authority, limit, connection).await?;
        }
        Commands::GridRef {
            easting,
            northing,
            precision,
        } => {
            cli::cmd_grid_ref(easting, northing, precision)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
