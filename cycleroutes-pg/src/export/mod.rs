//! Export des tables traitées (GeoJSON, CSV)

pub mod delimited;
pub mod geojson;
pub mod wkt;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use cycleroutes::{Crs, ProcessOptions, RouteError};

/// Format de sortie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Geojson,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Geojson => "geojson",
            Self::Csv => "csv",
        }
    }
}

/// Erreurs d'export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Import ou traitement en échec
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

impl ExportError {
    /// Vrai si l'échec vient d'un fichier sans donnée exploitable
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::Route(e) if e.is_no_data())
    }
}

/// Nom du fichier de sortie : `<base>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn output_file_name(input: &Path, format: OutputFormat, stamp: &str) -> String {
    let base = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "routes".into());
    format!("{}_{}.{}", base, stamp, format.extension())
}

/// Importe, traite et exporte un fichier ; retourne le chemin écrit
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
    source: Crs,
    options: &ProcessOptions,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let table = cycleroutes::process(input, source, options)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output = output_dir.join(output_file_name(input, format, &stamp));

    let io_err = |source| ExportError::Io {
        path: output.clone(),
        source,
    };
    let file = File::create(&output).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let written = match format {
        OutputFormat::Geojson => geojson::write_geojson(&mut writer, &table),
        OutputFormat::Csv => delimited::write_csv(&mut writer, &table),
    };
    if let Err(e) = written {
        let _ = std::fs::remove_file(&output);
        return Err(ExportError::Encode {
            path: output.clone(),
            reason: format!("{:#}", e),
        });
    }
    writer.flush().map_err(io_err)?;

    info!(
        output = %output.display(),
        routes = table.len(),
        format = format.extension(),
        "Saved processed data"
    );
    Ok(output)
}
