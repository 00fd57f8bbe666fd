//! Rapport d'exécution avec graceful degradation
//!
//! Chaque fichier produit un résultat typé ; le rapport les agrège et en
//! déduit un statut global.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Statut global de l'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Tous les fichiers traités sans erreur
    Success,
    /// Certains fichiers en échec, d'autres chargés
    PartialSuccess,
    /// Aucun fichier chargé et au moins un échec
    Failed,
}

/// Résultat du traitement d'un fichier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Lignes insérées
    Loaded {
        file: String,
        rows: u64,
        skipped: usize,
    },
    /// Aucune donnée exploitable
    Empty { file: String },
    /// Échec ; `committed` lignes ont pu être validées avant l'erreur
    Failed {
        file: String,
        error: String,
        committed: u64,
    },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            Self::Loaded { file, .. } | Self::Empty { file } | Self::Failed { file, .. } => file,
        }
    }

    /// Lignes effectivement présentes en base pour ce fichier
    pub fn rows_in_store(&self) -> u64 {
        match self {
            Self::Loaded { rows, .. } => *rows,
            Self::Empty { .. } => 0,
            Self::Failed { committed, .. } => *committed,
        }
    }
}

/// Rapport complet d'exécution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Commande exécutée
    pub command: String,
    /// Début de l'exécution
    pub started_at: DateTime<Utc>,
    /// Durée
    pub duration_secs: f64,
    /// Statut global
    pub status: RunStatus,
    /// Résultats par fichier, dans l'ordre de traitement
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            started_at: Utc::now(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            files: Vec::new(),
        }
    }

    /// Enregistre le résultat d'un fichier
    pub fn record(&mut self, outcome: FileOutcome) {
        self.files.push(outcome);
    }

    /// Définit la durée de l'exécution
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let failed = self.files_failed();
        let loaded = self
            .files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Loaded { .. }))
            .count();

        self.status = if failed == 0 {
            RunStatus::Success
        } else if loaded > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Failed
        };
    }

    /// Fichiers traités sans erreur (chargés ou vides)
    pub fn files_processed(&self) -> usize {
        self.files.len() - self.files_failed()
    }

    pub fn files_failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Failed { .. }))
            .count()
    }

    /// Total des lignes insérées, lots validés des fichiers en échec compris
    pub fn records_inserted(&self) -> u64 {
        self.files.iter().map(FileOutcome::rows_in_store).sum()
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\nSummary:");
        println!("Processed {} files", self.files_processed());
        println!("Inserted {} total records", self.records_inserted());

        if self.files_failed() > 0 {
            println!("\n--- ERRORS ({}) ---", self.files_failed());
            for outcome in &self.files {
                if let FileOutcome::Failed {
                    file,
                    error,
                    committed,
                } = outcome
                {
                    println!("  [{}] {} ({} rows committed)", file, error, committed);
                }
            }
        }

        println!("\nStatus: {:?} ({:.2}s)", self.status, self.duration_secs);
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} files processed, {} failed, {} records inserted",
            self.command,
            self.files_processed(),
            self.files_failed(),
            self.records_inserted()
        )
    }
}
