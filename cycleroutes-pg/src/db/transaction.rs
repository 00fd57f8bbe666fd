//! Transaction d'un lot d'insertion
//!
//! Chaque lot est chargé par COPY dans sa propre transaction : un lot en
//! échec est annulé, les lots précédents restent validés.

use anyhow::{Context, Result};
use bytes::BytesMut;
use futures::SinkExt;
use tokio_postgres::{Client, Transaction};
use tracing::{debug, error};

use super::mapping::RouteRow;

/// Transaction d'un lot
pub struct BatchTransaction<'a> {
    transaction: Transaction<'a>,
    batch: usize,
    rows_written: u64,
}

impl<'a> BatchTransaction<'a> {
    /// Démarre la transaction du lot `batch` (numéroté à partir de 1)
    pub async fn begin(client: &'a mut Client, batch: usize) -> Result<Self> {
        let transaction = client
            .transaction()
            .await
            .context("Failed to begin transaction")?;

        debug!(batch, "Starting batch transaction");

        Ok(Self {
            transaction,
            batch,
            rows_written: 0,
        })
    }

    /// Envoie les lignes par COPY FROM STDIN
    pub async fn copy_rows(&mut self, copy_sql: &str, rows: &[RouteRow]) -> Result<()> {
        let mut buf = BytesMut::with_capacity(rows.len() * 256);
        for row in rows {
            row.write_copy_row(&mut buf);
        }

        let sink = self
            .transaction
            .copy_in(copy_sql)
            .await
            .context("Failed to start COPY")?;
        let mut pinned = std::pin::pin!(sink);

        pinned
            .as_mut()
            .send(buf.freeze())
            .await
            .context("Failed to send COPY data")?;
        self.rows_written += pinned
            .as_mut()
            .finish()
            .await
            .context("Failed to finish COPY")?;

        Ok(())
    }

    /// Valide la transaction, retourne le nombre de lignes écrites
    pub async fn commit(self) -> Result<u64> {
        self.transaction
            .commit()
            .await
            .with_context(|| format!("Failed to commit batch {}", self.batch))?;

        debug!(batch = self.batch, rows = self.rows_written, "Batch committed");
        Ok(self.rows_written)
    }

    /// Annule la transaction
    pub async fn rollback(self, reason: &str) {
        error!(
            batch = self.batch,
            reason = %reason,
            "Rolling back batch"
        );

        // Le rollback est aussi implicite au drop
        if let Err(e) = self.transaction.rollback().await {
            error!(error = %e, "Explicit rollback failed (will rollback on drop anyway)");
        }
    }
}
