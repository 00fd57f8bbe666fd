//! Connexion PostgreSQL unique
//!
//! Une seule connexion est ouverte par exécution et utilisée en série.

use anyhow::{Context, Result};
use tokio_postgres::{Client, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, error, warn};

use crate::config::{DatabaseConfig, SslMode};

/// Crée la configuration TLS pour rustls
fn make_tls_connector() -> MakeRustlsConnect {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    MakeRustlsConnect::new(config)
}

/// Ouvre la connexion et lance sa tâche de fond
pub async fn connect(config: &DatabaseConfig) -> Result<Client> {
    let pg = config.pg_config()?;

    match config.ssl_mode {
        SslMode::Disable => connect_plain(&pg).await,
        SslMode::Require => connect_tls(&pg).await,
        SslMode::Prefer => match connect_tls(&pg).await {
            Ok(client) => Ok(client),
            Err(e) => {
                warn!(error = %e, "TLS connection failed, falling back to plain connection");
                connect_plain(&pg).await
            }
        },
    }
}

async fn connect_plain(pg: &tokio_postgres::Config) -> Result<Client> {
    let (client, connection) = pg
        .connect(NoTls)
        .await
        .context("Failed to connect to database")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "Database connection error");
        }
    });
    debug!("Connected without TLS");
    Ok(client)
}

async fn connect_tls(pg: &tokio_postgres::Config) -> Result<Client> {
    let (client, connection) = pg
        .connect(make_tls_connector())
        .await
        .context("Failed to connect to database with TLS")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "Database connection error");
        }
    });
    debug!("Connected with TLS");
    Ok(client)
}

/// Teste la connexion à la base
pub async fn test_connection(client: &Client) -> Result<()> {
    client
        .execute("SELECT 1", &[])
        .await
        .context("Connection test failed")?;
    Ok(())
}
