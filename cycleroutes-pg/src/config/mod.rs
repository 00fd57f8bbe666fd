//! Configuration du système
//!
//! Construite une seule fois au démarrage depuis l'environnement (après
//! chargement du `.env`), puis passée par référence. Le code de chargement
//! ne lit jamais l'environnement lui-même.

use std::time::Duration;

use anyhow::{bail, Result};

/// Schéma par défaut
pub const DEFAULT_SCHEMA: &str = "public";

/// Table par défaut des itinéraires
pub const DEFAULT_TABLE: &str = "cycling_routes";

/// Mode SSL pour la connexion PostgreSQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Pas de SSL (défaut)
    #[default]
    Disable,
    /// SSL préféré mais non requis
    Prefer,
    /// SSL requis
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "off" | "false" | "no" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "on" | "true" | "yes" => Ok(SslMode::Require),
            _ => Err(format!("Invalid SSL mode: {}. Use: disable, prefer, require", s)),
        }
    }
}

/// Paramètres de connexion à la base
///
/// `host`, `dbname` et `user` peuvent manquer : l'erreur n'est levée qu'au
/// moment d'ouvrir une connexion (l'export fichier n'en a pas besoin).
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: u16,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 5432,
            dbname: None,
            user: None,
            password: None,
            ssl_mode: SslMode::Disable,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    /// Construit la configuration tokio-postgres
    ///
    /// # Errors
    /// Retourne une erreur si `DB_HOST`, `DB_NAME` ou `DB_USER` est absent.
    pub fn pg_config(&self) -> Result<tokio_postgres::Config> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("DB_HOST");
        }
        if self.dbname.is_none() {
            missing.push("DB_NAME");
        }
        if self.user.is_none() {
            missing.push("DB_USER");
        }
        if !missing.is_empty() {
            bail!(
                "Missing database configuration: {} (set them in .env or pass --host/--database/--user)",
                missing.join(", ")
            );
        }

        let mut cfg = tokio_postgres::Config::new();
        cfg.host(self.host.as_deref().unwrap_or_default())
            .port(self.port)
            .dbname(self.dbname.as_deref().unwrap_or_default())
            .user(self.user.as_deref().unwrap_or_default())
            .connect_timeout(self.connect_timeout)
            .application_name("cycleroutes");
        if let Some(password) = &self.password {
            cfg.password(password);
        }
        Ok(cfg)
    }

    /// Description lisible, mot de passe masqué
    pub fn describe(&self) -> String {
        let password = match &self.password {
            Some(p) => "*".repeat(p.len()),
            None => String::new(),
        };
        format!(
            "{}{}@{}:{}/{} (SSL: {:?})",
            self.user.as_deref().unwrap_or("<unset>"),
            if password.is_empty() {
                String::new()
            } else {
                format!(":{}", password)
            },
            self.host.as_deref().unwrap_or("<unset>"),
            self.port,
            self.dbname.as_deref().unwrap_or("<unset>"),
            self.ssl_mode
        )
    }
}

/// Surcharges passées en ligne de commande
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub ssl: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

/// Configuration principale
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Schéma PostgreSQL cible
    pub schema: String,

    /// Table des itinéraires
    pub table: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            schema: DEFAULT_SCHEMA.into(),
            table: DEFAULT_TABLE.into(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Charge la configuration depuis une source clé/valeur arbitraire
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Les valeurs vides comptent comme absentes
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            host: get("DB_HOST"),
            port: get("DB_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dbname: get("DB_NAME"),
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
            ssl_mode: get("DB_SSLMODE")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            connect_timeout: defaults.connect_timeout,
        };

        Self {
            database,
            schema: get("DB_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into()),
            table: get("ROUTES_TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE.into()),
        }
    }

    /// Applique les surcharges de la ligne de commande
    pub fn apply_overrides(&mut self, overrides: ConnectionOverrides) {
        let db = &mut self.database;
        if let Some(host) = overrides.host {
            db.host = Some(host);
        }
        if let Some(port) = overrides.port {
            db.port = port;
        }
        if let Some(database) = overrides.database {
            db.dbname = Some(database);
        }
        if let Some(user) = overrides.user {
            db.user = Some(user);
        }
        if let Some(password) = overrides.password {
            db.password = Some(password);
        }
        if let Some(ssl) = overrides.ssl {
            if let Ok(mode) = ssl.parse() {
                db.ssl_mode = mode;
            }
        }
        if let Some(schema) = overrides.schema {
            self.schema = schema;
        }
        if let Some(table) = overrides.table {
            self.table = table;
        }
    }
}
