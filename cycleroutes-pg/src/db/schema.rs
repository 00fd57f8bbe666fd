//! Gestion du schéma de la table des itinéraires
//!
//! Deux phases distinctes :
//! - [`reset_schema`] supprime la table, appelé au plus une fois par l'orchestrateur
//! - [`ensure_schema`] crée la table si besoin, idempotent
//!
//! La création du schéma PostgreSQL et de l'extension PostGIS est une
//! précondition externe ([`bootstrap_schema`], sur demande explicite).

use anyhow::{Context, Result};
use tokio_postgres::Client;
use tracing::{info, warn};

/// Cite un identifiant SQL (`"name"`, guillemets doublés)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Nom qualifié `"schema"."table"`
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Nom de la fonction trigger associée à une table
fn trigger_function(table: &str) -> String {
    format!("{}_set_updated_at", table)
}

/// Crée le schéma et l'extension PostGIS
pub async fn bootstrap_schema(client: &Client, schema: &str) -> Result<()> {
    client
        .execute(
            &format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)),
            &[],
        )
        .await
        .with_context(|| format!("Failed to create schema {}", schema))?;

    // Peut nécessiter des droits superuser : on tolère une extension déjà installée
    if let Err(e) = client
        .execute("CREATE EXTENSION IF NOT EXISTS postgis", &[])
        .await
    {
        warn!("CREATE EXTENSION postgis failed (will check if already installed): {e}");
        let exists = client
            .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'postgis'", &[])
            .await
            .context("Failed to check pg_extension")?
            .is_some();
        if !exists {
            anyhow::bail!("PostGIS extension is not installed and could not be created: {e}");
        }
    }

    info!(schema, "Schema bootstrapped");
    Ok(())
}

/// Supprime la table des itinéraires et sa fonction trigger
pub async fn reset_schema(client: &Client, schema: &str, table: &str) -> Result<()> {
    let sql = format!(
        "DROP TABLE IF EXISTS {table} CASCADE;\n\
         DROP FUNCTION IF EXISTS {function}() CASCADE;",
        table = qualified(schema, table),
        function = qualified(schema, &trigger_function(table)),
    );

    client
        .batch_execute(&sql)
        .await
        .with_context(|| format!("Failed to drop table {}.{}", schema, table))?;

    info!(schema, table, "Dropped existing table");
    Ok(())
}

/// Crée la table, ses index et le trigger `updated_at` s'ils n'existent pas
pub async fn ensure_schema(client: &Client, schema: &str, table: &str) -> Result<()> {
    client
        .batch_execute(&create_table_sql(schema, table))
        .await
        .with_context(|| format!("Failed to create table {}.{}", schema, table))?;

    info!(schema, table, "Table ready");
    Ok(())
}

/// DDL complet de la table des itinéraires
pub fn create_table_sql(schema: &str, table: &str) -> String {
    let target = qualified(schema, table);
    let function = qualified(schema, &trigger_function(table));
    let index = |suffix: &str| quote_ident(&format!("idx_{}_{}", table, suffix));
    let trigger = quote_ident(&format!("trg_{}_updated_at", table));

    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {target} (
            id SERIAL PRIMARY KEY,
            route_id TEXT,
            street TEXT,
            locality TEXT,
            route_type TEXT,
            notes TEXT,
            surface TEXT,
            ncn_route TEXT,
            traffic TEXT,
            local_authority TEXT,
            la_s_code TEXT,
            sh_date_uploaded TEXT,
            sh_src TEXT,
            sh_src_id DOUBLE PRECISION,
            route_length_m DOUBLE PRECISION,
            source_file TEXT,
            geometry geometry(Geometry, 4326) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );

        CREATE INDEX IF NOT EXISTS {idx_route_id} ON {target} (route_id);
        CREATE INDEX IF NOT EXISTS {idx_locality} ON {target} (locality);
        CREATE INDEX IF NOT EXISTS {idx_local_authority} ON {target} (local_authority);
        CREATE INDEX IF NOT EXISTS {idx_geom} ON {target} USING GIST (geometry);

        CREATE OR REPLACE FUNCTION {function}() RETURNS trigger AS $$
        BEGIN
            NEW.updated_at = NOW();
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql;

        DROP TRIGGER IF EXISTS {trigger} ON {target};
        CREATE TRIGGER {trigger}
            BEFORE UPDATE ON {target}
            FOR EACH ROW EXECUTE FUNCTION {function}();
        "#,
        target = target,
        function = function,
        trigger = trigger,
        idx_route_id = index("route_id"),
        idx_locality = index("locality"),
        idx_local_authority = index("local_authority"),
        idx_geom = index("geom"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("cycling_routes"), "\"cycling_routes\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(qualified("public", "routes"), "\"public\".\"routes\"");
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("public", "cycling_routes");

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"public\".\"cycling_routes\""));
        assert!(sql.contains("id SERIAL PRIMARY KEY"));
        assert!(sql.contains("geometry geometry(Geometry, 4326) NOT NULL"));
        assert!(sql.contains("sh_src_id DOUBLE PRECISION"));
        assert!(sql.contains("\"idx_cycling_routes_route_id\""));
        assert!(sql.contains("\"idx_cycling_routes_locality\""));
        assert!(sql.contains("\"idx_cycling_routes_local_authority\""));
        assert!(sql.contains("USING GIST (geometry)"));
        assert!(sql.contains("BEFORE UPDATE ON \"public\".\"cycling_routes\""));
        assert!(sql.contains("\"public\".\"cycling_routes_set_updated_at\"()"));
    }
}
