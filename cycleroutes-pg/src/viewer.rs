//! Requêtes de lecture pour la visualisation des itinéraires
//!
//! Liste des autorités locales et des itinéraires (géométrie en WKT),
//! filtrables par autorité et limités en nombre.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_postgres::{Client, Row};

use crate::db::schema::qualified;

/// Nombre d'itinéraires retournés par défaut
pub const DEFAULT_LIMIT: i64 = 1000;

/// Itinéraire tel que lu par la visualisation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub id: i32,
    pub route_id: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub route_type: Option<String>,
    pub notes: Option<String>,
    pub surface: Option<String>,
    pub local_authority: Option<String>,
    pub route_length_m: Option<f64>,
    pub source_file: Option<String>,
    /// Géométrie en WKT (EPSG:4326)
    pub geometry_wkt: Option<String>,
}

impl RouteView {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            route_id: row.try_get("route_id")?,
            street: row.try_get("street")?,
            locality: row.try_get("locality")?,
            route_type: row.try_get("route_type")?,
            notes: row.try_get("notes")?,
            surface: row.try_get("surface")?,
            local_authority: row.try_get("local_authority")?,
            route_length_m: row.try_get("route_length_m")?,
            source_file: row.try_get("source_file")?,
            geometry_wkt: row.try_get("geometry_wkt")?,
        })
    }
}

pub fn local_authorities_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT DISTINCT local_authority FROM {} \
         WHERE local_authority IS NOT NULL \
         ORDER BY local_authority",
        qualified(schema, table)
    )
}

/// `$1` : autorité locale (NULL = toutes), `$2` : limite
pub fn routes_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT id, route_id, street, locality, route_type, notes, surface, local_authority, \
         route_length_m, source_file, ST_AsText(geometry) AS geometry_wkt \
         FROM {} \
         WHERE ($1::text IS NULL OR local_authority = $1) \
         ORDER BY id \
         LIMIT $2",
        qualified(schema, table)
    )
}

/// Autorités locales distinctes, triées
pub async fn local_authorities(client: &Client, schema: &str, table: &str) -> Result<Vec<String>> {
    let rows = client
        .query(local_authorities_sql(schema, table).as_str(), &[])
        .await
        .context("Failed to fetch local authorities")?;

    rows.iter()
        .map(|row| row.try_get::<_, String>(0).map_err(anyhow::Error::from))
        .collect()
}

/// Itinéraires ordonnés par `id`, au plus `limit`
pub async fn fetch_routes(
    client: &Client,
    schema: &str,
    table: &str,
    local_authority: Option<&str>,
    limit: i64,
) -> Result<Vec<RouteView>> {
    let limit = limit.max(0);
    let rows = client
        .query(routes_sql(schema, table).as_str(), &[&local_authority, &limit])
        .await
        .context("Failed to fetch routes")?;

    rows.iter().map(RouteView::from_row).collect()
}

/// Rendu texte d'une liste d'itinéraires
pub fn render_routes(routes: &[RouteView]) -> String {
    if routes.is_empty() {
        return "No routes found.".to_string();
    }

    let mut out = format!(
        "{:>6}  {:<12} {:<28} {:<20} {:<24} {:>10}\n",
        "id", "route_id", "street", "route_type", "local_authority", "length_m"
    );
    for route in routes {
        out.push_str(&format!(
            "{:>6}  {:<12} {:<28} {:<20} {:<24} {:>10}\n",
            route.id,
            truncate(route.route_id.as_deref(), 12),
            truncate(route.street.as_deref(), 28),
            truncate(route.route_type.as_deref(), 20),
            truncate(route.local_authority.as_deref(), 24),
            route
                .route_length_m
                .map(|l| format!("{:.1}", l))
                .unwrap_or_default(),
        ));
    }
    out.push_str(&format!("{} routes", routes.len()));
    out
}

fn truncate(value: Option<&str>, width: usize) -> String {
    let value = value.unwrap_or("");
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
