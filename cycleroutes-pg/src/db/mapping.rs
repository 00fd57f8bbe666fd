//! Correspondance attributs source → colonnes de la table
//!
//! Table statique : les attributs inconnus sont ignorés, `type` alimente
//! `route_type` (sauf si un attribut `route_type` explicite est présent).

use anyhow::{Context, Result};
use bytes::BytesMut;
use geo::Geometry;
use serde_json::Value;

use cycleroutes::Properties;

use crate::export::wkt::to_ewkt;

/// SRID de stockage
pub const STORAGE_SRID: u32 = 4326;

/// Type SQL d'une colonne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
}

/// Colonnes alimentées par les attributs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteField {
    RouteId,
    Street,
    Locality,
    RouteType,
    Notes,
    Surface,
    NcnRoute,
    Traffic,
    LocalAuthority,
    LaSCode,
    ShDateUploaded,
    ShSrc,
    ShSrcId,
    RouteLengthM,
    SourceFile,
}

impl RouteField {
    /// Toutes les colonnes, dans l'ordre du COPY
    pub const ALL: [RouteField; 15] = [
        RouteField::RouteId,
        RouteField::Street,
        RouteField::Locality,
        RouteField::RouteType,
        RouteField::Notes,
        RouteField::Surface,
        RouteField::NcnRoute,
        RouteField::Traffic,
        RouteField::LocalAuthority,
        RouteField::LaSCode,
        RouteField::ShDateUploaded,
        RouteField::ShSrc,
        RouteField::ShSrcId,
        RouteField::RouteLengthM,
        RouteField::SourceFile,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Nom de la colonne SQL
    pub fn column(self) -> &'static str {
        match self {
            Self::RouteId => "route_id",
            Self::Street => "street",
            Self::Locality => "locality",
            Self::RouteType => "route_type",
            Self::Notes => "notes",
            Self::Surface => "surface",
            Self::NcnRoute => "ncn_route",
            Self::Traffic => "traffic",
            Self::LocalAuthority => "local_authority",
            Self::LaSCode => "la_s_code",
            Self::ShDateUploaded => "sh_date_uploaded",
            Self::ShSrc => "sh_src",
            Self::ShSrcId => "sh_src_id",
            Self::RouteLengthM => "route_length_m",
            Self::SourceFile => "source_file",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Self::ShSrcId | Self::RouteLengthM => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Attribut source → colonne ; en cas de doublon sur une colonne, la première
/// entrée présente l'emporte
pub const FIELD_MAPPINGS: &[(&str, RouteField)] = &[
    ("route_id", RouteField::RouteId),
    ("street", RouteField::Street),
    ("locality", RouteField::Locality),
    ("route_type", RouteField::RouteType),
    ("type", RouteField::RouteType),
    ("notes", RouteField::Notes),
    ("surface", RouteField::Surface),
    ("ncn_route", RouteField::NcnRoute),
    ("traffic", RouteField::Traffic),
    ("local_authority", RouteField::LocalAuthority),
    ("la_s_code", RouteField::LaSCode),
    ("sh_date_uploaded", RouteField::ShDateUploaded),
    ("sh_src", RouteField::ShSrc),
    ("sh_src_id", RouteField::ShSrcId),
    ("route_length_m", RouteField::RouteLengthM),
    ("source_file", RouteField::SourceFile),
];

/// Liste des colonnes pour la commande COPY
pub fn copy_columns() -> String {
    let mut cols: Vec<&str> = RouteField::ALL.iter().map(|f| f.column()).collect();
    cols.push("geometry");
    cols.join(", ")
}

/// Valeur typée d'une cellule
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Float(f64),
}

/// Ligne prête à insérer
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRow {
    cells: [Option<Cell>; RouteField::COUNT],

    /// Géométrie au format EWKT (`SRID=4326;...`)
    pub ewkt: String,
}

impl RouteRow {
    /// Construit une ligne depuis les attributs et la géométrie (déjà en EPSG:4326)
    pub fn new(properties: &Properties, geometry: &Geometry) -> Result<Self> {
        let mut cells: [Option<Cell>; RouteField::COUNT] = Default::default();

        for (source, field) in FIELD_MAPPINGS {
            let slot = &mut cells[field.index()];
            if slot.is_some() {
                continue;
            }
            if let Some(value) = properties.get(*source) {
                *slot = coerce(value, field.kind());
            }
        }

        Ok(Self {
            cells,
            ewkt: to_ewkt(geometry, STORAGE_SRID).context("Failed to encode geometry to WKT")?,
        })
    }

    /// Valeur d'une colonne
    pub fn get(&self, field: RouteField) -> Option<&Cell> {
        self.cells[field.index()].as_ref()
    }

    /// Écrit la ligne au format COPY (csv, délimiteur `|`, NULL vide)
    pub fn write_copy_row(&self, buf: &mut BytesMut) {
        for cell in &self.cells {
            match cell {
                Some(Cell::Text(text)) => push_csv_text_field(buf, text),
                Some(Cell::Float(value)) => buf.extend_from_slice(value.to_string().as_bytes()),
                None => {}
            }
            buf.extend_from_slice(b"|");
        }
        push_csv_text_field(buf, &self.ewkt);
        buf.extend_from_slice(b"\n");
    }
}

fn coerce(value: &Value, kind: ColumnKind) -> Option<Cell> {
    match (kind, value) {
        (_, Value::Null) => None,
        (ColumnKind::Text, Value::String(s)) => Some(Cell::Text(s.clone())),
        (ColumnKind::Text, other) => Some(Cell::Text(other.to_string())),
        (ColumnKind::Float, Value::Number(n)) => n.as_f64().map(Cell::Float),
        (ColumnKind::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Cell::Float),
        (ColumnKind::Float, _) => None,
    }
}

fn push_csv_text_field(buf: &mut BytesMut, value: &str) {
    buf.extend_from_slice(b"\"");
    for b in value.as_bytes() {
        match *b {
            b'"' => buf.extend_from_slice(b"\"\""),
            _ => buf.extend_from_slice(&[*b]),
        }
    }
    buf.extend_from_slice(b"\"");
}
