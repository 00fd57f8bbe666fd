//! Types de données pour le crate cycleroutes

use geo::Geometry;
use serde_json::{Map, Value};

/// Attributs non géométriques d'une feature (ordre du document source conservé)
pub type Properties = Map<String, Value>;

/// Système de référence de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    /// Code EPSG (SRID)
    pub epsg: u32,
}

impl Crs {
    /// British National Grid (OSGB36 / Transverse Mercator), en mètres
    pub const BRITISH_NATIONAL_GRID: Crs = Crs { epsg: 27700 };

    /// WGS84 géographique (longitude/latitude en degrés)
    pub const WGS84: Crs = Crs { epsg: 4326 };

    pub const fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// Vrai pour un système géographique (unités angulaires)
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4258 | 4277)
    }

    /// Nom lisible du système
    pub fn name(&self) -> &'static str {
        match self.epsg {
            27700 => "OSGB36 / British National Grid",
            4326 => "WGS 84",
            4277 => "OSGB36",
            4258 => "ETRS89",
            3857 => "WGS 84 / Pseudo-Mercator",
            _ => "",
        }
    }

    /// URN OGC utilisée dans le membre `crs` des documents GeoJSON
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::BRITISH_NATIONAL_GRID
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Une feature importée : géométrie (éventuellement nulle) et attributs
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    /// Géométrie parsée, `None` si le document porte `"geometry": null`
    pub geometry: Option<Geometry>,

    /// Attributs à plat de la feature
    pub properties: Properties,
}

/// Table importée, étiquetée avec le système de coordonnées déclaré
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    pub features: Vec<RouteFeature>,
    pub crs: Crs,
}

impl RouteTable {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Un itinéraire traité avec ses attributs dérivés
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRoute {
    /// Géométrie exprimée dans le système de la table traitée
    pub geometry: Geometry,

    /// Attributs d'origine, transmis sans modification
    pub properties: Properties,

    /// Longueur calculée dans le système projeté source, en mètres
    pub route_length_m: f64,

    /// Nom de base du fichier d'origine
    pub source_file: String,
}

impl ProcessedRoute {
    /// Attributs complets tels qu'exportés (source + dérivés)
    pub fn export_properties(&self) -> Properties {
        let mut props = self.properties.clone();
        props.insert("route_length_m".into(), Value::from(self.route_length_m));
        props.insert("source_file".into(), Value::from(self.source_file.clone()));
        props
    }
}

/// Résultat du traitement d'une table
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTable {
    pub routes: Vec<ProcessedRoute>,
    pub crs: Crs,

    /// Nombre de features écartées (géométrie absente ou non mesurable)
    pub skipped: usize,
}

impl ProcessedTable {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
