//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec la feature `reproject`.

use geo::{Coord, Geometry, LineString, MapCoords, MultiLineString};
use proj::Proj;

use crate::types::Crs;
use crate::RouteError;

/// Reprojection de géométries entre deux systèmes de coordonnées
pub struct Reprojector {
    proj: Proj,
    source: Crs,
    target: Crs,
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source: Crs, target: Crs) -> Result<Self, RouteError> {
        let proj = Proj::new_known_crs(&source.to_string(), &target.to_string(), None)
            .map_err(|e| RouteError::reprojection(source.epsg, target.epsg, e.to_string()))?;

        Ok(Self {
            proj,
            source,
            target,
        })
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, RouteError> {
        match geom {
            Geometry::LineString(ls) => Ok(Geometry::LineString(self.transform_linestring(ls)?)),
            Geometry::MultiLineString(mls) => {
                let lines = mls
                    .0
                    .iter()
                    .map(|ls| self.transform_linestring(ls))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Geometry::MultiLineString(MultiLineString::new(lines)))
            }
            other => other.try_map_coords(|c: Coord| self.transform_coord(c)),
        }
    }

    /// Transforme une coordonnée unique
    fn transform_coord(&self, coord: Coord) -> Result<Coord, RouteError> {
        let (x, y) = self
            .proj
            .convert((coord.x, coord.y))
            .map_err(|e| self.error(e))?;
        Ok(Coord { x, y })
    }

    /// Transforme une LineString (conversion batch)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString, RouteError> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .map_err(|e| self.error(e))?;

        Ok(LineString::new(
            coords.into_iter().map(|(x, y)| Coord { x, y }).collect(),
        ))
    }

    fn error(&self, e: proj::ProjError) -> RouteError {
        RouteError::reprojection(self.source.epsg, self.target.epsg, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_bng_to_wgs84_with_proj() {
        let reprojector = Reprojector::new(Crs::BRITISH_NATIONAL_GRID, Crs::WGS84).unwrap();
        let geom = Geometry::Point(Point::new(530000.0, 180000.0));

        let Geometry::Point(p) = reprojector.transform_geometry(&geom).unwrap() else {
            panic!("Expected Point geometry");
        };
        assert!((p.x() - (-0.128)).abs() < 0.01, "lon={}", p.x());
        assert!((p.y() - 51.504).abs() < 0.01, "lat={}", p.y());
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(Crs::new(99999), Crs::WGS84).is_err());
    }
}
