//! Encodage WKT des géométries (geozero)

use geo::Geometry;
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;

/// Géométrie → WKT
pub fn to_wkt(geometry: &Geometry) -> geozero::error::Result<String> {
    let mut wkt_buf: Vec<u8> = Vec::with_capacity(256);
    {
        let mut writer = WktWriter::new(&mut wkt_buf);
        geometry.process_geom(&mut writer)?;
    }
    // WktWriter n'écrit que de l'ASCII
    Ok(String::from_utf8_lossy(&wkt_buf).into_owned())
}

/// Géométrie → EWKT (`SRID=<srid>;<wkt>`)
pub fn to_ewkt(geometry: &Geometry, srid: u32) -> geozero::error::Result<String> {
    Ok(format!("SRID={};{}", srid, to_wkt(geometry)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, MultiLineString, Point};

    #[test]
    fn test_linestring() {
        let wkt = to_wkt(&Geometry::LineString(line_string![
            (x: 1.0, y: 2.0),
            (x: 3.0, y: 4.0),
        ]))
        .unwrap();
        assert!(wkt.starts_with("LINESTRING"), "{}", wkt);
        assert!(wkt.contains('1') && wkt.contains('4'));
    }

    #[test]
    fn test_multilinestring() {
        let mls = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)],
            line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 3.0)],
        ]);
        let wkt = to_wkt(&Geometry::MultiLineString(mls)).unwrap();
        assert!(wkt.starts_with("MULTILINESTRING"), "{}", wkt);
    }

    #[test]
    fn test_ewkt() {
        let ewkt = to_ewkt(&Geometry::Point(Point::new(-3.6, 56.2)), 4326).unwrap();
        assert!(ewkt.starts_with("SRID=4326;POINT"), "{}", ewkt);
    }
}
