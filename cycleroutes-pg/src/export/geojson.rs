//! Export vers GeoJSON avec geozero (streaming)

use std::io::Write;

use anyhow::Result;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use cycleroutes::{ProcessedRoute, ProcessedTable};

/// Écrit la table en FeatureCollection avec membre `crs`
pub fn write_geojson<W: Write>(writer: &mut W, table: &ProcessedTable) -> Result<()> {
    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"{}"}}}},"features":["#,
        table.crs.urn()
    )?;

    for (i, route) in table.routes.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, route)?;
    }

    // Footer
    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, route: &ProcessedRoute) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    route.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    // Attributs source puis dérivés
    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &route.export_properties())?;
    write!(writer, "}}")?;

    Ok(())
}
