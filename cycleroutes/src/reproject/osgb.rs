//! British National Grid (EPSG:27700) vers WGS84
//!
//! Deux étapes :
//! 1. Transverse Mercator inverse sur l'ellipsoïde Airy 1830 (coordonnées OSGB36)
//! 2. Transformation de Helmert à 7 paramètres OSGB36 → WGS84 (précision ~5 m)
//!
//! Formules : "A guide to coordinate systems in Great Britain", Ordnance Survey.

use super::ellipsoid::{Airy1830, WGS84};
use super::Geographic;

/// Facteur d'échelle sur le méridien central
const F0: f64 = 0.9996012717;

/// Origine vraie : 49°N, 2°W
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;

/// Fausse origine (mètres)
const E0: f64 = 400_000.0;
const N0: f64 = -100_000.0;

/// Paramètres Helmert OSGB36 → WGS84 (translations en m, échelle en ppm, rotations en secondes d'arc)
const TX: f64 = 446.448;
const TY: f64 = -125.157;
const TZ: f64 = 542.060;
const S_PPM: f64 = -20.4894;
const RX_SEC: f64 = 0.1502;
const RY_SEC: f64 = 0.2470;
const RZ_SEC: f64 = 0.8421;

/// Arc de méridien depuis la latitude d'origine
fn meridional_arc(phi: f64) -> f64 {
    let n = Airy1830::N;
    let (n2, n3) = (n * n, n * n * n);
    let lat0 = LAT0_DEG.to_radians();
    let dphi = phi - lat0;
    let sphi = phi + lat0;

    Airy1830::B
        * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dphi
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dphi.sin() * sphi.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dphi).sin() * (2.0 * sphi).cos()
            - 35.0 / 24.0 * n3 * (3.0 * dphi).sin() * (3.0 * sphi).cos())
}

/// Convertit des coordonnées de grille (easting, northing) en géographiques OSGB36
pub fn grid_to_osgb36(easting: f64, northing: f64) -> Geographic {
    let a = Airy1830::A;
    let e2 = Airy1830::E2;

    let mut phi = (northing - N0) / (a * F0) + LAT0_DEG.to_radians();
    let mut m = meridional_arc(phi);
    // Convergence à 0.01 mm
    let mut guard = 0;
    while (northing - N0 - m).abs() >= 1e-5 && guard < 100 {
        phi += (northing - N0 - m) / (a * F0);
        m = meridional_arc(phi);
        guard += 1;
    }

    let (sin_phi, cos_phi, tan_phi) = (phi.sin(), phi.cos(), phi.tan());
    let sec_phi = 1.0 / cos_phi;
    let t2 = tan_phi * tan_phi;
    let t4 = t2 * t2;
    let t6 = t4 * t2;

    let nu = a * F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = tan_phi / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec_phi / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec_phi / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = easting - E0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = LON0_DEG.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
        - xiia * de.powi(7);

    Geographic::new(lon, lat)
}

/// Change de datum OSGB36 (Airy 1830) → WGS84 via coordonnées cartésiennes
pub fn osgb36_to_wgs84(geo: Geographic) -> Geographic {
    // Géographique → cartésien (hauteur ellipsoïdale nulle)
    let (sin_lat, cos_lat) = (geo.lat.sin(), geo.lat.cos());
    let nu = Airy1830::A / (1.0 - Airy1830::E2 * sin_lat * sin_lat).sqrt();
    let x1 = nu * cos_lat * geo.lon.cos();
    let y1 = nu * cos_lat * geo.lon.sin();
    let z1 = (1.0 - Airy1830::E2) * nu * sin_lat;

    // Helmert
    let s = 1.0 + S_PPM * 1e-6;
    let rx = (RX_SEC / 3600.0).to_radians();
    let ry = (RY_SEC / 3600.0).to_radians();
    let rz = (RZ_SEC / 3600.0).to_radians();

    let x2 = TX + s * x1 - rz * y1 + ry * z1;
    let y2 = TY + rz * x1 + s * y1 - rx * z1;
    let z2 = TZ - ry * x1 + rx * y1 + s * z1;

    // Cartésien → géographique sur WGS84 (itératif)
    let e2 = WGS84::E2;
    let p = x2.hypot(y2);
    let mut lat = z2.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = WGS84::A / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let next = (z2 + e2 * nu * lat.sin()).atan2(p);
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    let lon = y2.atan2(x2);

    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_projection_reference_point() {
        // Exemple de référence du guide Ordnance Survey
        // E 651409.903, N 313177.270 → 52°39'27.2531"N, 1°43'4.5177"E (OSGB36)
        let (lon, lat) = grid_to_osgb36(651409.903, 313177.270).to_degrees();
        assert!((lat - 52.657_570_3).abs() < 1e-6, "lat={}", lat);
        assert!((lon - 1.717_921_6).abs() < 1e-6, "lon={}", lon);
    }

    #[test]
    fn test_datum_shift() {
        let osgb = grid_to_osgb36(651409.903, 313177.270);
        let (lon, lat) = osgb36_to_wgs84(osgb).to_degrees();
        // Environ 52°39'28.72"N, 1°42'57.79"E en WGS84
        assert!((lat - 52.657_98).abs() < 2e-4, "lat={}", lat);
        assert!((lon - 1.716_05).abs() < 2e-4, "lon={}", lon);
    }

    #[test]
    fn test_true_origin() {
        let (lon, lat) = grid_to_osgb36(E0, N0).to_degrees();
        assert!((lon - LON0_DEG).abs() < 1e-9, "lon={}", lon);
        assert!((lat - LAT0_DEG).abs() < 1e-9, "lat={}", lat);
    }
}
