//! Définitions des ellipsoïdes

/// Ellipsoïde WGS84
pub struct WGS84;

impl WGS84 {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub const A: f64 = 6378137.0;

    /// Aplatissement
    pub const F: f64 = 1.0 / 298.257223563;

    /// Première excentricité au carré
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;
}

/// Ellipsoïde Airy 1830 (datum OSGB36)
pub struct Airy1830;

impl Airy1830 {
    /// Demi-grand axe en mètres
    pub const A: f64 = 6377563.396;

    /// Demi-petit axe en mètres
    pub const B: f64 = 6356256.909;

    /// Première excentricité au carré
    pub const E2: f64 = (Self::A * Self::A - Self::B * Self::B) / (Self::A * Self::A);

    /// Troisième aplatissement n = (a - b) / (a + b)
    pub const N: f64 = (Self::A - Self::B) / (Self::A + Self::B);
}
