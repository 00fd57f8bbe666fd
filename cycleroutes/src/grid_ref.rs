//! Références de grille Ordnance Survey
//!
//! Convertit des coordonnées British National Grid (easting, northing) en
//! référence alphanumérique, par exemple `NT 25940 73060`.

/// Alphabet des carrés de 100 km (pas de `I`)
const GRID_CHARS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Précision de la référence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridPrecision {
    /// 6 chiffres, carré de 100 m (`NT259730`)
    Hundred,
    /// 8 chiffres, carré de 10 m (`NT 2594 7306`)
    Ten,
    /// 10 chiffres, au mètre (`NT 25940 73060`)
    #[default]
    One,
}

impl GridPrecision {
    /// Nombre total de chiffres
    pub fn digits(self) -> u8 {
        match self {
            Self::Hundred => 6,
            Self::Ten => 8,
            Self::One => 10,
        }
    }

    fn divisor(self) -> f64 {
        match self {
            Self::Hundred => 100.0,
            Self::Ten => 10.0,
            Self::One => 1.0,
        }
    }
}

impl TryFrom<u8> for GridPrecision {
    type Error = InvalidPrecision;

    fn try_from(digits: u8) -> Result<Self, Self::Error> {
        match digits {
            6 => Ok(Self::Hundred),
            8 => Ok(Self::Ten),
            10 => Ok(Self::One),
            other => Err(InvalidPrecision(other)),
        }
    }
}

/// Précision hors de {6, 8, 10}
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("precision must be 6, 8 or 10 (got {0})")]
pub struct InvalidPrecision(pub u8);

/// Calcule la référence de grille OS
///
/// Retourne `None` hors de l'emprise de la grille (0..700 km E, 0..1300 km N).
pub fn os_grid_reference(easting: f64, northing: f64, precision: GridPrecision) -> Option<String> {
    if !easting.is_finite() || !northing.is_finite() {
        return None;
    }

    let e100k = (easting / 100_000.0).floor();
    let n100k = (northing / 100_000.0).floor();
    if !(0.0..=6.0).contains(&e100k) || !(0.0..=12.0).contains(&n100k) {
        return None;
    }
    let (e100k, n100k) = (e100k as usize, n100k as usize);

    let row = 19 - n100k;
    let l1 = row - row % 5 + (e100k + 10) / 5;
    let l2 = (row * 5) % 25 + e100k % 5;
    let letters = [GRID_CHARS[l1] as char, GRID_CHARS[l2] as char];

    let width = usize::from(precision.digits() / 2);
    let e_digits = ((easting - e100k as f64 * 100_000.0) / precision.divisor()).floor() as u64;
    let n_digits = ((northing - n100k as f64 * 100_000.0) / precision.divisor()).floor() as u64;

    let reference = match precision {
        GridPrecision::Hundred => format!(
            "{}{}{:0width$}{:0width$}",
            letters[0], letters[1], e_digits, n_digits
        ),
        GridPrecision::Ten | GridPrecision::One => format!(
            "{}{} {:0width$} {:0width$}",
            letters[0], letters[1], e_digits, n_digits
        ),
    };
    Some(reference)
}
