//! Text normalisation for keyword matching on supplier names.

use unicode_normalization::UnicodeNormalization;

/// Lower-case, decompose (NFKD) and drop every non-ASCII character.
///
/// `"Hotéis Pousada"` → `"hoteis pousada"`, `"ELEIÇÃO"` → `"eleicao"`.
pub fn normalize(s: &str) -> String {
    s.to_lowercase().nfkd().filter(char::is_ascii).collect()
}
