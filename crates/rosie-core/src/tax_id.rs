//! Check-digit validation for Brazilian tax ids.
//!
//! # Formats
//!
//! - CPF (individuals): 11 digits, the last two are check digits.
//! - CNPJ (companies): 14 digits, the last two are check digits.
//!
//! Both use the same mod-11 rule: multiply the leading digits by a weight
//! sequence, take the sum modulo 11, and the check digit is `0` when the
//! remainder is below 2, otherwise `11 - remainder`. The second check digit
//! is computed the same way over the first one as well.

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate an 11-digit CPF.
///
/// Rejects anything that is not exactly 11 ASCII digits, and ids made of one
/// repeated digit (`00000000000`, `11111111111`, ...) which pass the
/// checksum but are never issued.
pub fn is_valid_cpf(id: &str) -> bool {
    let Some(digits) = parse_digits(id, CPF_LEN) else {
        return false;
    };
    check_digit(&digits[..9], &CPF_FIRST_WEIGHTS) == digits[9]
        && check_digit(&digits[..10], &CPF_SECOND_WEIGHTS) == digits[10]
}

/// Validate a 14-digit CNPJ. Same rejection rules as [`is_valid_cpf`].
pub fn is_valid_cnpj(id: &str) -> bool {
    let Some(digits) = parse_digits(id, CNPJ_LEN) else {
        return false;
    };
    check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS) == digits[12]
        && check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS) == digits[13]
}

/// Whether `id` is a valid CPF or CNPJ once left-padded with zeros to the
/// respective length.
///
/// Source datasets sometimes lose leading zeros, so `"2989654001197"` is
/// checked as the CNPJ `"02989654001197"`.
pub fn is_valid_cpf_or_cnpj(id: &str) -> bool {
    is_valid_cpf(&zero_pad(id, CPF_LEN)) || is_valid_cnpj(&zero_pad(id, CNPJ_LEN))
}

/// Keep only ASCII digits: `"02.989.654/0011-97"` → `"02989654001197"`.
pub fn digits_only(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Left-pad with `0` up to `width` characters. Longer input is returned as-is.
pub fn zero_pad(id: &str, width: usize) -> String {
    let len = id.chars().count();
    if len >= width {
        return id.to_string();
    }
    let mut out = "0".repeat(width - len);
    out.push_str(id);
    out
}

fn parse_digits(id: &str, len: usize) -> Option<Vec<u32>> {
    if id.len() != len || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: Vec<u32> = id.bytes().map(|b| (b - b'0') as u32).collect();
    if digits.iter().all(|&d| d == digits[0]) {
        return None;
    }
    Some(digits)
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}
