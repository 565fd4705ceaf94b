use rand::rngs::OsRng;
use rand::Rng;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Replacement-name strategy bound to its parameters. Generated names carry
/// no uniqueness guarantee; callers pick a length with enough entropy for
/// their collision tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameGenerator {
    RandomHex { length: usize },
    UnicodeRange { length: usize, start: u32, end: u32 },
}

impl NameGenerator {
    pub fn next_name(&self) -> String {
        match self {
            NameGenerator::RandomHex { length } => {
                let mut out = String::with_capacity(*length);
                for _ in 0..*length {
                    out.push(HEX_DIGITS[OsRng.gen_range(0..HEX_DIGITS.len())] as char);
                }
                out
            }
            NameGenerator::UnicodeRange { length, start, end } => {
                let mut out = String::with_capacity(*length);
                for _ in 0..*length {
                    out.push(random_scalar_in(*start, *end));
                }
                out
            }
        }
    }
}

// Arbitrary caller ranges can overlap the surrogate block or run past
// char::MAX; rejected draws are resampled. Option resolution guarantees the
// range contains at least one scalar value, so this terminates.
fn random_scalar_in(start: u32, end: u32) -> char {
    loop {
        if let Some(c) = char::from_u32(OsRng.gen_range(start..=end)) {
            return c;
        }
    }
}

pub fn range_contains_scalar(start: u32, end: u32) -> bool {
    if start > end || start > char::MAX as u32 {
        return false;
    }
    !(start >= 0xD800 && end <= 0xDFFF)
}
