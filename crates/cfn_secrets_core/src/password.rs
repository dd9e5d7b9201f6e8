//! Random password generation for generated secure parameters.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SPECIAL_CHARACTERS: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Largest value a Standard-tier SecureString parameter can hold.
pub const MAX_PASSWORD_LENGTH: i64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password length must be between 1 and 4096, got {0}")]
    InvalidLength(i64),
}

/// The active character set: letters and digits, optionally followed by the
/// fixed punctuation set.
pub fn charset(include_specials: bool) -> Vec<char> {
    let mut characters: Vec<char> = UPPERCASE
        .chars()
        .chain(LOWERCASE.chars())
        .chain(DIGITS.chars())
        .collect();
    if include_specials {
        characters.extend(SPECIAL_CHARACTERS.chars());
    }
    characters
}

/// Draws every character independently and uniformly from [`charset`].
///
/// Production code uses [`PasswordGenerator::from_entropy`], which seeds a
/// cryptographically secure `StdRng` from the operating system. Tests inject a
/// seeded generator through [`PasswordGenerator::seeded`] or
/// [`PasswordGenerator::with_rng`].
#[derive(Debug, Clone)]
pub struct PasswordGenerator<R = StdRng> {
    rng: R,
}

impl PasswordGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> PasswordGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, length: i64, include_specials: bool) -> Result<String, PasswordError> {
        if !(1..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(PasswordError::InvalidLength(length));
        }

        let characters = charset(include_specials);
        let index = Uniform::from(0..characters.len());
        Ok((0..length)
            .map(|_| characters[index.sample(&mut self.rng)])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn alphanumeric_passwords_have_exact_length_and_charset() {
        let mut generator = PasswordGenerator::seeded(7);

        for _ in 0..50 {
            let password = generator.generate(12, false).expect("length is valid");
            assert_eq!(password.chars().count(), 12);
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn special_passwords_stay_within_both_sets() {
        let allowed: HashSet<char> = charset(true).into_iter().collect();
        let mut generator = PasswordGenerator::seeded(11);

        let mut saw_special = false;
        for _ in 0..50 {
            let password = generator.generate(32, true).expect("length is valid");
            assert_eq!(password.chars().count(), 32);
            assert!(password.chars().all(|c| allowed.contains(&c)));
            saw_special |= password.chars().any(|c| SPECIAL_CHARACTERS.contains(c));
        }
        assert!(saw_special, "1600 draws should hit the punctuation set");
    }

    #[test]
    fn charset_sizes_match_character_classes() {
        assert_eq!(charset(false).len(), 62);
        assert_eq!(charset(true).len(), 62 + 32);
    }

    #[test]
    fn same_seed_yields_same_password() {
        let first = PasswordGenerator::seeded(42)
            .generate(20, true)
            .expect("length is valid");
        let second = PasswordGenerator::seeded(42)
            .generate(20, true)
            .expect("length is valid");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_non_positive_lengths() {
        let mut generator = PasswordGenerator::seeded(1);
        assert_eq!(
            generator.generate(0, false),
            Err(PasswordError::InvalidLength(0))
        );
        assert_eq!(
            generator.generate(-4, true),
            Err(PasswordError::InvalidLength(-4))
        );
    }

    #[test]
    fn rejects_lengths_beyond_parameter_limit() {
        let mut generator = PasswordGenerator::seeded(3);

        let longest = generator
            .generate(MAX_PASSWORD_LENGTH, true)
            .expect("limit is inclusive");
        assert_eq!(longest.chars().count(), 4096);

        assert_eq!(
            generator.generate(MAX_PASSWORD_LENGTH + 1, false),
            Err(PasswordError::InvalidLength(4097))
        );
        assert_eq!(
            generator.generate(200_000_000_000, false),
            Err(PasswordError::InvalidLength(200_000_000_000))
        );
    }
}
