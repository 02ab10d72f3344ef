//! Short, human-shareable id codes.
//!
//! Rooms, sessions, users, and logins are addressed by codes a person can
//! read out loud: three uppercase letters followed by five digits, with an
//! optional prefix (`room_QWE04117`). The space is ~1.7 billion codes, so
//! collisions are rare but possible; callers that persist a generated code
//! retry a bounded number of times on a duplicate-key error.

use rand::Rng;

/// Produces candidate ids. A capability so tests can force collisions.
pub trait IdGenerator: Send + Sync + 'static {
    /// Returns a fresh candidate id. Uniqueness is NOT guaranteed.
    fn next_id(&self) -> String;
}

/// The default generator: `<prefix>` + 3 letters + 5 digits.
#[derive(Debug, Clone, Default)]
pub struct ShortCodeGenerator {
    prefix: String,
}

impl ShortCodeGenerator {
    const LETTERS: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose codes all start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for ShortCodeGenerator {
    fn next_id(&self) -> String {
        let mut rng = rand::rng();
        let mut code = String::with_capacity(self.prefix.len() + 8);
        code.push_str(&self.prefix);
        for _ in 0..3 {
            let i = rng.random_range(0..Self::LETTERS.len());
            code.push(Self::LETTERS[i] as char);
        }
        for _ in 0..5 {
            let digit: u32 = rng.random_range(0..10);
            code.push(char::from_digit(digit, 10).unwrap_or('0'));
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_has_three_letters_then_five_digits() {
        let id = ShortCodeGenerator::new().next_id();
        assert_eq!(id.len(), 8);
        assert!(id[..3].chars().all(|c| c.is_ascii_uppercase()));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_next_id_keeps_prefix() {
        let id = ShortCodeGenerator::with_prefix("room_").next_id();
        assert!(id.starts_with("room_"));
        assert_eq!(id.len(), 13);
    }
}
