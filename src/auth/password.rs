/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt and password strength validation.

use bcrypt::{hash, verify};
use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::error::PasswordError;

/// bcrypt ignores everything past this many bytes
const MAX_PASSWORD_BYTES: usize = 72;

pub const MIN_LETTERS: usize = 6;
pub const MIN_UPPERCASE: usize = 2;
pub const MIN_DIGITS: usize = 2;
pub const MIN_SPECIALS: usize = 2;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// One-way password hashing with constant-time comparison
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password
    ///
    /// # Errors
    /// Returns `HashingFailure` if the primitive rejects the input or is misconfigured
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// True iff `plaintext` hashes to `hashed`. A malformed hash is a non-match.
    fn compare_hashes(&self, plaintext: &str, hashed: &str) -> bool;

    /// Spend the cost of one comparison without a stored hash to compare against.
    ///
    /// Used when the account is unknown so that path takes as long as a
    /// wrong password.
    fn compare_against_decoy(&self, plaintext: &str);
}

/// bcrypt-backed hasher with a configurable work factor
pub struct BcryptHasher {
    cost: u32,
    decoy_hash: String,
}

impl BcryptHasher {
    /// Create a hasher with the given bcrypt cost (4..=31)
    ///
    /// # Errors
    /// Returns error if bcrypt rejects the cost
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let decoy_hash = hash(DECOY_PASSWORD, cost)
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?;

        Ok(Self { cost, decoy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::HashingFailure(format!(
                "password longer than {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        hash(plaintext, self.cost).map_err(|e| PasswordError::HashingFailure(e.to_string()))
    }

    fn compare_hashes(&self, plaintext: &str, hashed: &str) -> bool {
        verify(plaintext, hashed).unwrap_or(false)
    }

    fn compare_against_decoy(&self, plaintext: &str) {
        let _ = verify(plaintext, &self.decoy_hash);
    }
}

/// First password policy rule a candidate violates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    Letters,
    Uppercase,
    Digits,
    Specials,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::Letters => write!(f, "too few letters: minimum is {}", MIN_LETTERS),
            PasswordRule::Uppercase => {
                write!(f, "too few uppercase letters: minimum is {}", MIN_UPPERCASE)
            }
            PasswordRule::Digits => write!(f, "too few digits: minimum is {}", MIN_DIGITS),
            PasswordRule::Specials => {
                write!(f, "too few special symbols: minimum is {}", MIN_SPECIALS)
            }
        }
    }
}

/// Punctuation (P*) or symbol (S*) general category
fn is_special(c: char) -> bool {
    use GeneralCategory::*;

    matches!(
        get_general_category(c),
        ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}

/// Validate password strength requirements
///
/// Requirements, checked in this order:
/// - At least 6 letters (letters or spaces; uppercase letters count here too)
/// - At least 2 uppercase letters
/// - At least 2 digits
/// - At least 2 punctuation or symbol characters
pub fn validate_password_strength(password: &str) -> Result<(), PasswordRule> {
    let (mut letters, mut uppers, mut digits, mut specials) = (0usize, 0usize, 0usize, 0usize);

    for c in password.chars() {
        if c.is_numeric() {
            digits += 1;
        } else if c.is_uppercase() {
            uppers += 1;
            letters += 1;
        } else if is_special(c) {
            specials += 1;
        } else if c.is_alphabetic() || c == ' ' {
            letters += 1;
        }
    }

    if letters < MIN_LETTERS {
        return Err(PasswordRule::Letters);
    }
    if uppers < MIN_UPPERCASE {
        return Err(PasswordRule::Uppercase);
    }
    if digits < MIN_DIGITS {
        return Err(PasswordRule::Digits);
    }
    if specials < MIN_SPECIALS {
        return Err(PasswordRule::Specials);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(4).expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hasher = hasher();
        let hash = hasher.hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert_eq!(hasher.cost(), 4);
        assert!(hash.starts_with("$2b$04$"));
    }

    #[test]
    fn test_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("ValidPassword123").expect("Failed to hash password");

        assert!(hasher.compare_hashes("ValidPassword123", &hash));
        assert!(!hasher.compare_hashes("WrongPassword123", &hash));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!hasher().compare_hashes("ValidPassword123", "not-a-bcrypt-hash"));
        assert!(!hasher().compare_hashes("ValidPassword123", ""));
    }

    #[test]
    fn test_oversized_password_fails() {
        let result = hasher().hash(&"a".repeat(MAX_PASSWORD_BYTES + 1));
        assert!(matches!(result, Err(PasswordError::HashingFailure(_))));
    }

    #[test]
    fn test_invalid_cost_fails() {
        assert!(BcryptHasher::new(2).is_err());
        assert!(BcryptHasher::new(32).is_err());
    }

    #[test]
    fn test_valid_password() {
        assert_eq!(validate_password_strength("ABcdef12!!"), Ok(()));
        assert_eq!(validate_password_strength("Hello world 42 ?!"), Err(PasswordRule::Uppercase));
        assert_eq!(validate_password_strength("Hello World 42 ?!"), Ok(()));
    }

    #[test]
    fn test_lowercase_only_reports_uppercase_rule() {
        assert_eq!(validate_password_strength("abcdef"), Err(PasswordRule::Uppercase));
    }

    #[test]
    fn test_single_uppercase_is_not_enough() {
        assert_eq!(validate_password_strength("Abcdef12!!"), Err(PasswordRule::Uppercase));
    }

    #[test]
    fn test_rules_short_circuit_in_order() {
        assert_eq!(validate_password_strength(""), Err(PasswordRule::Letters));
        assert_eq!(validate_password_strength("AB12!!"), Err(PasswordRule::Letters));
        assert_eq!(validate_password_strength("ABcdef!!"), Err(PasswordRule::Digits));
        assert_eq!(validate_password_strength("ABcdef12"), Err(PasswordRule::Specials));
    }

    #[test]
    fn test_spaces_count_as_letters() {
        assert_eq!(validate_password_strength("AB    12!!"), Ok(()));
    }

    #[test]
    fn test_symbols_count_as_specials() {
        assert_eq!(validate_password_strength("ABcdef12$+"), Ok(()));
        assert_eq!(validate_password_strength("ABcdef12€§"), Ok(()));
    }

    #[test]
    fn test_marks_and_format_characters_are_not_specials() {
        // Combining acute accent, zero-width space, private use
        assert_eq!(validate_password_strength("ABcdef12\u{301}\u{301}"), Err(PasswordRule::Specials));
        assert_eq!(validate_password_strength("ABcdef12\u{200B}\u{200B}"), Err(PasswordRule::Specials));
        assert_eq!(validate_password_strength("ABcdef12\u{E000}\u{E000}"), Err(PasswordRule::Specials));
        assert_eq!(validate_password_strength("ABcdef12«»"), Ok(()));
    }
}
