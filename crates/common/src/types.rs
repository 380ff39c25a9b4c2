use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an aggregate instance.
///
/// Backed by an opaque string so identifiers minted elsewhere (other
/// services, fixtures, replayed streams) round-trip unchanged. Compared
/// by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(String);

impl AggregateId {
    /// Mints a new random aggregate ID (UUIDv4 rendered as a string).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AggregateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AggregateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for AggregateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier threading related commands and events through one saga.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mints a new random correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing correlation string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Errors raised when constructing an [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// The address was empty or all whitespace.
    #[error("email address must not be blank")]
    Blank,

    /// The address exceeds the 254-character limit.
    #[error("email address is too long: {length} characters (max 254)")]
    TooLong { length: usize },

    /// The address does not look like `local@domain.tld`.
    #[error("malformed email address: {address}")]
    Malformed { address: String },
}

/// A validated email address.
///
/// Construction fails immediately on blank input, addresses longer than
/// 254 characters, or text that does not match the pragmatic
/// `local@domain.tld` shape. The inner string is never mutated after
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validates and wraps an email address.
    pub fn parse(address: impl Into<String>) -> Result<Self, EmailError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(EmailError::Blank);
        }
        if address.len() > 254 {
            return Err(EmailError::TooLong {
                length: address.len(),
            });
        }
        if !Self::looks_valid(&address) {
            return Err(EmailError::Malformed { address });
        }
        Ok(Self(address))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    // One '@', non-empty local part, domain with an interior dot, no
    // whitespace anywhere.
    fn looks_valid(address: &str) -> bool {
        if address.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        match domain.rsplit_once('.') {
            Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
            None => false,
        }
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = (self.cents / 100).abs();
        let rem = (self.cents % 100).abs();
        if self.cents < 0 {
            write!(f, "-${dollars}.{rem:02}")
        } else {
            write!(f, "${dollars}.{rem:02}")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_id_new_creates_unique_ids() {
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn aggregate_id_preserves_wrapped_value() {
        let id = AggregateId::from_string("txn-42");
        assert_eq!(id.as_str(), "txn-42");
        assert_eq!(id.to_string(), "txn-42");
    }

    #[test]
    fn aggregate_id_serialization_roundtrip() {
        let id = AggregateId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: AggregateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn correlation_id_equality_by_value() {
        let a = CorrelationId::from_string("saga-1");
        let b = CorrelationId::from_string("saga-1");
        assert_eq!(a, b);
    }

    #[test]
    fn email_accepts_plain_addresses() {
        let email = Email::parse("alice@example.com").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn email_rejects_blank() {
        assert_eq!(Email::parse("   "), Err(EmailError::Blank));
        assert_eq!(Email::parse(""), Err(EmailError::Blank));
    }

    #[test]
    fn email_rejects_too_long() {
        let address = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(address),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in [
            "no-at-sign",
            "@example.com",
            "two@@example.com",
            "a@b@c.com",
            "spaces in@example.com",
            "alice@nodot",
            "alice@.com",
            "alice@domain.",
        ] {
            assert!(
                matches!(Email::parse(bad), Err(EmailError::Malformed { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn email_serialization_roundtrip() {
        let email = Email::parse("bob@example.org").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        let deserialized: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(email, deserialized);
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1500);
        c -= b;
        assert_eq!(c.cents(), 1000);
    }

    #[test]
    fn money_sign_checks() {
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(0).is_zero());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }
}
