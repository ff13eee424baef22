// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Type Definitions

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

use crate::error::NetworkError;

// ─── TerminalId ──────────────────────────────────────────────────────────────

/// Length of every terminal identifier.
pub const TERMINAL_ID_LEN: usize = 6;

/// Six-digit terminal identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerminalId(String);

impl TerminalId {
    /// Validate and wrap a raw identifier. Exactly six ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, NetworkError> {
        if raw.len() != TERMINAL_ID_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NetworkError::InvalidTerminalId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TerminalId {
    type Err = NetworkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ─── ClientKey ───────────────────────────────────────────────────────────────

/// Client identifier. Compared, ordered and hashed case-insensitively but
/// displayed exactly as registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded().eq(other.folded())
    }
}

impl Eq for ClientKey {}

impl PartialOrd for ClientKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClientKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            c.hash(state);
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClientKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── CommunicationId ─────────────────────────────────────────────────────────

/// Sequential communication identifier, 1-based, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommunicationId(pub u32);

impl CommunicationId {
    /// Position of this id in the network's canonical list.
    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for CommunicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Credits ─────────────────────────────────────────────────────────────────

/// Monetary amount backed by `rust_decimal::Decimal`.
///
/// Stored fractional; rounded to whole units only when rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Credits(pub Decimal);

impl Credits {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_decimal(d: Decimal) -> Self {
        Self(d)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Nearest whole unit, halves rounded up (2.5 -> 3, -2.5 -> -2).
    pub fn rounded(&self) -> i64 {
        let half_up = (self.0 + Decimal::new(5, 1)).floor();
        half_up.to_i64().unwrap_or(if self.is_negative() { i64::MIN } else { i64::MAX })
    }
}

impl Add for Credits {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Credits {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Credits {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, c| acc + c)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded())
    }
}

// ─── CommunicationKind ───────────────────────────────────────────────────────

/// Medium of a communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunicationKind {
    Text,
    Voice,
    Video,
}

impl CommunicationKind {
    /// Voice and video occupy both terminals until explicitly ended.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Self::Text)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Voice => "VOICE",
            Self::Video => "VIDEO",
        }
    }
}

impl fmt::Display for CommunicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CommunicationKind {
    type Err = NetworkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "VOICE" => Ok(Self::Voice),
            "VIDEO" => Ok(Self::Video),
            _ => Err(NetworkError::InvalidCommunicationKind(s.to_string())),
        }
    }
}

// ─── TierLabel ───────────────────────────────────────────────────────────────

/// Loyalty tier without its counters; the key the tariff table is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierLabel {
    Normal,
    Gold,
    Platinum,
}

impl TierLabel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
        }
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[test]
    fn test_terminal_id_requires_six_digits() {
        assert!(TerminalId::parse("123456").is_ok());
        assert!(TerminalId::parse("12345").is_err());
        assert!(TerminalId::parse("1234567").is_err());
        assert!(TerminalId::parse("12a456").is_err());
        assert!(TerminalId::parse("").is_err());
    }

    #[test]
    fn test_client_key_is_case_insensitive() {
        let mut map = BTreeMap::new();
        map.insert(ClientKey::from("Alice"), 1);
        assert_eq!(map.get(&ClientKey::from("ALICE")), Some(&1));
        assert_eq!(ClientKey::from("bob"), ClientKey::from("BoB"));
        assert!(ClientKey::from("alice") < ClientKey::from("Bob"));
        assert_eq!(ClientKey::from("Alice").to_string(), "Alice");
    }

    #[test]
    fn test_credits_round_half_up() {
        assert_eq!(Credits(dec!(2.5)).rounded(), 3);
        assert_eq!(Credits(dec!(2.49)).rounded(), 2);
        assert_eq!(Credits(dec!(-2.5)).rounded(), -2);
        assert_eq!(Credits(dec!(-2.51)).rounded(), -3);
        assert_eq!(Credits(dec!(0)).rounded(), 0);
    }

    #[test]
    fn test_credits_sum() {
        let total: Credits = [dec!(1.25), dec!(2.25), dec!(-1)].into_iter().map(Credits).sum();
        assert_eq!(total, Credits(dec!(2.5)));
    }

    #[test]
    fn test_communication_kind_parses_any_case() {
        assert_eq!("video".parse::<CommunicationKind>().ok(), Some(CommunicationKind::Video));
        assert_eq!("VOICE".parse::<CommunicationKind>().ok(), Some(CommunicationKind::Voice));
        assert!("fax".parse::<CommunicationKind>().is_err());
        assert!(!CommunicationKind::Text.is_interactive());
        assert!(CommunicationKind::Video.is_interactive());
    }
}
