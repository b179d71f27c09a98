//! Credential and digit types.
//!
//! A [`Credential`] is exactly five digits, each in `1..=9`. Construction is
//! the only place that checks this, so any `Credential` value in the system
//! is known to be well-formed. Raw bytes off the link stay raw until they are
//! parsed with [`Credential::from_wire`].

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// Number of digits in a credential.
pub const CREDENTIAL_LEN: usize = 5;

/// A single credential digit in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digit(u8);

impl Digit {
    /// Smallest accepted digit.
    pub const MIN: u8 = 1;
    /// Largest accepted digit.
    pub const MAX: u8 = 9;

    /// Validate a digit value.
    pub const fn new(value: u8) -> Result<Self, ProtocolError> {
        if value >= Self::MIN && value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(ProtocolError::DigitOutOfRange { value })
        }
    }

    /// Numeric value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

/// Five-digit shared secret.
///
/// `Debug` masks the digits so credentials never end up in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Credential([Digit; CREDENTIAL_LEN]);

impl Credential {
    /// Build from validated digits.
    pub const fn new(digits: [Digit; CREDENTIAL_LEN]) -> Self {
        Self(digits)
    }

    /// Build from a slice of digits, which must be exactly
    /// [`CREDENTIAL_LEN`] long.
    pub fn from_digits(digits: &[Digit]) -> Result<Self, ProtocolError> {
        let digits: [Digit; CREDENTIAL_LEN] = digits.try_into().map_err(|_| {
            ProtocolError::InvalidLength { expected: CREDENTIAL_LEN, actual: digits.len() }
        })?;
        Ok(Self(digits))
    }

    /// Parse five raw link bytes.
    pub fn from_wire(bytes: [u8; CREDENTIAL_LEN]) -> Result<Self, ProtocolError> {
        let mut digits = [Digit(Digit::MIN); CREDENTIAL_LEN];
        for (position, (slot, value)) in digits.iter_mut().zip(bytes).enumerate() {
            *slot = Digit::new(value)
                .map_err(|_| ProtocolError::InvalidCredentialDigit { position, value })?;
        }
        Ok(Self(digits))
    }

    /// Raw link bytes, in transmission order.
    pub fn to_wire(&self) -> [u8; CREDENTIAL_LEN] {
        self.0.map(Digit::get)
    }

    /// Digits in order.
    pub const fn digits(&self) -> &[Digit; CREDENTIAL_LEN] {
        &self.0
    }

    /// Position-for-position comparison, stopping at the first difference.
    pub fn matches(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(*****)")
    }
}

impl TryFrom<[u8; CREDENTIAL_LEN]> for Credential {
    type Error = ProtocolError;

    fn try_from(bytes: [u8; CREDENTIAL_LEN]) -> Result<Self, Self::Error> {
        Self::from_wire(bytes)
    }
}

impl FromStr for Credential {
    type Err = ProtocolError;

    /// Parses the decimal form, e.g. `"12345"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) => Digit::new(d as u8),
                None => Err(ProtocolError::NotADigit { character: c }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_digits(&digits)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn digit_bounds() {
        assert!(Digit::new(0).is_err());
        assert!(Digit::new(1).is_ok());
        assert!(Digit::new(9).is_ok());
        assert_eq!(Digit::new(10), Err(ProtocolError::DigitOutOfRange { value: 10 }));
    }

    #[test]
    fn from_wire_reports_position() {
        let err = Credential::from_wire([1, 2, 0, 4, 5]).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidCredentialDigit { position: 2, value: 0 });
    }

    #[test]
    fn from_digits_requires_exact_length() {
        let four = [Digit::new(1).unwrap(); 4];
        assert_eq!(
            Credential::from_digits(&four),
            Err(ProtocolError::InvalidLength { expected: 5, actual: 4 })
        );
    }

    #[test]
    fn parse_decimal() {
        let credential: Credential = "12345".parse().unwrap();
        assert_eq!(credential.to_wire(), [1, 2, 3, 4, 5]);
        assert!("1234".parse::<Credential>().is_err());
        assert!("12a45".parse::<Credential>().is_err());
        assert!("10345".parse::<Credential>().is_err());
    }

    #[test]
    fn debug_is_masked() {
        let credential: Credential = "98765".parse().unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(*****)");
    }

    #[test]
    fn matching_is_positional() {
        let a: Credential = "12345".parse().unwrap();
        let b: Credential = "54321".parse().unwrap();
        assert!(a.matches(&a));
        assert!(!a.matches(&b));
    }

    fn wire_strategy() -> impl Strategy<Value = [u8; CREDENTIAL_LEN]> {
        prop::array::uniform5(1..=9u8)
    }

    proptest! {
        #[test]
        fn prop_matches_iff_wire_equal(a in wire_strategy(), b in wire_strategy()) {
            let ca = Credential::from_wire(a).unwrap();
            let cb = Credential::from_wire(b).unwrap();
            prop_assert_eq!(ca.matches(&cb), a == b);
            prop_assert_eq!(ca.matches(&cb), ca == cb);
        }

        #[test]
        fn prop_out_of_range_byte_never_parses(
            good in wire_strategy(),
            position in 0..CREDENTIAL_LEN,
            bad in prop_oneof![Just(0u8), 10..=255u8],
        ) {
            let mut bytes = good;
            bytes[position] = bad;
            prop_assert!(Credential::from_wire(bytes).is_err());
        }
    }
}
