//! Recipient contact normalization.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("contact {0:?} contains no digits")]
    NoDigits(String),
}

/// Regional dialing rules used to complete local numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialingPlan {
    pub country_code: String,
    pub local_number_len: usize,
}

impl Default for DialingPlan {
    fn default() -> Self {
        Self {
            country_code: "91".to_string(),
            local_number_len: 10,
        }
    }
}

impl DialingPlan {
    /// Strips everything but digits; a number of exactly local length gets
    /// the country code prefixed. Anything else passes through as digits.
    pub fn normalize(&self, raw: &str) -> Result<Address, AddressError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(AddressError::NoDigits(raw.to_string()));
        }
        if digits.len() == self.local_number_len {
            return Ok(Address(format!("{}{}", self.country_code, digits)));
        }
        Ok(Address(digits))
    }
}

/// An international, digits-only recipient number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Chat identifier understood by the messaging network.
    pub fn chat_id(&self) -> String {
        format!("{}@c.us", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
