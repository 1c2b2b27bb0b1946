use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{validate_area_code, validate_country_code};
use crate::{
    DEFAULT_AREA_CODE_DIGITS, DEFAULT_SUBSCRIBER_DIGITS, MAX_AREA_CODE_DIGITS,
    MAX_SUBSCRIBER_DIGITS,
};

/// Digit lengths that stay constant for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialingPlan {
    /// Expected length of every area code.
    pub area_code_digits: usize,
    /// Number of subscriber digits enumerated after the area code.
    pub subscriber_digits: usize,
}

impl Default for DialingPlan {
    fn default() -> Self {
        Self {
            area_code_digits: DEFAULT_AREA_CODE_DIGITS,
            subscriber_digits: DEFAULT_SUBSCRIBER_DIGITS,
        }
    }
}

impl DialingPlan {
    pub fn new(area_code_digits: usize, subscriber_digits: usize) -> Result<Self> {
        let plan = Self {
            area_code_digits,
            subscriber_digits,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check that both lengths are within the supported bounds.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_AREA_CODE_DIGITS).contains(&self.area_code_digits) {
            return Err(Error::InvalidConfig(format!(
                "area code length must be between 1 and {MAX_AREA_CODE_DIGITS}, got {}",
                self.area_code_digits
            )));
        }
        if !(1..=MAX_SUBSCRIBER_DIGITS).contains(&self.subscriber_digits) {
            return Err(Error::InvalidConfig(format!(
                "subscriber length must be between 1 and {MAX_SUBSCRIBER_DIGITS}, got {}",
                self.subscriber_digits
            )));
        }
        Ok(())
    }

    /// Number of candidates per area code, `10^subscriber_digits`.
    pub fn space_size(&self) -> u64 {
        10_u64.pow(self.subscriber_digits as u32)
    }
}

/// Validated country calling code, e.g. `1` or `44`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        validate_country_code(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated area code whose length matches the dialing plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaCode(String);

impl AreaCode {
    pub fn parse(value: &str, plan: &DialingPlan) -> Result<Self> {
        let value = value.trim();
        validate_area_code(value, plan)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
