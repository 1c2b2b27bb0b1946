use crate::MAX_COUNTRY_CODE_DIGITS;
use crate::error::{Error, Result};
use crate::types::DialingPlan;

/// Validate a country calling code.
///
/// The code must be 1 to 3 ASCII digits with a value greater than zero.
pub fn validate_country_code(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidConfig("country code is empty".to_string()));
    }
    if !is_digits(value) {
        return Err(Error::InvalidConfig(format!(
            "country code must contain digits only: {value:?}"
        )));
    }
    if value.len() > MAX_COUNTRY_CODE_DIGITS {
        return Err(Error::InvalidConfig(format!(
            "country code longer than {MAX_COUNTRY_CODE_DIGITS} digits: {value}"
        )));
    }
    if value.bytes().all(|byte| byte == b'0') {
        return Err(Error::InvalidConfig(format!(
            "country code must be greater than zero: {value}"
        )));
    }
    Ok(())
}

/// Validate an area code against the plan's expected length.
pub fn validate_area_code(value: &str, plan: &DialingPlan) -> Result<()> {
    plan.validate()?;
    if !is_digits(value) {
        return Err(Error::InvalidConfig(format!(
            "area code must contain digits only: {value:?}"
        )));
    }
    if value.len() != plan.area_code_digits {
        return Err(Error::InvalidConfig(format!(
            "area code {value} has {} digits, expected {}",
            value.len(),
            plan.area_code_digits
        )));
    }
    Ok(())
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
