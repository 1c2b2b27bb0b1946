//! Core contracts for phonelist.
//!
//! This crate defines the dialing-plan types, their validation, the lazy
//! enumerator over a subscriber digit space and the range partitioning used
//! by the worker pool.

pub mod enumerator;
pub mod error;
pub mod partition;
pub mod types;
pub mod validation;

pub use enumerator::{CandidateNumber, Enumerator};
pub use error::{Error, Result};
pub use partition::{Range, partition};
pub use types::{AreaCode, CountryCode, DialingPlan};
pub use validation::{validate_area_code, validate_country_code};

/// Default number of digits in an area code (NANP style).
pub const DEFAULT_AREA_CODE_DIGITS: usize = 3;

/// Default number of subscriber digits following the area code.
pub const DEFAULT_SUBSCRIBER_DIGITS: usize = 7;

/// Largest subscriber length whose space still fits in a `u64`.
pub const MAX_SUBSCRIBER_DIGITS: usize = 18;

/// Largest accepted area code length.
pub const MAX_AREA_CODE_DIGITS: usize = 5;

/// Largest accepted country code length (E.164).
pub const MAX_COUNTRY_CODE_DIGITS: usize = 3;
