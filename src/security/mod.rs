//! Security Module
//!
//! Request validation for the query API.

pub mod validation;

pub use validation::{QueryValidator, ValidationError, ValidationResult};
