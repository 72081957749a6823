//! Shared limits, identifier validation and small numeric helpers.

pub mod validation;
