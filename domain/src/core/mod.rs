//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: caller-contract violations
//! - [`text`]: small text helpers used for log previews

pub mod error;
pub mod text;
