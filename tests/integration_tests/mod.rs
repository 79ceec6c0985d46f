//! Integration tests module
//!
//! End-to-end tests of the doffin client against a wiremock server standing
//! in for doffin.no, including:
//! - Search listing and notice detail retrieval
//! - Request pacing shared between callers
//! - Error mapping for missing notices and unrecognizable pages
//! - JSON tool dispatch

pub mod client_test;
pub mod error_scenarios;
pub mod pacing_test;
pub mod tools_test;
