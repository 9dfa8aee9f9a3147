//! Hike intake service.
//!
//! Accepts salary hike submissions over HTTP, checks the caller with a
//! reCAPTCHA-style verification service, validates and sanitizes the
//! payload, and appends it to the `hikes` collection as an unapproved record
//! awaiting moderation.
//!
//! Every request runs the same fail-fast pipeline ([`intake::HikeIntake`]):
//!
//! 1. bot check ([`verification`])
//! 2. validation and sanitization ([`validation`], [`sanitize`])
//! 3. persistence ([`store`], [`database`])
//!
//! Failures are reported as `invalid-argument`, `unauthenticated` or
//! `internal` ([`error::SubmitError`]).

pub mod auth_middleware;
pub mod config;
pub mod database;
pub mod error;
pub mod intake;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod secrets;
pub mod server;
pub mod state;
pub mod store;
pub mod types;
pub mod validation;
pub mod verification;
