#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! pricealert-core
//!
//! The email one-time-password subscription flow behind price alerts:
//! requesting a code for an address, confirming it, and the resend rules
//! in between.

pub mod alert_request;
pub mod api;
pub mod client;
pub mod cooldown;
pub mod email;
pub mod error;
mod logging;
pub mod otp;
pub mod paths;
pub mod settings;
pub mod store;
pub mod ui;
pub mod verification;

#[cfg(test)]
mod test_utils;
