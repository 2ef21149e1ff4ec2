//! pricealert-cli
pub mod cli;
pub mod terminal;
