//! # Application Module
//!
//! - [`tooling`] - tool routing across internal handlers and external processes
//! - [`agent`] - autonomous contract execution

pub mod agent;
pub mod tooling;
