//! Marriage bonus and penalty calculator.
//!
//! The [`core`] module builds household scenarios, runs them through a
//! [`engine::CalculationEngine`], and decomposes married against separate
//! filings; [`api`] exposes the calculator over HTTP and the command line.

pub mod api;
pub mod core;
pub mod engine;
