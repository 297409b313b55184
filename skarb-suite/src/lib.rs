//! # Skarb Suite
//!
//! End-to-end scenarios for the Skarb volunteer platform. Scenarios drive the
//! application through an [`app::Application`] and cross-check what it persisted
//! with the `skarb-verify` [`Verifier`](skarb_verify::Verifier).
//!
//! ## Modules
//!
//! - `app`: application driver trait and the database-backed driver
//! - `config`: suite configuration from the environment
//! - `fixtures`: generated volunteers, partners, NGOs and tasks
//! - `report`: step-by-step scenario reports
//! - `scenarios`: the end-to-end test cases

pub mod app;
pub mod config;
pub mod fixtures;
pub mod report;
pub mod scenarios;
