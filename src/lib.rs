//! # HubSpot Workflow Actions Library
//!
//! Core functionality for the HubSpot workflow actions service. Manages the
//! OAuth credential lifecycle per hub and drives the disassociation decision
//! engine behind the custom workflow action through a typed HubSpot client.

pub mod config;
pub mod db;
pub mod disassociation;
pub mod error;
pub mod handlers;
pub mod hubspot;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod token_refresh;
pub use migration;
