//! HubSpot API access
//!
//! Typed wrappers over the HubSpot OAuth and CRM REST endpoints. All calls
//! take an already-resolved access token; token lifecycle lives in
//! [`crate::token_refresh`].

pub mod client;
pub mod types;

pub use client::{HubSpotClient, HubSpotError};
pub use types::{AssociationEdge, AssociationType, OptionItem, TokenInfo, TokenResponse};
