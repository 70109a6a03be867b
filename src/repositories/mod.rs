//! # Repositories
//!
//! Database access layer wrapping SeaORM operations per entity.

pub mod credential;

pub use credential::CredentialRepository;
