//! # Orbit Common Crate
//!
//! Shared types for the Orbit storage network.
//!
//! ## Modules
//! - `crypto`: Ed25519 sign/verify helpers and hex utilities
//! - `id`: fixed-size node and piece identifiers
//! - `identity`: this process's identity and authenticated peer identities
//! - `node`: node records and selection criteria
//! - `config`: configuration management
//! - `time`: unix-seconds helpers

pub mod config;
pub mod crypto;
pub mod id;
pub mod identity;
pub mod node;
pub mod time;

pub use id::{NodeId, PieceId};
pub use identity::{FullIdentity, PeerIdentity};
pub use node::{NodeCriteria, NodeRecord};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
