//! # Orbit Satellite Crate
//!
//! The satellite is the coordinating service of the Orbit network. It
//! answers two questions: "where should data go" (node overlay cache) and
//! "how much bandwidth moved, signed by whom" (bandwidth agreements).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SATELLITE                            │
//! │                                                             │
//! │  ┌───────────────┐                 ┌─────────────────────┐  │
//! │  │ overlay::Cache│                 │ bwagreement::Server │  │
//! │  │ (node registry│                 │ (verify + persist   │  │
//! │  │  + selection) │                 │  signed receipts)   │  │
//! │  └───────┬───────┘                 └──────────┬──────────┘  │
//! │          │                                    │             │
//! │          ▼                                    ▼             │
//! │  ┌───────────────┐                 ┌─────────────────────┐  │
//! │  │ OverlayStore  │                 │ AgreementStore      │  │
//! │  │ (capability)  │                 │ CertStore           │  │
//! │  └───────────────┘                 └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage backends are capabilities; this crate ships in-memory
//! implementations used by tests and small deployments.

pub mod bwagreement;
pub mod overlay;

pub use bwagreement::{AgreementError, Server, UplinkStat};
pub use overlay::{Cache, OverlayError};
