//! # Parley Transport
//!
//! Network implementations of the client seams defined in `parley-core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  parley-framework    │  (facade, dispatch loop)
//! ├──────────────────────┤
//! │  parley-core         │  (ChatClient / EventFeed traits)
//! ├──────────────────────┤
//! │  parley-transport    │  <- This crate (implementations)
//! ├──────────────────────┤
//! │  HTTP (REST)         │
//! └──────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `rest-client` (default): [`RestClient`], built on `reqwest`.
//!
//! The wire model ([`wire`]) and the long-poll state machine ([`EventQueue`])
//! are always available; the queue runs against any [`QueueApi`].

pub mod queue;
pub mod wire;

#[cfg(feature = "rest-client")]
pub mod rest;

pub use queue::{EventQueue, QueueApi};

#[cfg(feature = "rest-client")]
pub use rest::{RestClient, RestClientConfig};
