//! HTTP implementation of the client seams.
//!
//! ```rust,ignore
//! let client = Arc::new(RestClient::new(
//!     RestClientConfig::new("https://chat.example.com", "bot@example.com", api_key)
//!         .client_name("ParleyHelloworldBot"),
//! )?);
//! let feed = client.event_queue();
//! ```

mod client;

pub use client::{RestClient, RestClientConfig};
