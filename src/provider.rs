//! Provider-facing configuration (data) and the strategy adapter (behavior).
//!
//! `descriptor` resolves caller options plus provider defaults into an immutable
//! [`EndpointConfig`]. `strategy` defines the [`Strategy`] capability set consumed by the host
//! framework and implements it for the provider in [`TwitchStrategy`]. `profile` holds the
//! [`ProfileFetcher`] that turns an access token into a normalized profile.

pub mod descriptor;
pub mod profile;
pub mod strategy;

pub use descriptor::*;
pub use profile::*;
pub use strategy::*;
