//! Auth-domain models: the provider scope catalog, normalized profiles, and token secrets.

pub mod profile;
pub mod scope;
pub mod token;

pub use profile::*;
pub use scope::*;
pub use token::{grant::*, secret::*};
