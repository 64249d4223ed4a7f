//! Token material returned by the authorization-code exchange.

pub mod grant;
pub mod secret;
