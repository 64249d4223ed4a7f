//! Endpoint configuration shared by the OAuth client and the profile fetcher.
//!
//! The module exposes the provider defaults, the options builder callers fill in, and the
//! immutable [`EndpointConfig`] resolved from both at construction time.

/// Builder API for caller-supplied strategy options.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::Scope, error::ConfigError};

/// Adapter name used by the host framework for routing and dispatch.
pub const STRATEGY_NAME: &str = "twitch";
/// Default consent-redirect endpoint.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://id.twitch.tv/oauth2/authorize";
/// Default code-for-token exchange endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
/// Default user-info endpoint.
pub const DEFAULT_PROFILE_URL: &str = "https://api.twitch.tv/helix/users";
/// Header carrying the client identifier on every API request.
pub const CLIENT_ID_HEADER: &str = "Client-ID";

/// Endpoint set used by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the end-user is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// User-info endpoint queried with the access token.
	pub profile: Url,
}

/// Immutable provider configuration, built once from [`StrategyOptions`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
	/// Endpoint definitions, with provider defaults substituted where omitted.
	pub endpoints: ProviderEndpoints,
	/// Client identifier issued by the provider.
	pub client_id: String,
	/// Client secret issued by the provider.
	pub client_secret: String,
	/// Redirect URI registered with the provider.
	pub callback_url: Option<Url>,
	/// Requested scopes, in caller order.
	pub scope: Vec<Scope>,
	/// Headers attached to every authenticated GET; always carries [`CLIENT_ID_HEADER`].
	pub custom_headers: BTreeMap<String, String>,
	/// Signing certificate used by hosts to decode OIDC tokens.
	pub pem: Option<String>,
}
impl EndpointConfig {
	/// Resolves caller options against the provider defaults.
	///
	/// Omitted endpoints fall back to the provider's known URLs, and the client-identifier
	/// header is injected from `client_id`, replacing any caller value for that header name
	/// regardless of case. Credentials are not validated here; the OAuth client does that when
	/// it is constructed.
	pub fn from_options(options: StrategyOptions) -> Result<Self, ConfigError> {
		let StrategyOptions {
			client_id,
			client_secret,
			callback_url,
			scope,
			authorization_url,
			token_url,
			profile_url,
			pem,
			mut custom_headers,
		} = options;
		let authorization =
			resolve_url("authorization", authorization_url, DEFAULT_AUTHORIZATION_URL)?;
		let token = resolve_url("token", token_url, DEFAULT_TOKEN_URL)?;
		let profile = resolve_url("profile", profile_url, DEFAULT_PROFILE_URL)?;

		custom_headers.retain(|name, _| !name.eq_ignore_ascii_case(CLIENT_ID_HEADER));
		custom_headers.insert(CLIENT_ID_HEADER.into(), client_id.clone());

		Ok(Self {
			endpoints: ProviderEndpoints { authorization, token, profile },
			client_id,
			client_secret,
			callback_url,
			scope,
			custom_headers,
			pem,
		})
	}

	/// Key shared by every adapter instance that targets the same token host.
	pub fn cache_key(&self) -> String {
		format!("oauth2:{}", self.endpoints.token.host_str().unwrap_or_default())
	}
}
impl Debug for EndpointConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EndpointConfig")
			.field("endpoints", &self.endpoints)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("callback_url", &self.callback_url)
			.field("scope", &self.scope)
			.field("custom_headers", &self.custom_headers)
			.field("pem_set", &self.pem.is_some())
			.finish()
	}
}

fn resolve_url(
	endpoint: &'static str,
	supplied: Option<Url>,
	default: &str,
) -> Result<Url, ConfigError> {
	match supplied {
		Some(url) => Ok(url),
		None => Url::parse(default).map_err(|source| ConfigError::InvalidUrl { endpoint, source }),
	}
}
