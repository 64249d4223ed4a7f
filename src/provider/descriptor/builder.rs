// self
use crate::{_prelude::*, auth::Scope, error::ConfigError, provider::EndpointConfig};

/// Caller-supplied strategy options.
///
/// Deserializes from host configuration (snake_case keys, with the provider's conventional
/// camelCase spellings accepted as aliases) or is assembled with the fluent setters below.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// Client identifier issued by the provider.
	#[serde(alias = "clientID", alias = "clientId")]
	pub client_id: String,
	/// Client secret issued by the provider.
	#[serde(alias = "clientSecret")]
	pub client_secret: String,
	/// Redirect URI registered with the provider.
	#[serde(alias = "callbackURL", alias = "callbackUrl")]
	pub callback_url: Option<Url>,
	/// Requested scopes, in order.
	pub scope: Vec<Scope>,
	/// Overrides the default authorization endpoint.
	#[serde(alias = "authorizationURL", alias = "authorizationUrl")]
	pub authorization_url: Option<Url>,
	/// Overrides the default token endpoint.
	#[serde(alias = "tokenURL", alias = "tokenUrl")]
	pub token_url: Option<Url>,
	/// Overrides the default user-info endpoint.
	#[serde(alias = "profileURL", alias = "profileUrl")]
	pub profile_url: Option<Url>,
	/// Signing certificate used for decoding a user's OIDC token.
	pub pem: Option<String>,
	/// Additional headers for authenticated requests.
	#[serde(alias = "customHeaders")]
	pub custom_headers: BTreeMap<String, String>,
}
impl StrategyOptions {
	/// Creates options seeded with the provider-issued credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), ..Self::default() }
	}

	/// Sets the redirect URI.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Replaces the requested scopes.
	pub fn scope<I>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = Scope>,
	{
		self.scope = scope.into_iter().collect();

		self
	}

	/// Replaces the requested scopes with a space-delimited list of wire tokens.
	pub fn scope_str(self, value: &str) -> Result<Self, ConfigError> {
		let scope = crate::auth::parse_scope(value)?;

		Ok(self.scope(scope))
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the user-info endpoint.
	pub fn profile_url(mut self, url: Url) -> Self {
		self.profile_url = Some(url);

		self
	}

	/// Stores a signing certificate.
	pub fn pem(mut self, pem: impl Into<String>) -> Self {
		self.pem = Some(pem.into());

		self
	}

	/// Adds (or replaces) a custom header.
	pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom_headers.insert(name.into(), value.into());

		self
	}

	/// Resolves the options into an [`EndpointConfig`].
	pub fn build(self) -> Result<EndpointConfig, ConfigError> {
		EndpointConfig::from_options(self)
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("callback_url", &self.callback_url)
			.field("scope", &self.scope)
			.field("authorization_url", &self.authorization_url)
			.field("token_url", &self.token_url)
			.field("profile_url", &self.profile_url)
			.field("pem_set", &self.pem.is_some())
			.field("custom_headers", &self.custom_headers)
			.finish()
	}
}
