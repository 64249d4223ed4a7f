//! Generic OAuth 2.0 client configured for the provider.
//!
//! [`OAuth2Client`] owns an `oauth2` crate client (authorize URL + code exchange) together with
//! the request policy used for authenticated GETs: the authorization scheme, whether the token
//! travels in the `Authorization` header or as a query parameter, and the custom headers
//! attached to every call. [`ResourceClient`] is the narrow seam the profile fetcher depends on.

pub use oauth2;

// crates.io
use oauth2::{
	AccessToken, AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, Client, ClientId,
	ClientSecret, CsrfToken, EndpointNotSet, EndpointSet, HttpClientError, HttpRequest,
	RedirectUrl, RefreshToken, RequestTokenError, Scope as OAuthScope, StandardRevocableToken,
	TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
	http::{
		HeaderMap, HeaderName, HeaderValue, Method, Request,
		header::AUTHORIZATION,
	},
};
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{Scope, TokenGrant, format_scope},
	error::{ConfigError, TransportError},
	http::HttpTransport,
	provider::EndpointConfig,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Query parameter carrying the token when the `Authorization` header is disabled for GETs.
pub const ACCESS_TOKEN_NAME: &str = "access_token";

/// Extra parameters merged into the authorization redirect or the token request.
pub type AuthorizationParams = BTreeMap<String, JsonValue>;

type ConfiguredClient = Client<
	BasicErrorResponse,
	ProviderTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type UnconfiguredClient = Client<
	BasicErrorResponse,
	ProviderTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
>;

/// Scheme prefixed to the access token in the `Authorization` header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
	/// `Authorization: Bearer <token>`.
	#[default]
	Bearer,
	/// `Authorization: OAuth <token>`.
	OAuth,
	/// Any other scheme.
	Custom(String),
}
impl AuthMethod {
	/// Returns the scheme as written in the header.
	pub fn as_str(&self) -> &str {
		match self {
			AuthMethod::Bearer => "Bearer",
			AuthMethod::OAuth => "OAuth",
			AuthMethod::Custom(scheme) => scheme,
		}
	}
}
impl Display for AuthMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Body of a completed GET, as delivered by the underlying client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
	/// Body already decoded as text.
	Text(String),
	/// Raw body bytes.
	Bytes(Vec<u8>),
}
impl ResponseBody {
	/// Coerces the body to text, decoding bytes as UTF-8 with replacement characters.
	pub fn into_text(self) -> String {
		match self {
			ResponseBody::Text(text) => text,
			ResponseBody::Bytes(bytes) => match String::from_utf8(bytes) {
				Ok(text) => text,
				Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
			},
		}
	}
}
impl From<String> for ResponseBody {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<&str> for ResponseBody {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<Vec<u8>> for ResponseBody {
	fn from(value: Vec<u8>) -> Self {
		Self::Bytes(value)
	}
}

/// Authenticated GET capability consumed by the profile fetcher.
///
/// `Ok(None)` means the call completed without any body at all, which is distinct from an
/// empty body (`Ok(Some(..))` holding no bytes).
pub trait ResourceClient: Send + Sync {
	/// Issues a GET to `url` authorized with `access_token`.
	fn get<'a>(
		&'a self,
		url: &'a Url,
		access_token: &'a str,
	) -> BoxFuture<'a, Result<Option<ResponseBody>, TransportError>>;
}

/// OAuth 2.0 client bound to one provider configuration and one transport.
pub struct OAuth2Client<C>
where
	C: ?Sized + HttpTransport,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	client_id: String,
	client_secret: String,
	custom_headers: HeaderMap,
	auth_method: AuthMethod,
	use_authorization_header_for_get: bool,
}
impl<C> OAuth2Client<C>
where
	C: ?Sized + HttpTransport,
{
	/// Validates the configuration and builds the client.
	///
	/// `client_id`, `client_secret`, and `callback_url` are required; empty strings count as
	/// missing. Client credentials are sent in the token request body.
	pub fn new(config: &EndpointConfig, http_client: impl Into<Arc<C>>) -> Result<Self> {
		if config.client_id.is_empty() {
			return Err(ConfigError::missing("client_id").into());
		}
		if config.client_secret.is_empty() {
			return Err(ConfigError::missing("client_secret").into());
		}

		let callback_url =
			config.callback_url.as_ref().ok_or_else(|| ConfigError::missing("callback_url"))?;
		let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidUrl { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidUrl { endpoint: "token", source })?;
		let redirect_url = RedirectUrl::new(callback_url.to_string())
			.map_err(|source| ConfigError::InvalidUrl { endpoint: "callback", source })?;
		let oauth_client: ConfiguredClient =
			UnconfiguredClient::new(ClientId::new(config.client_id.clone()))
				.set_client_secret(ClientSecret::new(config.client_secret.clone()))
				.set_auth_uri(auth_url)
				.set_token_uri(token_url)
				.set_redirect_uri(redirect_url)
				.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			custom_headers: header_map(&config.custom_headers)?,
			auth_method: AuthMethod::default(),
			use_authorization_header_for_get: false,
		})
	}

	/// Sets the scheme used when attaching access tokens to outbound requests.
	pub fn set_auth_method(&mut self, method: AuthMethod) {
		self.auth_method = method;
	}

	/// Chooses between the `Authorization` header (true) and the `access_token` query
	/// parameter (false) for GET requests.
	pub fn use_authorization_header_for_get(&mut self, enabled: bool) {
		self.use_authorization_header_for_get = enabled;
	}

	/// Scheme used in the `Authorization` header.
	pub fn auth_method(&self) -> &AuthMethod {
		&self.auth_method
	}

	/// Whether GETs carry the token in the `Authorization` header.
	pub fn uses_authorization_header_for_get(&self) -> bool {
		self.use_authorization_header_for_get
	}

	/// Configured client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Configured client secret. Callers must avoid logging it.
	pub fn client_secret(&self) -> &str {
		&self.client_secret
	}

	/// Configured authorization endpoint.
	pub fn authorization_url(&self) -> &Url {
		self.oauth_client.auth_uri().url()
	}

	/// Configured token endpoint.
	pub fn token_url(&self) -> &Url {
		self.oauth_client.token_uri().url()
	}

	/// Headers attached to every GET.
	pub fn custom_headers(&self) -> &HeaderMap {
		&self.custom_headers
	}

	/// Builds the authorization redirect URL and the random `state` it carries.
	///
	/// Scopes keep caller order and are joined with a single space; `params` are appended
	/// after the standard parameters.
	pub fn authorize_url(&self, scope: &[Scope], params: &AuthorizationParams) -> (Url, CsrfToken) {
		let mut request = self.oauth_client.authorize_url(CsrfToken::new_random);

		if let Some(scope) = format_scope(scope) {
			request = request.add_scope(OAuthScope::new(scope));
		}
		for (name, value) in params {
			request = request.add_extra_param(name.as_str(), param_value(value));
		}

		request.url()
	}

	/// Exchanges an authorization code for tokens.
	pub async fn exchange_code(
		&self,
		code: &str,
		params: &AuthorizationParams,
	) -> Result<TokenGrant> {
		let handle = self.http_client.handle();
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		for (name, value) in params {
			request = request.add_extra_param(name.as_str(), param_value(value));
		}

		let response = request.request_async(&handle).await.map_err(map_request_error)?;

		Ok(grant_from_response(&response))
	}

	/// Builds the authenticated GET request according to the configured policy.
	pub fn build_get_request(
		&self,
		url: &Url,
		access_token: &str,
	) -> Result<HttpRequest, TransportError> {
		let mut target = url.clone();
		let mut builder = Request::builder().method(Method::GET);

		if self.use_authorization_header_for_get {
			builder = builder.header(AUTHORIZATION, format!("{} {access_token}", self.auth_method));
		} else {
			target.query_pairs_mut().append_pair(ACCESS_TOKEN_NAME, access_token);
		}

		for (name, value) in self.custom_headers.iter() {
			builder = builder.header(name, value);
		}

		Ok(builder.uri(target.as_str()).body(Vec::new())?)
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient> {
	/// Builds a client backed by a default reqwest transport.
	pub fn with_reqwest(config: &EndpointConfig) -> Result<Self> {
		Self::new(config, ReqwestHttpClient::default())
	}
}
impl<C> ResourceClient for OAuth2Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn get<'a>(
		&'a self,
		url: &'a Url,
		access_token: &'a str,
	) -> BoxFuture<'a, Result<Option<ResponseBody>, TransportError>> {
		Box::pin(async move {
			let request = self.build_get_request(url, access_token)?;
			let handle = self.http_client.handle();
			let response = handle.call(request).await.map_err(TransportError::from)?;
			let status = response.status();

			if !status.is_success() {
				return Err(TransportError::Status {
					status: status.as_u16(),
					body: String::from_utf8_lossy(response.body()).into_owned(),
				});
			}

			Ok(Some(ResponseBody::Bytes(response.into_body())))
		})
	}
}
impl<C> Debug for OAuth2Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("authorization_url", self.authorization_url())
			.field("token_url", self.token_url())
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("auth_method", &self.auth_method)
			.field("use_authorization_header_for_get", &self.use_authorization_header_for_get)
			.finish()
	}
}

/// Token endpoint response.
///
/// The provider returns `scope` as a JSON array, while RFC 6749 specifies a space-delimited
/// string; both forms are accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderTokenResponse {
	access_token: AccessToken,
	token_type: BasicTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
	#[serde(
		default,
		deserialize_with = "deserialize_scope",
		skip_serializing_if = "Option::is_none"
	)]
	scope: Option<Vec<OAuthScope>>,
}
impl TokenResponse for ProviderTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &Self::TokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<OAuthScope>> {
		self.scope.as_ref()
	}
}

fn deserialize_scope<'de, D>(deserializer: D) -> Result<Option<Vec<OAuthScope>>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawScope {
		List(Vec<String>),
		Delimited(String),
	}

	let raw = <Option<RawScope>>::deserialize(deserializer)?;

	Ok(raw.map(|raw| match raw {
		RawScope::List(list) => list.into_iter().map(OAuthScope::new).collect(),
		RawScope::Delimited(value) => value
			.split(' ')
			.filter(|token| !token.is_empty())
			.map(|token| OAuthScope::new(token.to_owned()))
			.collect(),
	}))
}

fn grant_from_response(response: &ProviderTokenResponse) -> TokenGrant {
	let issued_at = OffsetDateTime::now_utc();
	let mut grant = TokenGrant::new(response.access_token().secret().to_owned(), issued_at);

	if let Some(refresh) = response.refresh_token() {
		grant = grant.with_refresh_token(refresh.secret().to_owned());
	}
	if let Some(expires_in) = response.expires_in() {
		let secs = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);

		grant = grant.with_expires_in(Duration::seconds(secs));
	}
	if let Some(scopes) = response.scopes() {
		grant = grant.with_scope(scopes.iter().map(|scope| scope.as_str().to_owned()));
	}

	grant
}

fn map_request_error<E>(err: RequestTokenError<HttpClientError<E>, BasicErrorResponse>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => Error::Token {
			code: response.error().as_ref().to_owned(),
			description: response.error_description().cloned(),
		},
		RequestTokenError::Request(error) => Error::TokenExchange { source: error.into() },
		RequestTokenError::Parse(source, _body) => Error::TokenResponse { source },
		RequestTokenError::Other(message) =>
			Error::TokenExchange { source: TransportError::Other(message) },
	}
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
	let mut map = HeaderMap::new();

	for (name, value) in headers {
		let invalid = || ConfigError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		map.insert(header_name, header_value);
	}

	Ok(map)
}

/// Renders a parameter value the way it appears on the wire (`true`, `false`, text, numbers).
pub(crate) fn param_value(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::provider::{CLIENT_ID_HEADER, StrategyOptions};

	fn config() -> EndpointConfig {
		StrategyOptions::new("client-abc", "secret-abc")
			.callback_url(
				Url::parse("http://localhost:8453/auth/callback")
					.expect("Callback URL fixture should parse."),
			)
			.scope([Scope::BitsRead, Scope::UserReadEmail])
			.custom_header("X-Trace", "on")
			.build()
			.expect("Options fixture should resolve.")
	}

	fn client() -> OAuth2Client<ReqwestHttpClient> {
		OAuth2Client::with_reqwest(&config()).expect("Client fixture should build.")
	}

	#[test]
	fn missing_credentials_are_configuration_errors() {
		let mut missing_id = config();

		missing_id.client_id.clear();

		let err = OAuth2Client::with_reqwest(&missing_id).expect_err("Empty client id must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingOption { option: "client_id" })
		));

		let mut missing_secret = config();

		missing_secret.client_secret.clear();

		let err =
			OAuth2Client::with_reqwest(&missing_secret).expect_err("Empty secret must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingOption { option: "client_secret" })
		));

		let mut missing_callback = config();

		missing_callback.callback_url = None;

		let err =
			OAuth2Client::with_reqwest(&missing_callback).expect_err("Missing callback must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingOption { option: "callback_url" })
		));
	}

	#[test]
	fn invalid_custom_headers_are_rejected() {
		let mut config = config();

		config.custom_headers.insert("bad header".into(), "value".into());

		let err = OAuth2Client::with_reqwest(&config).expect_err("Invalid header names must fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeader { .. })));
	}

	#[test]
	fn authorize_url_round_trips_scopes_in_order() {
		let client = client();
		let mut params = AuthorizationParams::new();

		params.insert("force_verify".into(), JsonValue::Bool(true));

		let (url, state) = client.authorize_url(&[Scope::UserReadEmail, Scope::BitsRead], &params);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.host_str(), Some("id.twitch.tv"));
		assert_eq!(url.path(), "/oauth2/authorize");
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"client-abc".into()));
		assert_eq!(
			pairs.get("redirect_uri"),
			Some(&"http://localhost:8453/auth/callback".into())
		);
		assert_eq!(pairs.get("state"), Some(state.secret()));
		assert_eq!(pairs.get("force_verify"), Some(&"true".into()));

		let scope = pairs.get("scope").expect("Scope parameter should be present.");

		assert_eq!(scope, "user:read:email bits:read");
		assert_eq!(
			crate::auth::parse_scope(scope).expect("Scope parameter should parse back."),
			vec![Scope::UserReadEmail, Scope::BitsRead]
		);
	}

	#[test]
	fn get_requests_follow_the_configured_policy() {
		let mut client = client();
		let url = Url::parse("https://api.twitch.tv/helix/users").expect("URL should parse.");

		client.set_auth_method(AuthMethod::Bearer);
		client.use_authorization_header_for_get(true);

		let request = client.build_get_request(&url, "tok-123").expect("Request should build.");

		assert_eq!(request.method(), &Method::GET);
		assert_eq!(request.uri().to_string(), "https://api.twitch.tv/helix/users");
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer tok-123")
		);
		assert_eq!(
			request.headers().get(CLIENT_ID_HEADER).and_then(|v| v.to_str().ok()),
			Some("client-abc")
		);
		assert_eq!(request.headers().get("x-trace").and_then(|v| v.to_str().ok()), Some("on"));

		client.use_authorization_header_for_get(false);

		let request = client.build_get_request(&url, "tok-123").expect("Request should build.");

		assert!(request.headers().get(AUTHORIZATION).is_none());
		assert_eq!(
			request.uri().to_string(),
			"https://api.twitch.tv/helix/users?access_token=tok-123"
		);
	}

	#[test]
	fn token_responses_accept_array_and_delimited_scopes() {
		let array: ProviderTokenResponse = serde_json::from_str(
			r#"{
				"access_token": "a",
				"refresh_token": "r",
				"expires_in": 14400,
				"scope": ["bits:read", "user:read:email"],
				"token_type": "bearer"
			}"#,
		)
		.expect("Array scopes should deserialize.");
		let grant = grant_from_response(&array);

		assert_eq!(grant.access_token.expose(), "a");
		assert_eq!(grant.refresh_token.as_ref().map(|t| t.expose()), Some("r"));
		assert_eq!(grant.scope, vec!["bits:read".to_owned(), "user:read:email".to_owned()]);
		assert!(grant.expires_at.is_some());

		let delimited: ProviderTokenResponse = serde_json::from_str(
			r#"{"access_token":"a","scope":"bits:read user:read:email","token_type":"bearer"}"#,
		)
		.expect("Delimited scopes should deserialize.");

		assert_eq!(grant_from_response(&delimited).scope.len(), 2);
		assert_eq!(grant_from_response(&delimited).expires_at, None);
	}

	#[test]
	fn param_values_render_like_query_strings() {
		assert_eq!(param_value(&JsonValue::Bool(false)), "false");
		assert_eq!(param_value(&JsonValue::String("x".into())), "x");
		assert_eq!(param_value(&serde_json::json!(3)), "3");
	}
}
