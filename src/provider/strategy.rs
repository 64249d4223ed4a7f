//! Strategy capability set consumed by the host framework, and its provider implementation.
//!
//! The host drives a [`Strategy`] through `authorization_params` before redirecting the
//! end-user, `authenticate` for both legs of the redirect, and `user_profile` once the code has
//! been exchanged. [`TwitchStrategy`] composes a configured [`OAuth2Client`] with a
//! [`ProfileFetcher`] and the host's [`Verify`] callback.

// self
use crate::{
	_prelude::*,
	auth::{Scope, TokenGrant, UserProfile},
	flows::{AuthenticateOutcome, AuthenticateRequest},
	http::HttpTransport,
	oauth::{AuthMethod, AuthorizationParams, OAuth2Client, ResourceClient},
	provider::{EndpointConfig, ProfileFetcher, STRATEGY_NAME, StrategyOptions},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Query parameter asking the provider to re-prompt for consent.
pub const FORCE_VERIFY_PARAM: &str = "force_verify";

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport.
pub type ReqwestTwitchStrategy<V> = TwitchStrategy<V, ReqwestHttpClient>;

/// Capability set the host framework dispatches to.
///
/// Implementors are `Send + Sync` so a single instance can serve concurrent authentication
/// attempts; per-request data always travels through the arguments.
pub trait Strategy: Send + Sync {
	/// Application user produced by a successful authentication.
	type User: Send;

	/// Name the host uses for routing and dispatch.
	fn name(&self) -> &str;

	/// Extra parameters merged into the authorization redirect.
	///
	/// Pure; the default adds nothing.
	fn authorization_params(&self, _options: &AuthenticateOptions) -> AuthorizationParams {
		AuthorizationParams::new()
	}

	/// Extra parameters merged into the token request. The default adds nothing.
	fn token_params(&self, _options: &AuthenticateOptions) -> AuthorizationParams {
		AuthorizationParams::new()
	}

	/// Fetches and normalizes the profile of the user owning `access_token`.
	fn user_profile<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, Result<UserProfile>>;

	/// Runs one leg of the authorization-code flow.
	fn authenticate<'a>(
		&'a self,
		request: AuthenticateRequest,
	) -> BoxFuture<'a, Result<AuthenticateOutcome<Self::User>>>;
}

/// Options the host supplies when initiating a login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticateOptions {
	/// Re-consent flag; `None` omits the parameter entirely.
	#[serde(alias = "forceVerify", skip_serializing_if = "Option::is_none")]
	pub force_verify: Option<bool>,
	/// Scopes overriding the configured ones for this login only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<Vec<Scope>>,
}
impl AuthenticateOptions {
	/// Sets the re-consent flag.
	pub fn force_verify(mut self, force_verify: bool) -> Self {
		self.force_verify = Some(force_verify);

		self
	}

	/// Overrides the requested scopes.
	pub fn scope<I>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = Scope>,
	{
		self.scope = Some(scope.into_iter().collect());

		self
	}
}

/// Verdict returned by the host's [`Verify`] callback.
#[derive(Clone, Debug, PartialEq)]
pub enum Verified<U> {
	/// The profile maps onto an application user.
	User {
		/// Application user.
		user: U,
		/// Optional details forwarded to the host.
		info: Option<JsonValue>,
	},
	/// The host refused the login.
	Rejected {
		/// Optional reason forwarded to the host.
		info: Option<JsonValue>,
	},
}

/// Host callback mapping tokens plus a normalized profile onto an application user.
pub trait Verify: Send + Sync {
	/// Application user type.
	type User: Send;

	/// Decides whether the authenticated profile is admitted.
	fn verify<'a>(
		&'a self,
		grant: &'a TokenGrant,
		profile: UserProfile,
	) -> BoxFuture<'a, Result<Verified<Self::User>>>;
}
impl<F, U> Verify for F
where
	F: Send + Sync + Fn(&TokenGrant, UserProfile) -> Result<Verified<U>>,
	U: 'static + Send,
{
	type User = U;

	fn verify<'a>(
		&'a self,
		grant: &'a TokenGrant,
		profile: UserProfile,
	) -> BoxFuture<'a, Result<Verified<Self::User>>> {
		let verdict = self(grant, profile);

		Box::pin(async move { verdict })
	}
}

/// Authorization-code strategy for the provider.
///
/// Construction resolves the options into an immutable [`EndpointConfig`] and configures the
/// client to send `Authorization: Bearer <token>` on GETs. The instance holds no per-request
/// state.
pub struct TwitchStrategy<V, C>
where
	C: ?Sized + HttpTransport,
{
	config: EndpointConfig,
	client: Arc<OAuth2Client<C>>,
	profile: ProfileFetcher,
	verify: V,
	key: String,
}
impl<V, C> TwitchStrategy<V, C>
where
	C: ?Sized + HttpTransport,
{
	/// Builds a strategy that reuses the caller-provided transport.
	pub fn with_transport(
		options: StrategyOptions,
		verify: V,
		transport: impl Into<Arc<C>>,
	) -> Result<Self> {
		let config = options.build()?;
		let mut client = OAuth2Client::new(&config, transport)?;

		client.set_auth_method(AuthMethod::Bearer);
		client.use_authorization_header_for_get(true);

		let client = Arc::new(client);
		let resource_client: Arc<dyn ResourceClient> = client.clone();
		let profile = ProfileFetcher::new(config.endpoints.profile.clone(), resource_client);
		let key = config.cache_key();

		Ok(Self { config, client, profile, verify, key })
	}

	/// Routes profile requests through `client` instead of the configured OAuth client.
	pub fn with_resource_client(mut self, client: Arc<dyn ResourceClient>) -> Self {
		self.profile = ProfileFetcher::new(self.config.endpoints.profile.clone(), client);

		self
	}

	/// Resolved provider configuration.
	pub fn config(&self) -> &EndpointConfig {
		&self.config
	}

	/// Configured OAuth client.
	pub fn client(&self) -> &OAuth2Client<C> {
		&self.client
	}

	/// Profile fetcher used by [`Strategy::user_profile`].
	pub fn profile_fetcher(&self) -> &ProfileFetcher {
		&self.profile
	}

	/// Host verification callback.
	pub fn verifier(&self) -> &V {
		&self.verify
	}

	/// Key shared by instances targeting the same token host.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Signing certificate supplied at construction, if any.
	pub fn pem(&self) -> Option<&str> {
		self.config.pem.as_deref()
	}
}
#[cfg(feature = "reqwest")]
impl<V> TwitchStrategy<V, ReqwestHttpClient> {
	/// Builds a strategy backed by a default reqwest transport.
	pub fn new(options: StrategyOptions, verify: V) -> Result<Self> {
		Self::with_transport(options, verify, ReqwestHttpClient::default())
	}
}
impl<V, C> Strategy for TwitchStrategy<V, C>
where
	V: Verify,
	C: ?Sized + HttpTransport,
{
	type User = V::User;

	fn name(&self) -> &str {
		STRATEGY_NAME
	}

	fn authorization_params(&self, options: &AuthenticateOptions) -> AuthorizationParams {
		let mut params = AuthorizationParams::new();

		if let Some(force_verify) = options.force_verify {
			params.insert(FORCE_VERIFY_PARAM.into(), JsonValue::Bool(force_verify));
		}

		params
	}

	fn user_profile<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, Result<UserProfile>> {
		Box::pin(self.profile.fetch(access_token))
	}

	fn authenticate<'a>(
		&'a self,
		request: AuthenticateRequest,
	) -> BoxFuture<'a, Result<AuthenticateOutcome<Self::User>>> {
		Box::pin(self.authenticate_request(request))
	}
}
impl<V, C> Debug for TwitchStrategy<V, C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TwitchStrategy")
			.field("name", &STRATEGY_NAME)
			.field("key", &self.key)
			.field("config", &self.config)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::PROVIDER,
		error::{ShapeError, TransportError},
		oauth::ResponseBody,
		provider::{
			CLIENT_ID_HEADER, DEFAULT_AUTHORIZATION_URL, DEFAULT_PROFILE_URL, DEFAULT_TOKEN_URL,
		},
	};

	struct CannedProfiles;
	impl ResourceClient for CannedProfiles {
		fn get<'a>(
			&'a self,
			url: &'a Url,
			access_token: &'a str,
		) -> BoxFuture<'a, Result<Option<ResponseBody>, TransportError>> {
			assert_eq!(url.as_str(), DEFAULT_PROFILE_URL);

			let reply = match access_token {
				"absent" => None,
				"blank" => Some(ResponseBody::from("")),
				"listless" => Some(ResponseBody::from(r#"{"data":[]}"#)),
				_ => Some(br#"{"data":[{"id":"9","login":"nine"}]}"#.to_vec().into()),
			};

			Box::pin(async move { Ok(reply) })
		}
	}

	fn reject(_: &TokenGrant, _: UserProfile) -> Result<Verified<()>> {
		Ok(Verified::Rejected { info: None })
	}

	type Verifier = fn(&TokenGrant, UserProfile) -> Result<Verified<()>>;

	fn strategy(options: StrategyOptions) -> ReqwestTwitchStrategy<Verifier> {
		TwitchStrategy::new(options, reject as Verifier).expect("Strategy fixture should build.")
	}

	fn options() -> StrategyOptions {
		StrategyOptions::new("fdsfadsffdfadsfdasfd", "fdsfdasfsaijfdsaiofjsdifo")
			.callback_url(
				Url::parse("http://localhost:8453/auth/callback")
					.expect("Callback URL fixture should parse."),
			)
			.scope([Scope::BitsRead, Scope::UserReadEmail])
	}

	#[test]
	fn construction_configures_the_client() {
		let strategy = strategy(options().pem("-----BEGIN CERTIFICATE-----"));
		let client = strategy.client();

		assert_eq!(strategy.name(), "twitch");
		assert_eq!(strategy.key(), "oauth2:id.twitch.tv");
		assert_eq!(strategy.pem(), Some("-----BEGIN CERTIFICATE-----"));
		assert_eq!(client.token_url().as_str(), DEFAULT_TOKEN_URL);
		assert_eq!(client.authorization_url().as_str(), DEFAULT_AUTHORIZATION_URL);
		assert_eq!(client.client_id(), "fdsfadsffdfadsfdasfd");
		assert_eq!(client.client_secret(), "fdsfdasfsaijfdsaiofjsdifo");
		assert_eq!(client.auth_method(), &AuthMethod::Bearer);
		assert!(client.uses_authorization_header_for_get());
		assert_eq!(
			client.custom_headers().get(CLIENT_ID_HEADER).and_then(|v| v.to_str().ok()),
			Some("fdsfadsffdfadsfdasfd")
		);
	}

	#[test]
	fn supplied_endpoints_are_used() {
		let token = Url::parse("https://auth.example.com/token").expect("Token URL should parse.");
		let authorize =
			Url::parse("https://auth.example.com/authorize").expect("Authorize URL should parse.");
		let strategy =
			strategy(options().token_url(token.clone()).authorization_url(authorize.clone()));

		assert_eq!(strategy.client().token_url(), &token);
		assert_eq!(strategy.client().authorization_url(), &authorize);
		assert_eq!(strategy.key(), "oauth2:auth.example.com");
		assert_eq!(strategy.pem(), None);
	}

	#[test]
	fn missing_callback_fails_construction() {
		let options = StrategyOptions::new("id", "secret");
		let err = TwitchStrategy::new(options, reject as Verifier)
			.expect_err("A missing callback URL must be rejected.");

		assert!(matches!(
			err,
			Error::Config(crate::error::ConfigError::MissingOption { option: "callback_url" })
		));
	}

	#[test]
	fn force_verify_is_forwarded_only_when_supplied() {
		let strategy = strategy(options());
		let forced =
			strategy.authorization_params(&AuthenticateOptions::default().force_verify(true));
		let relaxed =
			strategy.authorization_params(&AuthenticateOptions::default().force_verify(false));
		let absent = strategy.authorization_params(&AuthenticateOptions::default());

		assert_eq!(forced.get(FORCE_VERIFY_PARAM), Some(&JsonValue::Bool(true)));
		assert_eq!(forced.len(), 1);
		assert_eq!(relaxed.get(FORCE_VERIFY_PARAM), Some(&JsonValue::Bool(false)));
		assert_eq!(relaxed.len(), 1);
		assert!(absent.is_empty());
		assert!(strategy.token_params(&AuthenticateOptions::default()).is_empty());
	}

	#[test]
	fn options_accept_the_camel_case_flag() {
		let options: AuthenticateOptions = serde_json::from_str(r#"{ "forceVerify": true }"#)
			.expect("Options should deserialize.");

		assert_eq!(options.force_verify, Some(true));
		assert_eq!(options.scope, None);
	}

	#[tokio::test]
	async fn closure_verifiers_drive_the_strategy() {
		let strategy = TwitchStrategy::new(
			options(),
			|grant: &TokenGrant, profile: UserProfile| -> Result<Verified<String>> {
				Ok(Verified::User {
					user: format!("{}:{}", profile.id().unwrap_or_default(), grant.scope.len()),
					info: None,
				})
			},
		)
		.expect("Strategy should accept a closure verifier.")
		.with_resource_client(Arc::new(CannedProfiles));
		let profile = strategy.user_profile("tok").await.expect("Profile should decode.");
		let grant = TokenGrant::new("tok", OffsetDateTime::UNIX_EPOCH).with_scope(["bits:read"]);
		let verdict = strategy.verifier().verify(&grant, profile).await.expect("Verify succeeds.");

		assert_eq!(verdict, Verified::User { user: "9:1".into(), info: None });
	}

	#[tokio::test]
	async fn resource_client_override_feeds_the_profile_hook() {
		let strategy = strategy(options()).with_resource_client(Arc::new(CannedProfiles));

		assert_eq!(strategy.profile_fetcher().profile_url().as_str(), DEFAULT_PROFILE_URL);
		assert!(matches!(strategy.user_profile("absent").await, Err(Error::EmptyBody)));
		assert!(matches!(
			strategy.user_profile("blank").await,
			Err(Error::Parse(ref e)) if e.is_eof()
		));
		assert!(matches!(
			strategy.user_profile("listless").await,
			Err(Error::Shape(ShapeError::EmptyData))
		));

		let profile = strategy.user_profile("bytes").await.expect("Byte bodies should decode.");

		assert_eq!(profile.id(), Some("9"));
		assert_eq!(profile.username(), Some("nine"));
		assert_eq!(profile.provider(), Some(PROVIDER));
	}
}
