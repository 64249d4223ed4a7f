//! Authorization-code dispatch: redirect issuance and callback handling.
//!
//! The host hands every request for the strategy's route to
//! [`Strategy::authenticate`](crate::provider::Strategy::authenticate). A request without a
//! `code` starts the flow with a redirect; the provider's redirect back is exchanged for tokens,
//! the profile is fetched, and the host's verify callback has the final word. Comparing the
//! returned `state` against the one issued in [`AuthenticateOutcome::Redirect`] stays with the
//! host, which owns the session.

// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{AuthenticateOptions, Strategy, TwitchStrategy, Verified, Verify},
};

/// OAuth `error` value the provider sends when the end-user declines consent.
pub const ACCESS_DENIED: &str = "access_denied";

/// One leg of the authorization-code flow, as seen by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticateRequest {
	/// Start a login: redirect the end-user to the provider.
	Begin(AuthenticateOptions),
	/// The provider redirected back to the callback URL.
	Callback(CallbackParams),
}

/// Query parameters the provider appends to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
	/// Authorization code to exchange.
	pub code: Option<String>,
	/// Opaque state echoed back by the provider.
	pub state: Option<String>,
	/// OAuth error code.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
	/// Link to documentation about the error.
	pub error_uri: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from a redirect URL.
	///
	/// Unknown parameters are ignored; repeated ones keep their last value.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (name, value) in url.query_pairs() {
			let slot = match name.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				"error_uri" => &mut params.error_uri,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}
}

/// Result of one [`AuthenticateRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum AuthenticateOutcome<U> {
	/// Send the end-user to `url`; keep `state` to check it on the way back.
	Redirect {
		/// Fully-formed authorization URL.
		url: Url,
		/// Random state carried by `url`.
		state: String,
	},
	/// The verify callback admitted the user.
	Success {
		/// Application user.
		user: U,
		/// Optional details from the verify callback.
		info: Option<JsonValue>,
	},
	/// The end-user declined consent or the verify callback rejected the login.
	Fail {
		/// Optional reason, e.g. `{ "message": <error_description> }`.
		info: Option<JsonValue>,
	},
}

impl<V, C> TwitchStrategy<V, C>
where
	V: Verify,
	C: ?Sized + HttpTransport,
{
	/// Dispatches one leg of the flow.
	pub async fn authenticate_request(
		&self,
		request: AuthenticateRequest,
	) -> Result<AuthenticateOutcome<V::User>> {
		match request {
			AuthenticateRequest::Begin(options) => Ok(self.authorize_redirect(&options)),
			AuthenticateRequest::Callback(params) => self.handle_callback(params).await,
		}
	}

	/// Builds the consent redirect.
	///
	/// Scopes from `options` replace the configured ones when present, and the
	/// [`Strategy::authorization_params`] output is appended to the URL.
	pub fn authorize_redirect(
		&self,
		options: &AuthenticateOptions,
	) -> AuthenticateOutcome<V::User> {
		FlowSpan::new(FlowKind::Authorize, "authorize_redirect").in_scope(|| {
			obs::record_flow_outcome(FlowKind::Authorize, FlowOutcome::Attempt);

			let scope = options.scope.as_deref().unwrap_or(&self.config().scope);
			let params = self.authorization_params(options);
			let (url, state) = self.client().authorize_url(scope, &params);

			obs::record_flow_outcome(FlowKind::Authorize, FlowOutcome::Success);

			AuthenticateOutcome::Redirect { url, state: state.secret().to_owned() }
		})
	}

	/// Handles the provider's redirect back to the callback URL.
	pub async fn handle_callback(
		&self,
		params: CallbackParams,
	) -> Result<AuthenticateOutcome<V::User>> {
		let CallbackParams { code, error, error_description, error_uri, .. } = params;

		if let Some(code) = error {
			if code == ACCESS_DENIED {
				let info =
					error_description.map(|message| serde_json::json!({ "message": message }));

				return Ok(AuthenticateOutcome::Fail { info });
			}

			return Err(Error::Authorization {
				code,
				description: error_description,
				uri: error_uri,
			});
		}

		let Some(code) = code else {
			return Ok(self.authorize_redirect(&AuthenticateOptions::default()));
		};
		let span = FlowSpan::new(FlowKind::Callback, "handle_callback");

		obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token_params = self.token_params(&AuthenticateOptions::default());
				let grant = self.client().exchange_code(&code, &token_params).await?;
				let profile = self.user_profile(grant.access_token.expose()).await?;
				let outcome = match self.verifier().verify(&grant, profile).await? {
					Verified::User { user, info } => AuthenticateOutcome::Success { user, info },
					Verified::Rejected { info } => AuthenticateOutcome::Fail { info },
				};

				Ok::<_, Error>(outcome)
			})
			.await;

		obs::record_result(FlowKind::Callback, &result);

		result
	}
}
