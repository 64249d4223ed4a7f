//! Walks through building the consent redirect and parsing the provider's redirect back.
//!
//! No network traffic happens here: the callback below carries an `error`, so the strategy
//! settles it without exchanging a code.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_twitch::{
	auth::{Scope, TokenGrant, UserProfile},
	error::Result as TwitchResult,
	flows::{AuthenticateOutcome, AuthenticateRequest, CallbackParams},
	provider::{AuthenticateOptions, Strategy, StrategyOptions, TwitchStrategy, Verified},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let options = StrategyOptions::new("demo-client", "demo-secret")
		.callback_url(Url::parse("http://localhost:8453/auth/callback")?)
		.scope([Scope::UserReadEmail, Scope::ChannelReadSubscriptions]);
	let strategy = TwitchStrategy::new(
		options,
		|_: &TokenGrant, profile: UserProfile| -> TwitchResult<Verified<String>> {
			let user = profile.username().unwrap_or_default().to_owned();

			Ok(Verified::User { user, info: None })
		},
	)?;

	println!("Strategy `{}` keyed by `{}`.", strategy.name(), strategy.key());

	let outcome = strategy
		.authenticate(AuthenticateRequest::Begin(
			AuthenticateOptions::default().force_verify(true),
		))
		.await?;
	let AuthenticateOutcome::Redirect { url, state } = outcome else {
		color_eyre::eyre::bail!("Starting a login must produce a redirect.");
	};

	println!("Send your user to {url}.");

	let mut sessions = HashMap::new();

	sessions.insert(state.clone(), "user-agent-123");

	// Simulate the provider redirecting back after the user declined consent.
	let mut callback = Url::parse("http://localhost:8453/auth/callback")?;

	callback
		.query_pairs_mut()
		.append_pair("error", "access_denied")
		.append_pair("error_description", "The user denied you access")
		.append_pair("state", &state);

	let params = CallbackParams::from_url(&callback);
	let returned_state = params.state.clone().unwrap_or_default();

	match sessions.remove(&returned_state) {
		Some(session) => println!("Validated state for session {session}."),
		None => color_eyre::eyre::bail!("State `{returned_state}` was not recognized."),
	}

	match strategy.authenticate(AuthenticateRequest::Callback(params)).await? {
		AuthenticateOutcome::Fail { info } => println!("Login failed: {info:?}."),
		other => println!("Unexpected outcome: {other:?}."),
	}

	Ok(())
}
