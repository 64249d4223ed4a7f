//! Tokens issued by the authorization-code exchange.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access (and optional refresh) token handed to the host's verify callback.
///
/// The strategy never stores grants; ownership passes to the host together with the
/// normalized profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `issued_at + expires_in`, when the provider reported a lifetime.
	pub expires_at: Option<OffsetDateTime>,
	/// Scopes the provider reports as granted, verbatim.
	pub scope: Vec<String>,
}
impl TokenGrant {
	/// Creates a grant issued at `issued_at` with no expiry, refresh token, or scopes.
	pub fn new(access_token: impl Into<String>, issued_at: OffsetDateTime) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			issued_at,
			expires_at: None,
			scope: Vec::new(),
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the expiry relative to `issued_at`.
	///
	/// Non-positive lifetimes, and lifetimes that overflow the calendar, leave the expiry unset.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = if expires_in.is_positive() {
			self.issued_at.checked_add(expires_in)
		} else {
			None
		};

		self
	}

	/// Records the granted scopes.
	pub fn with_scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Returns true once `now` is at or past the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| now >= expires_at)
	}
}
