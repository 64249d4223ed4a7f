//! Strategy-level error types shared across the profile fetcher, the OAuth client, and flows.

// crates.io
use oauth2::HttpClientError;
// self
use crate::_prelude::*;

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The authenticated profile request failed at the transport or provider level.
	#[error("failed to fetch user profile")]
	ProfileFetch {
		/// Failure reported by the underlying client.
		#[source]
		source: TransportError,
	},
	/// The profile request completed without any body at all.
	#[error("body was empty")]
	EmptyBody,
	/// The profile body is not valid JSON.
	#[error(transparent)]
	Parse(serde_json::Error),
	/// The profile body decoded but `data[0]` could not be read.
	#[error(transparent)]
	Shape(#[from] ShapeError),

	/// The provider redirected back with an authorization error.
	#[error("Authorization failed: {code}.")]
	Authorization {
		/// Provider-supplied `error` value.
		code: String,
		/// Provider-supplied `error_description`, when present.
		description: Option<String>,
		/// Provider-supplied `error_uri`, when present.
		uri: Option<String>,
	},
	/// Token endpoint answered with an OAuth error payload.
	#[error("Token endpoint returned an OAuth error: {code}.")]
	Token {
		/// Provider-supplied `error` value.
		code: String,
		/// Provider-supplied `error_description`, when present.
		description: Option<String>,
	},
	/// The code-for-token exchange failed before a response could be read.
	#[error("failed to obtain access token")]
	TokenExchange {
		/// Failure reported by the underlying client.
		#[source]
		source: TransportError,
	},
	/// Token endpoint responded with JSON that could not be decoded.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised while building a strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required option was absent or empty.
	#[error("Option `{option}` is required.")]
	MissingOption {
		/// Name of the missing option.
		option: &'static str,
	},
	/// An endpoint or callback URL cannot be parsed.
	#[error("The {endpoint} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// A custom header name or value cannot be sent over HTTP.
	#[error("Custom header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Requested scopes cannot be resolved against the catalog.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Shorthand for [`ConfigError::MissingOption`].
	pub fn missing(option: &'static str) -> Self {
		Self::MissingOption { option }
	}
}

/// Failure to read `data[0]` from a decoded profile body.
#[derive(Debug, ThisError)]
pub enum ShapeError {
	/// A field along the path to `data[0]` is missing or has the wrong type.
	#[error("Cannot read property '0' of `data` at `{path}`: {source}.")]
	InvalidField {
		/// JSON path where decoding stopped.
		path: String,
		/// Underlying data-class decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// `data` is an array, but it is empty.
	#[error("Cannot read property '0' of `data`: the array is empty.")]
	EmptyData,
}

/// Transport-level failures (network, IO, non-success responses).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// The outbound request could not be assembled.
	#[error("HTTP request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// Provider answered with a non-success status.
	#[error("Provider responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, decoded lossily as UTF-8.
		body: String,
	},
	/// Any other failure reported by the HTTP client.
	#[error("HTTP client error occurred while calling the provider: {0}.")]
	Other(String),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status code carried by the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
impl<E> From<HttpClientError<E>> for TransportError
where
	E: 'static + Send + Sync + std::error::Error,
{
	fn from(e: HttpClientError<E>) -> Self {
		match e {
			HttpClientError::Reqwest(inner) => Self::Network { source: inner },
			HttpClientError::Http(inner) => Self::Request(inner),
			HttpClientError::Io(inner) => Self::Io(inner),
			HttpClientError::Other(message) => Self::Other(message),
			other => Self::Other(format!("{other:?}")),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn profile_errors_keep_their_fixed_messages() {
		let fetch = Error::ProfileFetch { source: TransportError::Other("boom".into()) };

		assert_eq!(fetch.to_string(), "failed to fetch user profile");
		assert!(fetch.source().is_some(), "The underlying cause must stay attached.");
		assert_eq!(Error::EmptyBody.to_string(), "body was empty");
	}

	#[test]
	fn http_client_errors_map_onto_transport_variants() {
		let io = std::io::Error::other("reset");
		let mapped = TransportError::from(HttpClientError::<std::io::Error>::Io(io));

		assert!(matches!(mapped, TransportError::Io(_)));

		let mapped = TransportError::from(HttpClientError::<std::io::Error>::Other("nope".into()));

		assert!(matches!(mapped, TransportError::Other(ref message) if message == "nope"));
		assert_eq!(TransportError::Status { status: 401, body: String::new() }.status(), Some(401));
	}
}
