//! Profile retrieval and normalization.

// crates.io
use serde::{
	Deserializer,
	de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor},
};
use serde_json::error::Category;
// self
use crate::{
	_prelude::*,
	auth::UserProfile,
	error::ShapeError,
	oauth::ResourceClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Fetches the authenticated user's profile and normalizes it into a [`UserProfile`].
///
/// The fetcher is stateless per call: every invocation carries its own access token, and the
/// only shared state is the immutable endpoint plus the client used to reach it.
#[derive(Clone)]
pub struct ProfileFetcher {
	profile_url: Url,
	client: Arc<dyn ResourceClient>,
}
impl ProfileFetcher {
	/// Creates a fetcher that queries `profile_url` through `client`.
	pub fn new(profile_url: Url, client: Arc<dyn ResourceClient>) -> Self {
		Self { profile_url, client }
	}

	/// User-info endpoint queried by [`ProfileFetcher::fetch`].
	pub fn profile_url(&self) -> &Url {
		&self.profile_url
	}

	/// Issues one authenticated GET and classifies the outcome.
	///
	/// - the client reports an error: [`Error::ProfileFetch`] wrapping it;
	/// - the call completes without a body: [`Error::EmptyBody`];
	/// - the body is not JSON: [`Error::Parse`] with the raw decoder error;
	/// - `data[0]` cannot be read: [`Error::Shape`];
	/// - otherwise the first `data` element, stamped with the provider literal.
	///
	/// No retries are attempted.
	pub async fn fetch(&self, access_token: &str) -> Result<UserProfile> {
		let span = FlowSpan::new(FlowKind::Profile, "fetch");

		obs::record_flow_outcome(FlowKind::Profile, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let body = self
					.client
					.get(&self.profile_url, access_token)
					.await
					.map_err(|source| Error::ProfileFetch { source })?
					.ok_or(Error::EmptyBody)?;

				decode_profile(&body.into_text())
			})
			.await;

		obs::record_result(FlowKind::Profile, &result);

		result
	}
}
impl Debug for ProfileFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileFetcher").field("profile_url", &self.profile_url).finish()
	}
}

/// Decodes a profile response body shaped `{ "data": [ { .. }, .. ] }`.
///
/// Only the first element of `data` is read; later elements are skipped without being
/// inspected.
pub fn decode_profile(body: &str) -> Result<UserProfile> {
	let mut de = serde_json::Deserializer::from_str(body);
	let envelope: ProfileEnvelope =
		serde_path_to_error::deserialize(&mut de).map_err(classify_decode_error)?;

	de.end().map_err(Error::Parse)?;

	let first = envelope.data.0.ok_or(ShapeError::EmptyData)?;

	Ok(UserProfile::normalize(first))
}

fn classify_decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
	match err.inner().classify() {
		Category::Data => {
			let path = err.path().to_string();

			ShapeError::InvalidField { path, source: err.into_inner() }.into()
		},
		Category::Syntax | Category::Eof | Category::Io => Error::Parse(err.into_inner()),
	}
}

/// Top-level `{ "data": .. }` object.
///
/// Only a JSON object is accepted. A repeated `data` key replaces the earlier value and other
/// keys are skipped.
struct ProfileEnvelope {
	data: FirstObject,
}
impl<'de> Deserialize<'de> for ProfileEnvelope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct ProfileEnvelopeVisitor;
		impl<'de> Visitor<'de> for ProfileEnvelopeVisitor {
			type Value = ProfileEnvelope;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("an object with a `data` array")
			}

			fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut data = None;

				while let Some(key) = map.next_key::<String>()? {
					if key == "data" {
						data = Some(map.next_value::<FirstObject>()?);
					} else {
						map.next_value::<IgnoredAny>()?;
					}
				}

				let data =
					data.ok_or_else(|| <A::Error as de::Error>::missing_field("data"))?;

				Ok(ProfileEnvelope { data })
			}
		}

		deserializer.deserialize_map(ProfileEnvelopeVisitor)
	}
}

/// First element of a JSON array, which must be an object when present.
struct FirstObject(Option<JsonMap<String, JsonValue>>);
impl<'de> Deserialize<'de> for FirstObject {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct FirstObjectVisitor;
		impl<'de> Visitor<'de> for FirstObjectVisitor {
			type Value = FirstObject;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("an array of profile objects")
			}

			fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
			where
				A: SeqAccess<'de>,
			{
				let first = seq.next_element()?;

				while seq.next_element::<IgnoredAny>()?.is_some() {}

				Ok(FirstObject(first))
			}
		}

		deserializer.deserialize_seq(FirstObjectVisitor)
	}
}
