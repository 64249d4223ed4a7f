//! Normalized user profile produced by the profile fetcher.

// self
use crate::_prelude::*;

/// Fixed provider literal stamped onto every normalized profile.
pub const PROVIDER: &str = "twitch";

/// Keys a profile must carry to be classified as valid.
pub const REQUIRED_PROFILE_KEYS: [&str; 4] = ["provider", "id", "username", "displayName"];

/// Canonical profile: the fields of the provider's first `data` element plus `provider`.
///
/// Fields are copied verbatim; no validation is applied to their shape. Accessors read the
/// canonical keys first and fall back to the provider's own spelling (`login`,
/// `display_name`) so application code can stay provider-agnostic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(JsonMap<String, JsonValue>);
impl UserProfile {
	/// Shallow-copies `fields` and overwrites `provider` with [`PROVIDER`].
	pub fn normalize(mut fields: JsonMap<String, JsonValue>) -> Self {
		fields.insert("provider".into(), JsonValue::String(PROVIDER.into()));

		Self(fields)
	}

	/// Wraps `fields` as-is, without stamping the provider.
	pub fn from_fields(fields: JsonMap<String, JsonValue>) -> Self {
		Self(fields)
	}

	/// Provider identifier.
	pub fn provider(&self) -> Option<&str> {
		self.str_field("provider")
	}

	/// Provider-assigned user identifier.
	pub fn id(&self) -> Option<&str> {
		self.str_field("id")
	}

	/// Login name (`username`, falling back to `login`).
	pub fn username(&self) -> Option<&str> {
		self.str_field("username").or_else(|| self.str_field("login"))
	}

	/// Display name (`displayName`, falling back to `display_name`).
	pub fn display_name(&self) -> Option<&str> {
		self.str_field("displayName").or_else(|| self.str_field("display_name"))
	}

	/// Raw field access.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	/// All profile fields.
	pub fn fields(&self) -> &JsonMap<String, JsonValue> {
		&self.0
	}

	/// Consumes the profile and returns its fields.
	pub fn into_fields(self) -> JsonMap<String, JsonValue> {
		self.0
	}

	/// Classifies the profile against [`REQUIRED_PROFILE_KEYS`].
	pub fn validity(&self) -> ProfileValidity {
		ProfileValidity::classify(&self.0)
	}

	fn str_field(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(JsonValue::as_str)
	}
}
impl From<UserProfile> for JsonValue {
	fn from(value: UserProfile) -> Self {
		JsonValue::Object(value.0)
	}
}

/// Outcome of checking a profile object for the canonical keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileValidity {
	/// Carries the fixed provider literal and every required key.
	Valid,
	/// Missing a required key or carrying a different (or empty) provider.
	Invalid,
}
impl ProfileValidity {
	/// Classifies an arbitrary profile object.
	///
	/// Key matching is exact and case-sensitive, so `userName` or `ID` do not count.
	pub fn classify(fields: &JsonMap<String, JsonValue>) -> Self {
		let provider_matches =
			fields.get("provider").and_then(JsonValue::as_str).is_some_and(|p| p == PROVIDER);
		let has_required_keys = REQUIRED_PROFILE_KEYS.iter().all(|key| fields.contains_key(*key));

		if provider_matches && has_required_keys { Self::Valid } else { Self::Invalid }
	}

	/// Returns true for [`ProfileValidity::Valid`].
	pub fn is_valid(self) -> bool {
		matches!(self, Self::Valid)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn object(value: JsonValue) -> JsonMap<String, JsonValue> {
		match value {
			JsonValue::Object(map) => map,
			other => panic!("Fixture must be a JSON object, got {other}."),
		}
	}

	#[test]
	fn normalize_overwrites_provider() {
		let profile = UserProfile::normalize(object(json!({
			"id": "1",
			"login": "someone",
			"display_name": "Someone",
			"provider": "elsewhere",
		})));

		assert_eq!(profile.provider(), Some(PROVIDER));
		assert_eq!(profile.id(), Some("1"));
		assert_eq!(profile.username(), Some("someone"));
		assert_eq!(profile.display_name(), Some("Someone"));
	}

	#[test]
	fn invalid_profiles_are_rejected() {
		let cases = [
			(
				json!({ "provider": "twitch", "id": "9494893", "userName": "test", "displayName": "test" }),
				"username is misspelled",
			),
			(json!({ "provider": "twitch" }), "missing everything but provider"),
			(
				json!({ "provider": "", "id": "4948393", "username": "test", "displayName": "test" }),
				"provider is empty",
			),
			(json!({}), "the object is empty"),
			(
				json!({ "provider": "twitch", "ID": "4494993", "username": "test", "displayname": "test" }),
				"id is all caps",
			),
		];

		for (fixture, reason) in cases {
			assert_eq!(
				ProfileValidity::classify(&object(fixture)),
				ProfileValidity::Invalid,
				"Profile should be invalid because {reason}."
			);
		}
	}

	#[test]
	fn valid_profiles_are_accepted() {
		let cases = [
			json!({ "provider": "twitch", "id": "4490493", "username": "test", "displayName": "test" }),
			json!({ "provider": "twitch", "id": "94598483", "username": "test2", "displayName": "test3" }),
		];

		for fixture in cases {
			assert!(UserProfile::from_fields(object(fixture)).validity().is_valid());
		}
	}
}
