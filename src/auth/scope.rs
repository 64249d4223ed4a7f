//! Provider scope catalog.
//!
//! Every permission the provider understands is a [`Scope`] variant; the wire token is what the
//! authorization endpoint expects. Requested scopes keep caller order and are serialized into a
//! single space-delimited `scope` parameter.

// std
use std::sync::OnceLock;
// self
use crate::_prelude::*;

/// Delimiter used when joining scopes into the `scope` query parameter.
pub const SCOPE_DELIMITER: char = ' ';

/// Errors emitted when resolving scopes against the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// The token is not part of the provider catalog.
	#[error("Scope `{scope}` is not part of the provider catalog.")]
	Unknown {
		/// The offending scope string.
		scope: String,
	},
}

macro_rules! def_scopes {
	($($(#[doc = $doc:literal])* $name:ident => $token:literal,)+) => {
		/// Permission scope understood by the provider's authorization endpoint.
		#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub enum Scope {
			$($(#[doc = $doc])* $name,)+
		}
		impl Scope {
			/// Every catalog entry, in declaration order.
			pub const ALL: &'static [Scope] = &[$(Scope::$name,)+];

			/// Returns the wire token sent to the authorization endpoint.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Scope::$name => $token,)+
				}
			}

			/// Returns the human-readable catalog name (e.g. `UserReadEmail`).
			pub const fn name(self) -> &'static str {
				match self {
					$(Scope::$name => stringify!($name),)+
				}
			}
		}
	};
}

def_scopes! {
	/// View analytics data for the Twitch Extensions owned by the authenticated account.
	AnalyticsReadExtensions => "analytics:read:extensions",
	/// View analytics data for the games owned by the authenticated account.
	AnalyticsReadGames => "analytics:read:games",
	/// View Bits information for a channel.
	BitsRead => "bits:read",
	/// Run commercials on a channel.
	ChannelEditCommercial => "channel:edit:commercial",
	/// Manage a channel's broadcast configuration, stream markers, and stream tags.
	ChannelManageBroadcast => "channel:manage:broadcast",
	/// Manage a channel's Extension configuration, including activating Extensions.
	ChannelManageExtensions => "channel:manage:extensions",
	/// Manage a channel's polls.
	ChannelManagePolls => "channel:manage:polls",
	/// Manage a channel's Channel Points Predictions.
	ChannelManagePredictions => "channel:manage:predictions",
	/// Manage Channel Points custom rewards and their redemptions on a channel.
	ChannelManageRedemptions => "channel:manage:redemptions",
	/// Manage a channel's stream schedule.
	ChannelManageSchedule => "channel:manage:schedule",
	/// Manage a channel's videos, including deleting videos.
	ChannelManageVideos => "channel:manage:videos",
	/// View a list of users with the editor role for a channel.
	ChannelReadEditors => "channel:read:editors",
	/// View Creator Goals for a channel.
	ChannelReadGoals => "channel:read:goals",
	/// View Hype Train information for a channel.
	ChannelReadHypeTrain => "channel:read:hype_train",
	/// View a channel's polls.
	ChannelReadPolls => "channel:read:polls",
	/// View a channel's Channel Points Predictions.
	ChannelReadPredictions => "channel:read:predictions",
	/// View Channel Points custom rewards and their redemptions on a channel.
	ChannelReadRedemptions => "channel:read:redemptions",
	/// View an authorized user's stream key.
	ChannelReadStreamKey => "channel:read:stream_key",
	/// View the subscribers of a channel and check whether a user is subscribed.
	ChannelReadSubscriptions => "channel:read:subscriptions",
	/// Manage Clips for a channel.
	ClipsEdit => "clips:edit",
	/// View a channel's moderation data including Moderators, Bans, Timeouts, and Automod settings.
	ModerationRead => "moderation:read",
	/// Ban and unban users.
	ModeratorManageBannedUsers => "moderator:manage:banned_users",
	/// View a broadcaster's list of blocked terms.
	ModeratorReadBlockedTerms => "moderator:read:blocked_terms",
	/// Manage a broadcaster's list of blocked terms.
	ModeratorManageBlockedTerms => "moderator:manage:blocked_terms",
	/// Manage messages held for review by AutoMod in channels where you are a moderator.
	ModeratorManageAutomod => "moderator:manage:automod",
	/// View a broadcaster's AutoMod settings.
	ModeratorReadAutomodSettings => "moderator:read:automod_settings",
	/// Manage a broadcaster's AutoMod settings.
	ModeratorManageAutomodSettings => "moderator:manage:automod_settings",
	/// View a broadcaster's chat room settings.
	ModeratorReadChatSettings => "moderator:read:chat_settings",
	/// Manage a broadcaster's chat room settings.
	ModeratorManageChatSettings => "moderator:manage:chat_settings",
	/// Manage a user object.
	UserEdit => "user:edit",
	/// Deprecated by the provider; previously used for creating and deleting user follows.
	UserEditFollows => "user:edit:follows",
	/// Manage the block list of a user.
	UserManageBlockedUsers => "user:manage:blocked_users",
	/// View the block list of a user.
	UserReadBlockedUsers => "user:read:blocked_users",
	/// View a user's broadcasting configuration, including Extension configurations.
	UserReadBroadcast => "user:read:broadcast",
	/// View a user's email address.
	UserReadEmail => "user:read:email",
	/// View the list of channels a user follows.
	UserReadFollows => "user:read:follows",
	/// View if an authorized user is subscribed to specific channels.
	UserReadSubscriptions => "user:read:subscriptions",
}

impl Scope {
	/// Looks up a scope by its catalog name (e.g. `BitsRead`).
	pub fn from_name(name: &str) -> Option<Self> {
		catalog().get(name).copied()
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Scope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Scope::ALL
			.iter()
			.copied()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| ScopeValidationError::Unknown { scope: s.to_owned() })
	}
}
impl TryFrom<String> for Scope {
	type Error = ScopeValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<Scope> for String {
	fn from(value: Scope) -> Self {
		value.as_str().to_owned()
	}
}
impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

/// Name → scope lookup table, built once on first use.
pub fn catalog() -> &'static BTreeMap<&'static str, Scope> {
	static CATALOG: OnceLock<BTreeMap<&'static str, Scope>> = OnceLock::new();

	CATALOG.get_or_init(|| Scope::ALL.iter().map(|scope| (scope.name(), *scope)).collect())
}

/// Joins scopes in caller order with [`SCOPE_DELIMITER`].
///
/// Returns `None` for an empty list so callers can omit the parameter entirely.
pub fn format_scope(scopes: &[Scope]) -> Option<String> {
	if scopes.is_empty() {
		return None;
	}

	let mut buf = String::new();

	for (idx, scope) in scopes.iter().enumerate() {
		if idx > 0 {
			buf.push(SCOPE_DELIMITER);
		}

		buf.push_str(scope.as_str());
	}

	Some(buf)
}

/// Parses a delimited `scope` value back into catalog entries, preserving order.
pub fn parse_scope(value: &str) -> Result<Vec<Scope>, ScopeValidationError> {
	value.split(SCOPE_DELIMITER).filter(|token| !token.is_empty()).map(Scope::from_str).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn catalog_covers_every_variant_once() {
		assert_eq!(catalog().len(), Scope::ALL.len());

		for scope in Scope::ALL {
			assert_eq!(Scope::from_name(scope.name()), Some(*scope));
			assert_eq!(scope.as_str().parse::<Scope>(), Ok(*scope));
		}
	}

	#[test]
	fn wire_tokens_match_provider_strings() {
		assert_eq!(Scope::BitsRead.as_str(), "bits:read");
		assert_eq!(Scope::UserReadEmail.to_string(), "user:read:email");
		assert_eq!(Scope::ChannelReadHypeTrain.as_str(), "channel:read:hype_train");
		assert_eq!(
			Scope::from_name("ModeratorManageAutomodSettings"),
			Some(Scope::ModeratorManageAutomodSettings)
		);
		assert_eq!(Scope::from_name("bits:read"), None, "Lookup is by name, not by token.");
	}

	#[test]
	fn unknown_and_empty_tokens_are_rejected() {
		assert_eq!(Scope::from_str(""), Err(ScopeValidationError::Empty));
		assert_eq!(
			Scope::from_str("chat:teleport"),
			Err(ScopeValidationError::Unknown { scope: "chat:teleport".into() })
		);
	}

	#[test]
	fn format_and_parse_preserve_order() {
		let scopes = [Scope::UserReadEmail, Scope::BitsRead];
		let joined = format_scope(&scopes).expect("Non-empty scopes should produce a value.");

		assert_eq!(joined, "user:read:email bits:read");
		assert_eq!(parse_scope(&joined).expect("Joined scopes should parse back."), scopes);
		assert_eq!(format_scope(&[]), None);
	}

	#[test]
	fn serde_uses_wire_tokens() {
		let json = serde_json::to_string(&[Scope::ClipsEdit]).expect("Scopes should serialize.");

		assert_eq!(json, "[\"clips:edit\"]");

		let parsed: Vec<Scope> =
			serde_json::from_str("[\"user:edit\"]").expect("Known scope should deserialize.");

		assert_eq!(parsed, vec![Scope::UserEdit]);
		assert!(serde_json::from_str::<Scope>("\"user:fly\"").is_err());
	}
}
