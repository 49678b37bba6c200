//! Inbound messages and the outbound envelope.
//!
//! Inbound traffic is one flat JSON object: the routing fields (`uuid`,
//! `secret`, `slug`, `action`) plus whatever payload the action needs.
//! Payload fields are kept as raw JSON and only interpreted when the
//! router asks for them, so a malformed payload on one action never makes
//! the whole message undecodable.
//!
//! Outbound traffic is an arbitrary JSON object with an `action` field
//! injected at encode time.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::action::{self, Action};
use crate::types::{ClientIdentity, ClientSecret, GameCode, RuntimeIdentifier};
use crate::ProtocolError;

/// A JSON object payload (`configuration`, `answers`).
pub type Object = Map<String, Value>;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One decoded inbound message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Inbound {
    /// Claimed identity.
    pub uuid: Option<String>,
    /// Secret proving the claim.
    pub secret: Option<String>,
    /// Code of the game the action targets.
    pub slug: Option<String>,
    /// What to do.
    pub action: Option<String>,
    /// Display name, for `join-game`.
    pub pseudonym: Option<Value>,
    /// New settings, for `update-config`.
    pub configuration: Option<Value>,
    /// Submitted answers, for `send-answers`.
    pub answers: Option<Value>,
    /// A vote, for `send-vote`.
    pub vote: Option<Value>,
}

impl Inbound {
    /// The claimed identity, normalized. `None` if absent or blank.
    pub fn identity(&self) -> Option<ClientIdentity> {
        self.uuid.as_deref().and_then(ClientIdentity::parse)
    }

    /// The presented secret. `None` if absent or blank.
    pub fn presented_secret(&self) -> Option<ClientSecret> {
        self.secret.as_deref().and_then(ClientSecret::presented)
    }

    /// The targeted game code, normalized. `None` if absent or blank.
    pub fn game_code(&self) -> Option<GameCode> {
        self.slug.as_deref().and_then(GameCode::parse)
    }

    /// The parsed action. `None` if absent or blank.
    pub fn action(&self) -> Option<Action> {
        self.action.as_deref().and_then(Action::parse)
    }

    /// The display name, or empty when none was sent or it is not a
    /// string.
    pub fn pseudonym(&self) -> &str {
        match &self.pseudonym {
            Some(Value::String(name)) => name,
            _ => "",
        }
    }

    /// The configuration payload, if it is a non-empty object.
    pub fn configuration(&self) -> Option<&Object> {
        match &self.configuration {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }

    /// The answers payload, if it is an object.
    pub fn answers(&self) -> Option<&Object> {
        match &self.answers {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// The vote payload, if it names both a category and a target.
    pub fn vote(&self) -> Option<Vote> {
        let raw: RawVote = serde_json::from_value(self.vote.clone()?).ok()?;
        let target = raw.uuid.as_deref().and_then(ClientIdentity::parse)?;
        let category = raw.category.filter(|c| !c.trim().is_empty())?;
        Some(Vote {
            target,
            category,
            accept: raw.vote,
        })
    }
}

/// A vote on one player's answer in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    /// Whose answer is being judged.
    pub target: ClientIdentity,
    /// Which category the answer belongs to.
    pub category: String,
    /// `true` to accept the answer, `false` to reject it.
    pub accept: bool,
}

#[derive(Deserialize)]
struct RawVote {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    vote: bool,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An outbound message: a JSON object plus its `action`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    action: String,
    body: Object,
}

impl Outbound {
    /// Builds a message from any serializable payload.
    ///
    /// Objects become the message body directly; any other value is
    /// wrapped as `{"data": value}`. A payload `action` key is
    /// overwritten by `action`.
    pub fn new(
        action: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, ProtocolError> {
        let value =
            serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self::from_value(action.into(), value))
    }

    /// A message carrying nothing but its action.
    pub fn bare(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            body: Object::new(),
        }
    }

    /// `set-uuid{uuid, secret}`: issues credentials.
    pub fn set_uuid(identity: &ClientIdentity, secret: &ClientSecret) -> Self {
        Self::from_value(
            action::SET_UUID.into(),
            json!({ "uuid": identity.as_str(), "secret": secret.expose() }),
        )
    }

    /// `set-slug{slug}`: announces a game code.
    pub fn set_slug(code: &GameCode) -> Self {
        Self::from_value(
            action::SET_SLUG.into(),
            json!({ "slug": code.as_str() }),
        )
    }

    /// `set-server-runtime-identifier{runtime_identifier}`.
    pub fn set_runtime_identifier(runtime: &RuntimeIdentifier) -> Self {
        Self::from_value(
            action::SET_SERVER_RUNTIME_IDENTIFIER.into(),
            json!({ "runtime_identifier": runtime.as_str() }),
        )
    }

    fn from_value(action: String, value: Value) -> Self {
        let body = match value {
            Value::Object(map) => map,
            Value::Null => Object::new(),
            other => {
                let mut map = Object::new();
                map.insert("data".into(), other);
                map
            }
        };
        Self { action, body }
    }

    /// The message's action.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Serializes the message to a text frame.
    pub fn to_text(&self) -> Result<String, ProtocolError> {
        crate::encode(self)
    }

    /// The body with `action` injected, ready to serialize.
    pub(crate) fn to_object(&self) -> Object {
        let mut map = self.body.clone();
        map.insert("action".into(), Value::String(self.action.clone()));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(value: Value) -> Inbound {
        serde_json::from_value(value).expect("valid inbound")
    }

    #[test]
    fn test_inbound_accessors_normalize() {
        let msg = inbound(json!({
            "uuid": " ABC ",
            "slug": "XyZ ",
            "action": "JOIN-GAME",
            "secret": "s3cret",
        }));

        assert_eq!(msg.identity().unwrap().as_str(), "abc");
        assert_eq!(msg.game_code().unwrap().as_str(), "xyz");
        assert_eq!(msg.action(), Some(Action::JoinGame));
        assert!(msg.presented_secret().is_some());
    }

    #[test]
    fn test_inbound_blank_fields_are_absent() {
        let msg = inbound(json!({ "uuid": "", "slug": " ", "secret": "" }));

        assert!(msg.identity().is_none());
        assert!(msg.game_code().is_none());
        assert!(msg.presented_secret().is_none());
        assert!(msg.action().is_none());
        assert_eq!(msg.pseudonym(), "");
    }

    #[test]
    fn test_inbound_wrong_typed_pseudonym_still_decodes() {
        let msg = crate::decode(
            &json!({ "uuid": "abc", "action": "start-game", "pseudonym": 5 }).to_string(),
        )
        .unwrap();

        assert_eq!(msg.action(), Some(Action::StartGame));
        assert_eq!(msg.pseudonym(), "");
        assert_eq!(inbound(json!({ "pseudonym": "Al" })).pseudonym(), "Al");
    }

    #[test]
    fn test_configuration_requires_non_empty_object() {
        assert!(inbound(json!({ "configuration": {} }))
            .configuration()
            .is_none());
        assert!(inbound(json!({ "configuration": "rounds=3" }))
            .configuration()
            .is_none());
        let msg = inbound(json!({ "configuration": { "rounds": 3 } }));
        assert_eq!(msg.configuration().unwrap()["rounds"], 3);
    }

    #[test]
    fn test_answers_requires_object() {
        assert!(inbound(json!({ "answers": [1, 2] })).answers().is_none());
        assert!(inbound(json!({ "answers": {} })).answers().is_some());
    }

    #[test]
    fn test_vote_requires_target_and_category() {
        let full = inbound(json!({
            "vote": { "uuid": "Bob", "category": "city", "vote": true }
        }));
        assert_eq!(
            full.vote(),
            Some(Vote {
                target: ClientIdentity::parse("bob").unwrap(),
                category: "city".into(),
                accept: true,
            })
        );

        let no_category = inbound(json!({ "vote": { "uuid": "bob" } }));
        assert!(no_category.vote().is_none());

        let no_target = inbound(json!({ "vote": { "category": "city" } }));
        assert!(no_target.vote().is_none());

        let not_object = inbound(json!({ "vote": true }));
        assert!(not_object.vote().is_none());
    }

    #[test]
    fn test_vote_defaults_to_reject() {
        let msg = inbound(json!({
            "vote": { "uuid": "bob", "category": "river" }
        }));
        assert!(!msg.vote().unwrap().accept);
    }

    #[test]
    fn test_outbound_new_wraps_non_objects() {
        let msg = Outbound::new("scores", &vec![1, 2, 3]).unwrap();
        assert_eq!(msg.to_object()["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_outbound_action_overrides_payload_action() {
        let msg =
            Outbound::new("real", &json!({ "action": "fake", "x": 1 })).unwrap();
        let object = msg.to_object();
        assert_eq!(object["action"], "real");
        assert_eq!(object["x"], 1);
    }

    #[test]
    fn test_set_uuid_carries_identity_and_secret() {
        let identity = ClientIdentity::generate();
        let secret = ClientSecret::generate();

        let msg = Outbound::set_uuid(&identity, &secret);

        assert_eq!(msg.action(), "set-uuid");
        let object = msg.to_object();
        assert_eq!(object["uuid"], identity.as_str());
        assert_eq!(object["secret"], secret.expose());
    }
}
