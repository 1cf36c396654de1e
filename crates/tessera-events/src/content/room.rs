//! Content schemas for room state and account data.
//!
//! One struct per event type. Optional wire fields are `Option`s with
//! `skip_serializing_if`, so a field that was absent on decode stays
//! absent on encode. That is what keeps `encode(decode(w))` equal to `w`
//! for every field modelled here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessera_identifiers::{RoomId, UserId};

use super::encrypted::Algorithm;
use super::message::ImageInfo;
use crate::EventType;

// ---------------------------------------------------------------------------
// m.room.canonical_alias
// ---------------------------------------------------------------------------

/// `m.room.canonical_alias`: the alias clients should display and share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAliasContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Other aliases the room is also reachable under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_aliases: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// m.room.create
// ---------------------------------------------------------------------------

/// `m.room.create`: the first event in every room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContent {
    /// Set by the server on older room versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserId>,

    /// Whether users on other servers may join. Absent means `true`.
    #[serde(rename = "m.federate", skip_serializing_if = "Option::is_none")]
    pub federate: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_version: Option<String>,

    /// The room this one replaces, if it was created by an upgrade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<PreviousRoom>,

    /// e.g. `m.space`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

impl CreateContent {
    pub fn is_federated(&self) -> bool {
        self.federate.unwrap_or(true)
    }
}

/// Reference to the room an upgraded room replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousRoom {
    pub room_id: RoomId,
    /// The last event of the old room.
    pub event_id: String,
}

// ---------------------------------------------------------------------------
// m.room.member
// ---------------------------------------------------------------------------

/// Membership state of a user in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Invite,
    Join,
    Knock,
    Leave,
    Ban,
}

/// `m.room.member`: membership plus the profile the user has in this room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberContent {
    pub membership: Membership,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_direct: Option<bool>,

    /// Why the membership changed (kick/ban reasons, mostly).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MemberContent {
    pub fn new(membership: Membership) -> Self {
        Self {
            membership,
            displayname: None,
            avatar_url: None,
            is_direct: None,
            reason: None,
        }
    }
}

// ---------------------------------------------------------------------------
// m.room.join_rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRule {
    Public,
    Knock,
    Invite,
    Private,
    Restricted,
    KnockRestricted,
}

/// `m.room.join_rules`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRulesContent {
    pub join_rule: JoinRule,
}

// ---------------------------------------------------------------------------
// m.room.power_levels
// ---------------------------------------------------------------------------

const DEFAULT_MODERATION_LEVEL: i64 = 50;

/// `m.room.power_levels`: who may do what in a room.
///
/// Every field is optional on the wire. The raw fields keep exactly what
/// was sent; the `*_level` accessors apply the protocol defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLevelsContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban: Option<i64>,

    /// Level required to send specific event types, keyed by wire type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, i64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_default: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kick: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_default: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<BTreeMap<UserId, i64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_default: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationPowerLevels>,
}

/// Levels for sending notifications (e.g. `@room`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPowerLevels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<i64>,
}

impl PowerLevelsContent {
    pub fn ban_level(&self) -> i64 {
        self.ban.unwrap_or(DEFAULT_MODERATION_LEVEL)
    }

    pub fn invite_level(&self) -> i64 {
        self.invite.unwrap_or(DEFAULT_MODERATION_LEVEL)
    }

    pub fn kick_level(&self) -> i64 {
        self.kick.unwrap_or(DEFAULT_MODERATION_LEVEL)
    }

    pub fn redact_level(&self) -> i64 {
        self.redact.unwrap_or(DEFAULT_MODERATION_LEVEL)
    }

    pub fn room_notification_level(&self) -> i64 {
        self.notifications
            .as_ref()
            .and_then(|n| n.room)
            .unwrap_or(DEFAULT_MODERATION_LEVEL)
    }

    /// The level `user` has in the room.
    pub fn user_level(&self, user: &UserId) -> i64 {
        self.users
            .as_ref()
            .and_then(|users| users.get(user))
            .copied()
            .unwrap_or_else(|| self.users_default.unwrap_or(0))
    }

    /// The level required to send an event of type `event_type`.
    ///
    /// An explicit entry in `events` wins; otherwise state events fall back
    /// to `state_default` and everything else to `events_default`.
    pub fn event_level(&self, event_type: EventType) -> i64 {
        if let Some(level) = self
            .events
            .as_ref()
            .and_then(|events| events.get(event_type.as_str()))
        {
            return *level;
        }
        if event_type.is_state() {
            self.state_default.unwrap_or(DEFAULT_MODERATION_LEVEL)
        } else {
            self.events_default.unwrap_or(0)
        }
    }
}

// ---------------------------------------------------------------------------
// m.room.name / m.room.topic / m.room.avatar
// ---------------------------------------------------------------------------

/// `m.room.name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameContent {
    pub name: String,
}

/// `m.room.topic`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContent {
    pub topic: String,
}

/// `m.room.avatar`. No `url` means the avatar was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ImageInfo>,
}

// ---------------------------------------------------------------------------
// m.tag
// ---------------------------------------------------------------------------

/// `m.tag`: the user's tags on a room (favourite, low priority, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagContent {
    pub tags: BTreeMap<String, TagInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    /// Position of the room within the tag, in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

// ---------------------------------------------------------------------------
// m.room.encryption
// ---------------------------------------------------------------------------

/// `m.room.encryption`: turns on end-to-end encryption for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionContent {
    pub algorithm: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_period_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_period_msgs: Option<u64>,
}

impl EncryptionContent {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            rotation_period_ms: None,
            rotation_period_msgs: None,
        }
    }
}
