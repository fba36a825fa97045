use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque ID types
pub type CategoryId = i64;
pub type SelectionId = i64;
pub type GuestId = u64;
pub type RoomId = u64;

/// Category -> selection mapping, used for both predictions and winners
pub type Picks = BTreeMap<CategoryId, SelectionId>;

/// The shared live event state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventState {
    #[serde(rename = "predictions_locked")]
    pub locked: bool,
    #[serde(rename = "current_award_id")]
    pub current_category: Option<CategoryId>,
    pub winners: Picks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub predictions: Picks,
    #[serde(default)]
    pub rooms: Vec<String>,
}

impl Guest {
    /// Room tags are matched case-insensitively
    pub fn in_room(&self, code: &str) -> bool {
        let code = code.to_lowercase();
        self.rooms.iter().any(|r| r.to_lowercase() == code)
    }
}

/// A guest annotated with its score against the revealed winners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredGuest {
    #[serde(flatten)]
    pub guest: Guest,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub code: String,
}

/// Entry written by the legacy `setScore` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub contestant: String,
    pub task: String,
    pub points: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominee {
    pub id: SelectionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub nominees: Vec<Nominee>,
}

/// Payload for creating a guest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGuest {
    pub name: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub predictions: Picks,
    #[serde(default)]
    pub rooms: Vec<String>,
}

/// Partial guest update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestUpdate {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub predictions: Option<Picks>,
    pub rooms: Option<Vec<String>>,
}
