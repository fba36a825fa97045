use crate::state::AppState;
use crate::types::*;

/// Count the categories where a prediction matches the revealed winner.
///
/// Categories that were predicted but not revealed (or revealed but not
/// predicted) do not count either way.
pub fn score(predictions: &Picks, state: &EventState) -> u32 {
    predictions
        .iter()
        .filter(|(category, selection)| state.winners.get(*category) == Some(*selection))
        .count() as u32
}

impl AppState {
    /// Guests with their current score, optionally limited to one room tag.
    ///
    /// All guests are scored against the same snapshot, taken while the guest
    /// list is held so an import cannot land in between.
    pub async fn guests_with_scores(&self, room: Option<&str>) -> Vec<ScoredGuest> {
        let guests = self.guests.read().await;
        let snapshot = self.event.snapshot().await;
        guests
            .values()
            .filter(|g| room.map_or(true, |code| g.in_room(code)))
            .map(|guest| ScoredGuest {
                score: score(&guest.predictions, &snapshot),
                guest: guest.clone(),
            })
            .collect()
    }

    pub async fn get_guest_with_score(&self, id: GuestId) -> Option<ScoredGuest> {
        let guests = self.guests.read().await;
        let guest = guests.get(&id)?.clone();
        let snapshot = self.event.snapshot().await;
        let score = score(&guest.predictions, &snapshot);
        Some(ScoredGuest { guest, score })
    }
}
