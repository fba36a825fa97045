use super::{AppState, RecordError};
use crate::types::*;
use std::sync::atomic::Ordering;

impl AppState {
    pub async fn list_guests(&self, room: Option<&str>) -> Vec<Guest> {
        self.guests
            .read()
            .await
            .values()
            .filter(|g| room.map_or(true, |code| g.in_room(code)))
            .cloned()
            .collect()
    }

    pub async fn get_guest(&self, id: GuestId) -> Option<Guest> {
        self.guests.read().await.get(&id).cloned()
    }

    pub async fn create_guest(&self, new: NewGuest) -> Guest {
        let mut guests = self.guests.write().await;
        let id = self.next_guest_id.fetch_add(1, Ordering::SeqCst);
        let guest = Guest {
            id,
            name: new.name,
            photo: new.photo,
            predictions: new.predictions,
            rooms: new.rooms,
        };
        guests.insert(id, guest.clone());
        tracing::info!("Created guest {} ({})", id, guest.name);
        guest
    }

    pub async fn update_guest(&self, id: GuestId, update: GuestUpdate) -> Result<Guest, RecordError> {
        let mut guests = self.guests.write().await;
        let guest = guests.get_mut(&id).ok_or(RecordError::GuestNotFound(id))?;

        if let Some(name) = update.name {
            guest.name = name;
        }
        if let Some(photo) = update.photo {
            guest.photo = photo;
        }
        if let Some(predictions) = update.predictions {
            guest.predictions = predictions;
        }
        if let Some(rooms) = update.rooms {
            guest.rooms = rooms;
        }
        Ok(guest.clone())
    }

    pub async fn delete_guest(&self, id: GuestId) -> Result<(), RecordError> {
        self.guests
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RecordError::GuestNotFound(id))
    }

    pub async fn clear_guests(&self) {
        self.guests.write().await.clear();
        tracing::info!("Cleared all guests");
    }

    pub async fn list_rooms(&self) -> Vec<Room> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn get_room_by_code(&self, code: &str) -> Option<Room> {
        let code = code.to_lowercase();
        self.rooms
            .read()
            .await
            .values()
            .find(|r| r.code.to_lowercase() == code)
            .cloned()
    }

    /// Create a room. Codes are stored lowercase and must be unique.
    pub async fn create_room(&self, name: String, code: &str) -> Result<Room, RecordError> {
        let code = code.trim().to_lowercase();
        if code.is_empty() {
            return Err(RecordError::EmptyRoomCode);
        }

        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.code == code) {
            return Err(RecordError::DuplicateRoomCode(code));
        }

        let id = self.next_room_id.fetch_add(1, Ordering::SeqCst);
        let room = Room { id, name, code };
        rooms.insert(id, room.clone());
        Ok(room)
    }

    pub async fn delete_room(&self, id: RoomId) -> Result<(), RecordError> {
        self.rooms
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RecordError::RoomNotFound(id))
    }
}
