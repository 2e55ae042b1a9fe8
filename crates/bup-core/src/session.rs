//! Logged-in user session, kept in client storage

use crate::Result;
use crate::storage::{CURRENT_USER_KEY, Storage, TOKEN_KEY};
use serde::{Deserialize, Serialize};

/// The user stored under `bup-current-user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// user, technician, moderator or admin
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl CurrentUser {
    pub fn is_technician(&self) -> bool {
        self.role.eq_ignore_ascii_case("technician")
    }

    pub fn is_moderator(&self) -> bool {
        self.role.eq_ignore_ascii_case("moderator") || self.role.eq_ignore_ascii_case("admin")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: CurrentUser,
}

impl Session {
    /// Read the session back; a missing token or unreadable user means logged out
    pub fn load(storage: &Storage) -> Option<Self> {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty())?;
        let raw_user = storage.get(CURRENT_USER_KEY)?;
        match serde_json::from_str(&raw_user) {
            Ok(user) => Some(Self { token, user }),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", CURRENT_USER_KEY, e);
                None
            }
        }
    }

    pub fn save(&self, storage: &Storage) -> Result<()> {
        storage.set(TOKEN_KEY, self.token.clone())?;
        storage.set(CURRENT_USER_KEY, serde_json::to_string(&self.user)?)?;
        Ok(())
    }

    pub fn clear(storage: &Storage) -> Result<()> {
        storage.remove(TOKEN_KEY)?;
        storage.remove(CURRENT_USER_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user: CurrentUser {
                id: "u1".into(),
                name: "Nadia".into(),
                email: "nadia@campus.edu".into(),
                role: "technician".into(),
            },
        }
    }

    #[test]
    fn test_round_trip_through_storage() {
        let storage = Storage::in_memory();
        session().save(&storage).unwrap();

        let loaded = Session::load(&storage).unwrap();
        assert_eq!(loaded, session());
        assert!(loaded.user.is_technician());
        assert!(storage.get(CURRENT_USER_KEY).unwrap().contains("\"_id\":\"u1\""));
    }

    #[test]
    fn test_clear_logs_out() {
        let storage = Storage::in_memory();
        session().save(&storage).unwrap();
        Session::clear(&storage).unwrap();
        assert!(Session::load(&storage).is_none());
    }

    #[test]
    fn test_corrupt_user_is_logged_out() {
        let storage = Storage::in_memory();
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(CURRENT_USER_KEY, "{not json").unwrap();
        assert!(Session::load(&storage).is_none());
    }
}
