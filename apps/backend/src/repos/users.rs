//! User storage interface and the bundled in-memory implementation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::auth::claims::Role;
use crate::error::{AppError, ErrorCode};
use crate::services::password::PasswordDigest;

/// Stored user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Normalized email, unique across users
    pub email: String,
    pub role: Role,
    pub password: PasswordDigest,
}

/// User to be created; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: PasswordDigest,
}

/// Synchronous document-store style access to users.
pub trait UserStore: Send + Sync {
    /// Persist a user. Fails with `Conflict` if the email is taken.
    fn store(&self, user: NewUser) -> Result<User, AppError>;
    fn find_by_id(&self, id: &str) -> Option<User>;
    fn find_by_email(&self, email: &str) -> Option<User>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    by_id: DashMap<String, User>,
    /// email -> id
    by_email: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn store(&self, new_user: NewUser) -> Result<User, AppError> {
        // The email index entry is held across the insert so two concurrent
        // registrations for one address cannot both succeed.
        match self.by_email.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                ErrorCode::EmailTaken,
                "Email already in use",
            )),
            Entry::Vacant(slot) => {
                let user = User {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: new_user.name,
                    email: new_user.email,
                    role: new_user.role,
                    password: new_user.password,
                };
                self.by_id.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    fn find_by_id(&self, id: &str) -> Option<User> {
        self.by_id.get(id).map(|u| u.value().clone())
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        let id = self.by_email.get(email)?.value().clone();
        self.find_by_id(&id)
    }
}
