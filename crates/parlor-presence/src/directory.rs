//! The identity collaborator: display name → stable identity.
//!
//! Parlor does not verify who anyone is; that is the directory's
//! problem. The [`Directory`] trait is the seam: production deployments
//! back it with an account store, tests and small installs use
//! [`GuestDirectory`], which mints a guest identity the first time a
//! display name shows up and returns the same one ever after.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::Mutex;

use parlor_protocol::{UserId, UserIdentity};

use crate::DirectoryError;

/// Resolves a display name to a stable [`UserIdentity`].
pub trait Directory: Send + Sync + 'static {
    /// Looks up (or creates) the identity for `username`.
    fn resolve(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<UserIdentity, DirectoryError>>
    + Send;
}

/// In-memory guest directory.
///
/// Identities live for the server process only, which matches the rest of
/// the in-memory state. Avatars are deterministic per name so a guest
/// keeps their face across reconnects.
#[derive(Debug, Default)]
pub struct GuestDirectory {
    users: Mutex<HashMap<String, UserIdentity>>,
}

impl GuestDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Directory for GuestDirectory {
    async fn resolve(
        &self,
        username: &str,
    ) -> Result<UserIdentity, DirectoryError> {
        let mut users = self.users.lock().await;
        if let Some(existing) = users.get(username) {
            return Ok(existing.clone());
        }

        let identity = UserIdentity {
            id: UserId::new(format!("guest-{}", random_suffix())),
            username: username.to_string(),
            avatar: format!(
                "https://api.dicebear.com/7.x/avataaars/svg?seed={username}"
            ),
        };
        tracing::info!(
            user = %identity.username,
            id = %identity.id,
            "guest identity created"
        );
        users.insert(username.to_string(), identity.clone());
        Ok(identity)
    }
}

/// Random 16-hex-character suffix for guest ids.
fn random_suffix() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
