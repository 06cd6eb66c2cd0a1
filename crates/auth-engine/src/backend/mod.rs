//! Backend auth connector.
//!
//! [`AuthBackend`] is the only thing that mutates the session. Everything else
//! reads it through listeners or `current_user()`.

mod identity_toolkit;
mod session_state;
mod storage;

pub use identity_toolkit::{IdentityToolkitBackend, StartupValidation};
pub use session_state::{BackendSession, ListenerHandle, SessionListener, SessionState};
pub use storage::{
    FileStorage, MemoryStorage, SecureStorage, SessionVault, StorageError, StorageResult,
    SESSION_KEY,
};

use crate::credential::{BackendSessionToken, NativeAssertion, UserId};
use crate::error::AuthResult;
use async_trait::async_trait;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Establish a session from a backend-minted custom token.
    async fn sign_in_with_custom_token(&self, token: &BackendSessionToken) -> AuthResult<UserId>;

    /// Establish a session from a provider assertion the backend verifies natively.
    async fn sign_in_with_assertion(&self, assertion: &NativeAssertion) -> AuthResult<UserId>;

    /// Drop the current session. Synchronous.
    fn sign_out(&self) -> AuthResult<()>;

    /// Irreversibly delete the signed-in user, then drop the session.
    async fn delete_current_user(&self) -> AuthResult<()>;

    /// Register a listener. It is called once right away with the current user.
    fn add_session_change_listener(&self, listener: SessionListener) -> ListenerHandle;

    fn remove_session_change_listener(&self, handle: ListenerHandle) -> bool;

    fn current_user(&self) -> Option<UserId>;
}
