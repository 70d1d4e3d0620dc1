//! Session store contract consulted by the interceptor and the refresh gate.
//!
//! The client never owns credentials. It reads the current tokens, hands freshly rotated
//! pairs back, and asks the store to tear the session down when a refresh fails. Stores are
//! injected per client, so tests can build isolated clients over isolated stores.

pub mod callback;
pub mod memory;

pub use callback::CallbackSession;
pub use memory::MemorySession;

// self
use crate::auth::{CredentialPair, TokenSecret};

/// Storage contract for the signed-in session.
///
/// Implementations are called synchronously from inside request futures and must not block
/// for long; persistence layers should write through a cache.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the current access token, if the session has one.
	fn access_token(&self) -> Option<TokenSecret>;

	/// Returns the current refresh token, if the session has one.
	fn refresh_token(&self) -> Option<TokenSecret>;

	/// Replaces both tokens after a successful refresh.
	fn set_refreshed_tokens(&self, pair: CredentialPair);

	/// Terminates the session and discards every stored credential.
	fn logout(&self);
}
