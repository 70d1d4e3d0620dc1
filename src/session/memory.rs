//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	session::SessionStore,
};

#[derive(Debug, Default)]
struct Tokens {
	access: Option<TokenSecret>,
	refresh: Option<TokenSecret>,
}

/// Session store that keeps tokens in-process. Clones share the same session.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
	tokens: Arc<RwLock<Tokens>>,
	logouts: Arc<AtomicU64>,
}
impl MemorySession {
	/// Creates a session that is already signed in with `pair`.
	pub fn signed_in(pair: CredentialPair) -> Self {
		let session = Self::default();

		session.sign_in(pair);

		session
	}

	/// Creates a session from independently optional tokens.
	pub fn from_parts(access: Option<TokenSecret>, refresh: Option<TokenSecret>) -> Self {
		Self {
			tokens: Arc::new(RwLock::new(Tokens { access, refresh })),
			logouts: Default::default(),
		}
	}

	/// Stores the pair issued by a login.
	pub fn sign_in(&self, pair: CredentialPair) {
		let mut tokens = self.tokens.write();

		tokens.access = Some(pair.access_token);
		tokens.refresh = Some(pair.refresh_token);
	}

	/// Returns the stored pair when both tokens are present.
	pub fn current(&self) -> Option<CredentialPair> {
		let tokens = self.tokens.read();

		match (&tokens.access, &tokens.refresh) {
			(Some(access), Some(refresh)) =>
				Some(CredentialPair { access_token: access.clone(), refresh_token: refresh.clone() }),
			_ => None,
		}
	}

	/// Returns `true` while any token is stored.
	pub fn is_signed_in(&self) -> bool {
		let tokens = self.tokens.read();

		tokens.access.is_some() || tokens.refresh.is_some()
	}

	/// Returns how many times the session has been torn down.
	pub fn logout_count(&self) -> u64 {
		self.logouts.load(Ordering::Relaxed)
	}
}
impl SessionStore for MemorySession {
	fn access_token(&self) -> Option<TokenSecret> {
		self.tokens.read().access.clone()
	}

	fn refresh_token(&self) -> Option<TokenSecret> {
		self.tokens.read().refresh.clone()
	}

	fn set_refreshed_tokens(&self, pair: CredentialPair) {
		self.sign_in(pair);
	}

	fn logout(&self) {
		*self.tokens.write() = Tokens::default();

		self.logouts.fetch_add(1, Ordering::Relaxed);
	}
}
