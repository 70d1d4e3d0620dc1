//! [`SessionStore`] adapter built from plain closures.
//!
//! Suits front ends that keep tokens in their own storage: hand the client two token getters,
//! a setter for rotated pairs, and a logout hook that clears storage and returns the user to
//! the sign-in screen.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	session::SessionStore,
};

type TokenGetter = Box<dyn Fn() -> Option<String> + Send + Sync>;
type PairSetter = Box<dyn Fn(CredentialPair) + Send + Sync>;
type LogoutHook = Box<dyn Fn() + Send + Sync>;

/// Session store whose operations are delegated to caller-supplied closures.
pub struct CallbackSession {
	get_access_token: TokenGetter,
	get_refresh_token: TokenGetter,
	set_refreshed_tokens: PairSetter,
	logout: LogoutHook,
}
impl CallbackSession {
	/// Wires the four session hooks.
	pub fn new(
		get_access_token: impl Fn() -> Option<String> + Send + Sync + 'static,
		get_refresh_token: impl Fn() -> Option<String> + Send + Sync + 'static,
		set_refreshed_tokens: impl Fn(CredentialPair) + Send + Sync + 'static,
		logout: impl Fn() + Send + Sync + 'static,
	) -> Self {
		Self {
			get_access_token: Box::new(get_access_token),
			get_refresh_token: Box::new(get_refresh_token),
			set_refreshed_tokens: Box::new(set_refreshed_tokens),
			logout: Box::new(logout),
		}
	}
}
impl SessionStore for CallbackSession {
	fn access_token(&self) -> Option<TokenSecret> {
		(self.get_access_token)().filter(|token| !token.is_empty()).map(TokenSecret::new)
	}

	fn refresh_token(&self) -> Option<TokenSecret> {
		(self.get_refresh_token)().filter(|token| !token.is_empty()).map(TokenSecret::new)
	}

	fn set_refreshed_tokens(&self, pair: CredentialPair) {
		(self.set_refreshed_tokens)(pair)
	}

	fn logout(&self) {
		(self.logout)()
	}
}
impl Debug for CallbackSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackSession")
			.field("get_access_token", &"Fn() -> Option<String>")
			.field("get_refresh_token", &"Fn() -> Option<String>")
			.field("set_refreshed_tokens", &"Fn(CredentialPair)")
			.field("logout", &"Fn()")
			.finish()
	}
}
