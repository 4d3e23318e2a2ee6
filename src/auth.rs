//! Account credentials used to authenticate every API call.

// self
use crate::_prelude::*;

/// Redacted API secret wrapper keeping the shared secret out of logs.
///
/// The secret only ever feeds the signature; it is never placed on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSecret(String);
impl ApiSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ApiSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiSecret").field(&"<redacted>").finish()
	}
}
impl Display for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable identity of the calling account: account id, API key and shared secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Identifier of the account the API key belongs to.
	pub account_id: String,
	/// Key sent with every request to identify the caller.
	pub api_key: String,
	/// Shared secret used to sign requests.
	pub api_secret: ApiSecret,
}
impl Credentials {
	/// Creates a credential triple.
	pub fn new(
		account_id: impl Into<String>,
		api_key: impl Into<String>,
		api_secret: impl Into<String>,
	) -> Self {
		Self {
			account_id: account_id.into(),
			api_key: api_key.into(),
			api_secret: ApiSecret::new(api_secret),
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("account_id", &self.account_id)
			.field("api_key", &self.api_key)
			.field("api_secret", &"<redacted>")
			.finish()
	}
}
