//! Request signatures.
//!
//! # Versions
//!
//! - [`SignatureVersion::V2`] (default) signs `timestamp \n nonce \n METHOD \n /v1/<path> \n
//!   canonical-params` with HMAC-SHA-256 and sends a fresh nonce with every request, so a captured
//!   request cannot be replayed, retargeted to another endpoint or method, or altered.
//! - [`SignatureVersion::LegacyV1`] hashes `timestamp + raw params + secret` with SHA-1. It binds
//!   neither the method nor the path and carries no nonce. It is deprecated and only used when
//!   configured explicitly.

pub mod canonical;

pub use canonical::canonicalize;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::{Digest, Sha1};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::ApiSecret, params::Params};

type HmacSha256 = Hmac<Sha256>;

/// Random bytes drawn for each nonce.
pub const NONCE_BYTES: usize = 24;

/// Signature scheme used to authenticate requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureVersion {
	/// Canonical parameters, nonce, method and path under HMAC-SHA-256.
	#[default]
	V2,
	/// Deprecated SHA-1 concatenation without nonce or method/path binding.
	///
	/// Parameter values are hashed exactly as they are sent. Booleans render as `true`/`false`
	/// here, where older clients of this scheme sent `1` and an empty string; the service checks
	/// the signature against the values it receives, so either rendering verifies. Pass `1` or
	/// `""` explicitly to reproduce a legacy signature byte for byte.
	LegacyV1,
}
impl SignatureVersion {
	/// Value sent in the signature-version header.
	pub const fn as_header_value(self) -> &'static str {
		match self {
			Self::V2 => "2.0",
			Self::LegacyV1 => "1.0",
		}
	}
}
impl Display for SignatureVersion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_header_value())
	}
}

/// Single-use random token binding a signature to one request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);
impl Nonce {
	/// Draws [`NONCE_BYTES`] random bytes and encodes them URL-safe without padding.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; NONCE_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Wraps a caller-supplied nonce, typically for reproducing a known signature.
	pub fn from_string(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Encoded nonce.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Nonce {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for Nonce {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Nonce({})", self.0)
	}
}
impl Display for Nonce {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Authentication material produced for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
	/// Scheme that produced the signature.
	pub version: SignatureVersion,
	/// Timestamp string that was signed and must be sent verbatim.
	pub timestamp: String,
	/// Nonce that was signed; absent for the legacy scheme.
	pub nonce: Option<Nonce>,
	/// Lower-case hex digest.
	pub value: String,
}
impl Debug for Signature {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signature")
			.field("version", &self.version)
			.field("timestamp", &self.timestamp)
			.field("nonce", &self.nonce)
			.field("value", &"<redacted>")
			.finish()
	}
}

/// Signs requests for one secret under one [`SignatureVersion`].
#[derive(Clone, Debug)]
pub struct Signer {
	secret: ApiSecret,
	version: SignatureVersion,
}
impl Signer {
	/// Creates a signer.
	pub fn new(secret: ApiSecret, version: SignatureVersion) -> Self {
		#[cfg(feature = "tracing")]
		if matches!(version, SignatureVersion::LegacyV1) {
			tracing::warn!("legacy v1 request signing is deprecated and lacks replay protection");
		}

		Self { secret, version }
	}

	/// Configured scheme.
	pub fn version(&self) -> SignatureVersion {
		self.version
	}

	/// Signs a request at the current instant with a fresh nonce.
	///
	/// `path` is the endpoint path without the `/v1/` prefix; leading slashes are ignored.
	pub fn sign(&self, method: &str, path: &str, source: &Params) -> Signature {
		let now = OffsetDateTime::now_utc();

		match self.version {
			SignatureVersion::V2 => self.sign_v2_at(
				now.unix_timestamp().to_string(),
				Nonce::generate(),
				method,
				path,
				source,
			),
			SignatureVersion::LegacyV1 => {
				let timestamp = legacy_timestamp(now);
				let value = sign_v1_legacy(&self.secret, &timestamp, &legacy_body(source));

				Signature { version: SignatureVersion::LegacyV1, timestamp, nonce: None, value }
			},
		}
	}

	/// Signs under the V2 scheme with an explicit timestamp and nonce.
	pub fn sign_v2_at(
		&self,
		timestamp: String,
		nonce: Nonce,
		method: &str,
		path: &str,
		source: &Params,
	) -> Signature {
		let value = sign_v2(
			&self.secret,
			&timestamp,
			&nonce,
			method,
			&signing_path(path),
			&canonicalize(source),
		);

		Signature { version: SignatureVersion::V2, timestamp, nonce: Some(nonce), value }
	}
}

/// Signed path for an endpoint: `/v1/` followed by `path` without leading slashes.
pub fn signing_path(path: &str) -> String {
	format!("/v1/{}", normalize_path(path))
}

/// Strips caller-supplied leading slashes from an endpoint path.
pub fn normalize_path(path: &str) -> &str {
	path.trim_start_matches('/')
}

/// Builds the V2 string-to-sign from its five fields.
pub fn string_to_sign(
	timestamp: &str,
	nonce: &Nonce,
	method: &str,
	signing_path: &str,
	canonical: &str,
) -> String {
	[timestamp, nonce.as_str(), &method.to_ascii_uppercase(), signing_path, canonical].join("\n")
}

/// Computes the V2 signature: lower-case hex HMAC-SHA-256 of the string-to-sign.
pub fn sign_v2(
	secret: &ApiSecret,
	timestamp: &str,
	nonce: &Nonce,
	method: &str,
	signing_path: &str,
	canonical: &str,
) -> String {
	let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
		.expect("HMAC can take key of any size");

	mac.update(string_to_sign(timestamp, nonce, method, signing_path, canonical).as_bytes());

	hex::encode(mac.finalize().into_bytes())
}

/// Computes the deprecated V1 signature: hex SHA-1 of `timestamp + body + secret`.
pub fn sign_v1_legacy(secret: &ApiSecret, timestamp: &str, body: &str) -> String {
	let mut hasher = Sha1::new();

	hasher.update(timestamp.as_bytes());
	hasher.update(body.as_bytes());
	hasher.update(secret.expose().as_bytes());

	hex::encode(hasher.finalize())
}

/// Concatenates each non-null key and its values in insertion order, as the V1 scheme signs them.
pub fn legacy_body(params: &Params) -> String {
	let mut buf = String::new();

	for (key, values) in params.without_nulls() {
		buf.push_str(key);

		for value in values {
			buf.push_str(value);
		}
	}

	buf
}

/// V1 timestamp: seconds since the epoch with a microsecond fraction.
pub fn legacy_timestamp(now: OffsetDateTime) -> String {
	format!("{}.{:06}", now.unix_timestamp(), now.microsecond())
}
