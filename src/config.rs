//! Client configuration: where to send requests, how long to wait, and how to sign.
//!
//! [`ClientConfig`] derives serde through [`ClientConfigBuilder`], so configuration embedded in a
//! caller's own config file is validated exactly like configuration assembled in code.

// self
use crate::{_prelude::*, error::ConfigError, sign::SignatureVersion};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.carehq.co.uk";

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigBuilder", into = "ClientConfigBuilder")]
pub struct ClientConfig {
	/// Base URL the `/v1/` endpoint paths are appended to.
	pub base_url: Url,
	/// Upper bound for each request, handed to the transport.
	pub timeout: Option<StdDuration>,
	/// Signature scheme; [`SignatureVersion::V2`] unless legacy signing is explicitly requested.
	pub signature_version: SignatureVersion,
}
impl ClientConfig {
	/// Returns a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		ClientConfig::builder().build().expect("Default client configuration must be valid.")
	}
}
impl TryFrom<ClientConfigBuilder> for ClientConfig {
	type Error = ConfigError;

	fn try_from(builder: ClientConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

/// Builder (and serde representation) for [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigBuilder {
	/// Base URL; validated by [`ClientConfigBuilder::build`].
	pub base_url: String,
	/// Request timeout in seconds.
	pub timeout_secs: Option<f64>,
	/// Signature scheme.
	pub signature_version: SignatureVersion,
}
impl ClientConfigBuilder {
	/// Overrides the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Sets the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout_secs = Some(timeout.as_secs_f64());

		self
	}

	/// Selects the signature scheme.
	pub fn signature_version(mut self, version: SignatureVersion) -> Self {
		self.signature_version = version;

		self
	}

	/// Validates the builder and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = validate_base_url(&self.base_url)?;
		let timeout = self
			.timeout_secs
			.map(|secs| {
				StdDuration::try_from_secs_f64(secs)
					.ok()
					.filter(|timeout| !timeout.is_zero())
					.ok_or(ConfigError::InvalidTimeout { secs })
			})
			.transpose()?;

		Ok(ClientConfig { base_url, timeout, signature_version: self.signature_version })
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			timeout_secs: None,
			signature_version: SignatureVersion::default(),
		}
	}
}
impl From<ClientConfig> for ClientConfigBuilder {
	fn from(config: ClientConfig) -> Self {
		Self {
			base_url: config.base_url.into(),
			timeout_secs: config.timeout.map(|timeout| timeout.as_secs_f64()),
			signature_version: config.signature_version,
		}
	}
}

fn validate_base_url(raw: &str) -> Result<Url, ConfigError> {
	let invalid = |reason| ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason };
	let url = Url::parse(raw).map_err(|_| invalid("not an absolute URL"))?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(invalid("scheme must be http or https"));
	}
	if url.cannot_be_a_base() {
		return Err(invalid("URL cannot be used as a base"));
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(invalid("query strings and fragments are not allowed"));
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_production_with_v2_signing() {
		let config = ClientConfig::default();

		assert_eq!(config.base_url.as_str(), "https://api.carehq.co.uk/");
		assert_eq!(config.timeout, None);
		assert_eq!(config.signature_version, SignatureVersion::V2);
	}

	#[test]
	fn builder_rejects_unusable_base_urls() {
		let unusable =
			["api.carehq.co.uk", "ftp://api.example.com", "https://x.test/?a=1", "mailto:a@b"];

		for raw in unusable {
			let err = ClientConfig::builder()
				.base_url(raw)
				.build()
				.expect_err("Unusable base URL must be rejected.");

			assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }), "{raw} was accepted.");
		}
	}

	#[test]
	fn builder_rejects_non_positive_timeouts() {
		let builder = ClientConfigBuilder { timeout_secs: Some(-1.0), ..Default::default() };

		assert!(matches!(builder.build(), Err(ConfigError::InvalidTimeout { .. })));

		let builder = ClientConfigBuilder { timeout_secs: Some(0.0), ..Default::default() };

		assert!(matches!(builder.build(), Err(ConfigError::InvalidTimeout { .. })));
	}

	#[test]
	fn serde_round_trip_validates() {
		let config: ClientConfig = serde_json::from_value(serde_json::json!({
			"base_url": "http://localhost:8080",
			"timeout_secs": 2.5,
			"signature_version": "legacy_v1",
		}))
		.expect("Config should deserialize.");

		assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
		assert_eq!(config.timeout, Some(StdDuration::from_millis(2_500)));
		assert_eq!(config.signature_version, SignatureVersion::LegacyV1);

		let encoded = serde_json::to_value(&config).expect("Config should serialize.");

		assert_eq!(encoded["timeout_secs"], 2.5);

		let defaults: ClientConfig =
			serde_json::from_str("{}").expect("Empty config should fall back to defaults.");

		assert_eq!(defaults, ClientConfig::default());
		assert!(serde_json::from_str::<ClientConfig>(r#"{"base_url":"nope"}"#).is_err());
	}
}
