//! Assembly of signed wire requests.
//!
//! [`RequestAssembler::build`] selects the signing source, signs it, and produces a
//! [`SignedRequest`] with the final URL, authentication headers and form body. No I/O happens
//! here.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{ACCEPT, CONTENT_TYPE},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ClientConfig,
	error::ConfigError,
	params::Params,
	sign::{self, Signature, SignatureVersion, Signer},
};

/// Header carrying the account identifier.
pub const ACCOUNT_ID_HEADER: HeaderName = HeaderName::from_static("x-carehq-accountid");
/// Header carrying the API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-carehq-apikey");
/// Header carrying the per-request nonce.
pub const NONCE_HEADER: HeaderName = HeaderName::from_static("x-carehq-nonce");
/// Header carrying the signature.
pub const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("x-carehq-signature");
/// Header carrying the signature scheme tag.
pub const SIGNATURE_VERSION_HEADER: HeaderName =
	HeaderName::from_static("x-carehq-signature-version");
/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: HeaderName = HeaderName::from_static("x-carehq-timestamp");

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Which parameter set feeds the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningSource {
	/// Query parameters.
	Params,
	/// Body parameters.
	Data,
}
impl SigningSource {
	/// Source dictated by the HTTP method.
	///
	/// Methods without body semantics (`GET`, `HEAD`, `DELETE`, `OPTIONS`) sign their query
	/// parameters; every other method signs its body.
	pub fn for_method(method: &Method) -> Self {
		if [Method::GET, Method::HEAD, Method::DELETE, Method::OPTIONS].contains(method) {
			Self::Params
		} else {
			Self::Data
		}
	}

	/// Source used by the legacy scheme: query parameters when any are set, else the body.
	pub fn legacy(params: Option<&Params>) -> Self {
		if params.is_some_and(Params::has_values) { Self::Params } else { Self::Data }
	}

	/// Picks the signing source for `version`.
	pub fn select(version: SignatureVersion, method: &Method, params: Option<&Params>) -> Self {
		match version {
			SignatureVersion::V2 => Self::for_method(method),
			SignatureVersion::LegacyV1 => Self::legacy(params),
		}
	}
}

/// Fully-signed request handed to the transport.
///
/// The signature header is marked sensitive, so `Debug` output does not reveal it.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// HTTP method.
	pub method: Method,
	/// Endpoint URL including the query string.
	pub url: Url,
	/// Authentication and content headers.
	pub headers: HeaderMap,
	/// Form-encoded body, when body parameters were supplied.
	pub body: Option<String>,
	/// Upper bound for the whole exchange.
	pub timeout: Option<StdDuration>,
}

/// Builds [`SignedRequest`]s for one set of credentials and configuration.
#[derive(Clone, Debug)]
pub struct RequestAssembler {
	credentials: Credentials,
	base_url: Url,
	timeout: Option<StdDuration>,
	signer: Signer,
}
impl RequestAssembler {
	/// Creates an assembler for `credentials` under `config`.
	pub fn new(credentials: Credentials, config: &ClientConfig) -> Self {
		let signer = Signer::new(credentials.api_secret.clone(), config.signature_version);

		Self { credentials, base_url: config.base_url.clone(), timeout: config.timeout, signer }
	}

	/// Signature scheme in use.
	pub fn signature_version(&self) -> SignatureVersion {
		self.signer.version()
	}

	/// Builds a signed request with a fresh timestamp and nonce.
	pub fn build(
		&self,
		method: &Method,
		path: &str,
		params: Option<&Params>,
		data: Option<&Params>,
	) -> Result<SignedRequest, ConfigError> {
		let empty = Params::new();
		let source = match SigningSource::select(self.signer.version(), method, params) {
			SigningSource::Params => params.unwrap_or(&empty),
			SigningSource::Data => data.unwrap_or(&empty),
		};
		let url = endpoint_url(&self.base_url, path)?;
		let signature =
			self.signer.sign(method.as_str(), wire_endpoint_path(&self.base_url, &url)?, source);

		self.assemble(method, url, params, data, &signature)
	}

	/// Builds a request around an already computed signature.
	pub fn build_with_signature(
		&self,
		method: &Method,
		path: &str,
		params: Option<&Params>,
		data: Option<&Params>,
		signature: &Signature,
	) -> Result<SignedRequest, ConfigError> {
		let url = endpoint_url(&self.base_url, path)?;

		self.assemble(method, url, params, data, signature)
	}

	fn assemble(
		&self,
		method: &Method,
		mut url: Url,
		params: Option<&Params>,
		data: Option<&Params>,
		signature: &Signature,
	) -> Result<SignedRequest, ConfigError> {
		if let Some(query) = params.and_then(encode_form) {
			url.set_query(Some(&query));
		}

		let body = data.and_then(encode_form);
		let mut headers = self.auth_headers(signature)?;

		if body.is_some() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
		}

		Ok(SignedRequest { method: method.clone(), url, headers, body, timeout: self.timeout })
	}

	fn auth_headers(&self, signature: &Signature) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::with_capacity(8);

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		headers.insert(
			ACCOUNT_ID_HEADER,
			header_value("X-CareHQ-AccountId", &self.credentials.account_id)?,
		);
		headers.insert(API_KEY_HEADER, header_value("X-CareHQ-APIKey", &self.credentials.api_key)?);

		if let Some(nonce) = &signature.nonce {
			headers.insert(NONCE_HEADER, header_value("X-CareHQ-Nonce", nonce.as_str())?);
		}

		let mut signature_value = header_value("X-CareHQ-Signature", &signature.value)?;

		signature_value.set_sensitive(true);
		headers.insert(SIGNATURE_HEADER, signature_value);
		headers.insert(
			SIGNATURE_VERSION_HEADER,
			HeaderValue::from_static(signature.version.as_header_value()),
		);
		headers.insert(TIMESTAMP_HEADER, header_value("X-CareHQ-Timestamp", &signature.timestamp)?);

		Ok(headers)
	}
}

/// Joins the base URL, the `/v1/` prefix and the normalized endpoint path.
///
/// Paths the URL parser would restructure are rejected: dot segments (including `%2e` forms and
/// `\` separators) and `?`/`#` delimiters. Percent-encoding of other characters still happens
/// here, which is why the signed path is taken from the result via [`wire_endpoint_path`].
pub fn endpoint_url(base_url: &Url, path: &str) -> Result<Url, ConfigError> {
	let path = sign::normalize_path(path);
	let invalid = |reason| ConfigError::InvalidPath { path: path.to_owned(), reason };

	if path.contains(['?', '#']) {
		return Err(invalid("query and fragment delimiters are not allowed"));
	}
	if path.split(['/', '\\']).any(is_dot_segment) {
		return Err(invalid("dot segments are not allowed"));
	}

	let raw = format!("{}/v1/{path}", base_url.as_str().trim_end_matches('/'));

	Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { source })
}

/// Endpoint path of `url` as it goes on the wire, relative to the base URL's `/v1/` prefix.
pub fn wire_endpoint_path<'a>(base_url: &Url, url: &'a Url) -> Result<&'a str, ConfigError> {
	let prefix = format!("{}/v1/", base_url.path().trim_end_matches('/'));

	url.path().strip_prefix(prefix.as_str()).ok_or_else(|| ConfigError::InvalidPath {
		path: url.path().to_owned(),
		reason: "path leaves the API prefix",
	})
}

fn is_dot_segment(segment: &str) -> bool {
	matches!(segment.to_ascii_lowercase().replace("%2e", ".").as_str(), "." | "..")
}

/// Form-encodes parameters as repeated `key=value` pairs in insertion order.
///
/// Returns `None` when no non-null values remain.
pub fn encode_form(params: &Params) -> Option<String> {
	let mut serializer = Serializer::new(String::new());
	let mut any = false;

	for (key, values) in params.without_nulls() {
		for value in values {
			serializer.append_pair(key, value);

			any = true;
		}
	}

	any.then(|| serializer.finish())
}

fn header_value(header: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
	HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue { header })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ApiSecret,
		sign::{Nonce, canonicalize, sign_v2, string_to_sign},
	};

	fn assembler(version: SignatureVersion) -> RequestAssembler {
		let config = ClientConfig::builder()
			.base_url("https://api.example.com/")
			.signature_version(version)
			.timeout(StdDuration::from_secs(5))
			.build()
			.expect("Fixture config should be valid.");

		RequestAssembler::new(Credentials::new("acct-1", "key-1", "secret-1"), &config)
	}

	fn header<'a>(request: &'a SignedRequest, name: &HeaderName) -> &'a str {
		request
			.headers
			.get(name)
			.and_then(|value| value.to_str().ok())
			.expect("Header should be present and printable.")
	}

	#[test]
	fn get_request_signs_params_and_repeats_list_keys() {
		let assembler = assembler(SignatureVersion::V2);
		let params = Params::new().with("status", ["active", "pending"]);
		let nonce = Nonce::from_string("fixed-nonce");
		let signature = assembler.signer.sign_v2_at(
			"1700000000".into(),
			nonce.clone(),
			"GET",
			"/residents",
			&params,
		);
		let request = assembler
			.build_with_signature(&Method::GET, "/residents", Some(&params), None, &signature)
			.expect("Request should build.");

		assert_eq!(canonicalize(&params), "status=active\nstatus=pending");
		assert_eq!(
			string_to_sign("1700000000", &nonce, "GET", "/v1/residents", &canonicalize(&params)),
			"1700000000\nfixed-nonce\nGET\n/v1/residents\nstatus=active\nstatus=pending"
		);
		assert_eq!(
			request.url.as_str(),
			"https://api.example.com/v1/residents?status=active&status=pending"
		);
		assert_eq!(request.body, None);
		assert_eq!(header(&request, &SIGNATURE_HEADER), signature.value);
		assert_eq!(header(&request, &NONCE_HEADER), "fixed-nonce");
		assert_eq!(header(&request, &TIMESTAMP_HEADER), "1700000000");
		assert_eq!(header(&request, &SIGNATURE_VERSION_HEADER), "2.0");
		assert_eq!(header(&request, &ACCOUNT_ID_HEADER), "acct-1");
		assert_eq!(header(&request, &API_KEY_HEADER), "key-1");
		assert_eq!(header(&request, &ACCEPT), "application/json");
		assert_eq!(request.timeout, Some(StdDuration::from_secs(5)));
	}

	#[test]
	fn headers_never_contain_the_secret() {
		let request = assembler(SignatureVersion::V2)
			.build(&Method::POST, "residents", None, Some(&Params::new().with("name", "secret-1x")))
			.expect("Request should build.");

		for (name, value) in &request.headers {
			assert_ne!(value.as_bytes(), b"secret-1", "Header {name} leaked the secret.");
		}
		assert!(!format!("{request:?}").contains(header(&request, &SIGNATURE_HEADER)));
	}

	#[test]
	fn post_request_signs_and_encodes_body() {
		let assembler = assembler(SignatureVersion::V2);
		let params = Params::new().with("dry_run", true);
		let data = Params::new().with("first_name", "Ann Marie").with("tags", ["a&b", "c"]);
		let request = assembler
			.build(&Method::POST, "residents", Some(&params), Some(&data))
			.expect("Request should build.");

		assert_eq!(request.url.query(), Some("dry_run=true"));
		assert_eq!(request.body.as_deref(), Some("first_name=Ann+Marie&tags=a%26b&tags=c"));
		assert_eq!(header(&request, &CONTENT_TYPE), FORM_CONTENT_TYPE);
	}

	#[test]
	fn signing_source_follows_method() {
		assert_eq!(SigningSource::for_method(&Method::GET), SigningSource::Params);
		assert_eq!(SigningSource::for_method(&Method::DELETE), SigningSource::Params);
		assert_eq!(SigningSource::for_method(&Method::POST), SigningSource::Data);
		assert_eq!(SigningSource::for_method(&Method::PUT), SigningSource::Data);
		assert_eq!(SigningSource::for_method(&Method::PATCH), SigningSource::Data);

		let params = Params::new().with("a", "1");

		assert_eq!(
			SigningSource::select(SignatureVersion::LegacyV1, &Method::POST, Some(&params)),
			SigningSource::Params
		);
		assert_eq!(
			SigningSource::select(SignatureVersion::LegacyV1, &Method::POST, Some(&Params::new())),
			SigningSource::Data
		);
	}

	#[test]
	fn empty_and_null_params_are_omitted() {
		let request = assembler(SignatureVersion::V2)
			.build(
				&Method::GET,
				"residents",
				Some(&Params::new().with("after", None::<&str>)),
				Some(&Params::new()),
			)
			.expect("Request should build.");

		assert_eq!(request.url.as_str(), "https://api.example.com/v1/residents");
		assert_eq!(request.body, None);
		assert!(request.headers.get(CONTENT_TYPE).is_none());
	}

	#[test]
	fn legacy_requests_omit_the_nonce() {
		let request = assembler(SignatureVersion::LegacyV1)
			.build(&Method::GET, "residents", Some(&Params::new().with("a", "1")), None)
			.expect("Request should build.");

		assert!(request.headers.get(NONCE_HEADER).is_none());
		assert_eq!(header(&request, &SIGNATURE_VERSION_HEADER), "1.0");
		assert_eq!(header(&request, &SIGNATURE_HEADER).len(), 40);
	}

	#[test]
	fn control_characters_in_credentials_fail_fast() {
		let config = ClientConfig::default();
		let assembler =
			RequestAssembler::new(Credentials::new("acct\n1", "key-1", "secret-1"), &config);
		let err = assembler
			.build(&Method::GET, "residents", None, None)
			.expect_err("Newlines are not valid header values.");

		assert!(matches!(err, ConfigError::InvalidHeaderValue { header: "X-CareHQ-AccountId" }));
	}

	#[test]
	fn endpoint_url_handles_nested_base_paths() {
		let base =
			Url::parse("https://proxy.example.com/carehq").expect("Fixture URL should parse.");
		let url = endpoint_url(&base, "//staff/42").expect("Endpoint URL should build.");

		assert_eq!(url.as_str(), "https://proxy.example.com/carehq/v1/staff/42");
		assert_eq!(
			wire_endpoint_path(&base, &url).expect("Endpoint stays under the prefix."),
			"staff/42"
		);
	}

	#[test]
	fn signature_covers_the_path_sent_on_the_wire() {
		let assembler = assembler(SignatureVersion::V2);

		for path in ["residents/Ann Smith", "résidents/1", "residents/r1/", "/staff"] {
			let request =
				assembler.build(&Method::GET, path, None, None).expect("Path should be accepted.");
			let expected = sign_v2(
				&ApiSecret::new("secret-1"),
				header(&request, &TIMESTAMP_HEADER),
				&Nonce::from_string(header(&request, &NONCE_HEADER)),
				"GET",
				request.url.path(),
				"",
			);

			assert_eq!(header(&request, &SIGNATURE_HEADER), expected, "{path}");
		}

		let request = assembler
			.build(&Method::GET, "residents/Ann Smith", None, None)
			.expect("Path with a space should be accepted.");

		assert_eq!(request.url.path(), "/v1/residents/Ann%20Smith");
	}

	#[test]
	fn paths_the_url_parser_would_rewrite_are_rejected() {
		let assembler = assembler(SignatureVersion::V2);

		for path in [
			"residents/../staff",
			"residents/./1",
			"..",
			"residents/%2E%2E/staff",
			"residents/.%2e",
			"residents\\..\\staff",
			"residents?status=active",
			"residents#top",
		] {
			let err = assembler
				.build(&Method::GET, path, None, None)
				.expect_err("Rewritten path must be rejected.");

			assert!(matches!(err, ConfigError::InvalidPath { .. }), "{path} was accepted.");
		}

		assert!(assembler.build(&Method::GET, "residents/v1.2/..x", None, None).is_ok());
	}
}
