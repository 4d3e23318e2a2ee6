//! Client facade tying signing, transport, rate-limit tracking and error dispatch together.
//!
//! Each call performs exactly one signed exchange: the request is assembled and signed, handed
//! to the [`HttpTransport`], the rate-limit headers are recorded, and the status decides between
//! a decoded [`ApiResponse`] and a typed [`ApiError`](crate::error::ApiError). Nothing is
//! retried; callers that hit [`ApiErrorKind::RateLimitExceeded`](crate::ApiErrorKind) decide
//! themselves whether to wait for [`RateLimitSnapshot::reset`] and try again.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ClientConfig,
	error::{self, ConfigError, DecodeError},
	obs::{self, RequestOutcome, RequestSpan},
	params::Params,
	rate_limit::{RateLimitSnapshot, RateLimitTracker},
	request::RequestAssembler,
	sign::SignatureVersion,
	transport::HttpTransport,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Decoded success response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
	/// HTTP status (200 or 204).
	pub status: u16,
	/// Decoded body; a 204 decodes from JSON `null`.
	pub body: T,
	/// Rate-limit state reported on this response, if any.
	pub rate_limit: Option<RateLimitSnapshot>,
}
impl<T> ApiResponse<T> {
	/// Discards the metadata and returns the body.
	pub fn into_body(self) -> T {
		self.body
	}
}

/// Authenticated client for one account.
///
/// Clones share the transport and the rate-limit tracker, so a client can be cloned freely
/// across tasks while [`ApiClient::rate_limit`] keeps reporting the latest snapshot observed by
/// any of them.
pub struct ApiClient<T>
where
	T: HttpTransport,
{
	transport: Arc<T>,
	assembler: Arc<RequestAssembler>,
	rate_limit: RateLimitTracker,
}
impl<T> ApiClient<T>
where
	T: HttpTransport,
{
	/// Creates a client that sends through the caller-provided transport.
	///
	/// Pass an `Arc<T>` to share one transport between several clients.
	pub fn with_transport(credentials: Credentials, config: ClientConfig, transport: T) -> Self {
		Self {
			transport: Arc::new(transport),
			assembler: Arc::new(RequestAssembler::new(credentials, &config)),
			rate_limit: RateLimitTracker::default(),
		}
	}

	/// Latest rate-limit snapshot, or `None` before any response reported one.
	///
	/// The value is advisory: with concurrent calls it may reflect any recently completed one.
	pub fn rate_limit(&self) -> Option<RateLimitSnapshot> {
		self.rate_limit.snapshot()
	}

	/// Signature scheme in use.
	pub fn signature_version(&self) -> SignatureVersion {
		self.assembler.signature_version()
	}

	/// Calls `method` on `path` (relative to `/v1/`) and returns the decoded JSON body.
	///
	/// `params` become the query string and `data` the form body. The signed set follows the
	/// method: query parameters for `GET`/`HEAD`/`DELETE`/`OPTIONS`, the body otherwise.
	pub async fn request(
		&self,
		method: impl AsRef<str>,
		path: &str,
		params: Option<&Params>,
		data: Option<&Params>,
	) -> Result<ApiResponse<JsonValue>> {
		self.request_as(method, path, params, data).await
	}

	/// Like [`ApiClient::request`] but decodes the body into `R`.
	pub async fn request_as<R>(
		&self,
		method: impl AsRef<str>,
		path: &str,
		params: Option<&Params>,
		data: Option<&Params>,
	) -> Result<ApiResponse<R>>
	where
		R: DeserializeOwned,
	{
		let method = parse_method(method.as_ref())?;
		let span = RequestSpan::new(method.as_str(), path);

		obs::record_request_outcome(method.as_str(), RequestOutcome::Attempt);

		let result = span.instrument(self.execute(&method, path, params, data)).await;

		obs::record_request_outcome(method.as_str(), RequestOutcome::of(&result));

		result
	}

	/// `GET` with query parameters.
	pub async fn get(&self, path: &str, params: Option<&Params>) -> Result<ApiResponse<JsonValue>> {
		self.request(Method::GET, path, params, None).await
	}

	/// `POST` with body parameters.
	pub async fn post(&self, path: &str, data: Option<&Params>) -> Result<ApiResponse<JsonValue>> {
		self.request(Method::POST, path, None, data).await
	}

	/// `PUT` with body parameters.
	pub async fn put(&self, path: &str, data: Option<&Params>) -> Result<ApiResponse<JsonValue>> {
		self.request(Method::PUT, path, None, data).await
	}

	/// `PATCH` with body parameters.
	pub async fn patch(
		&self,
		path: &str,
		data: Option<&Params>,
	) -> Result<ApiResponse<JsonValue>> {
		self.request(Method::PATCH, path, None, data).await
	}

	/// `DELETE` with query parameters.
	pub async fn delete(
		&self,
		path: &str,
		params: Option<&Params>,
	) -> Result<ApiResponse<JsonValue>> {
		self.request(Method::DELETE, path, params, None).await
	}

	async fn execute<R>(
		&self,
		method: &Method,
		path: &str,
		params: Option<&Params>,
		data: Option<&Params>,
	) -> Result<ApiResponse<R>>
	where
		R: DeserializeOwned,
	{
		let request = self.assembler.build(method, path, params, data)?;
		let response = self.transport.send(request).await?;
		let status = response.status;
		let rate_limit = self.rate_limit.update(&response.headers);

		if !response.is_success() {
			return Err(error::dispatch(status, &response.body).with_rate_limit(rate_limit).into());
		}

		let body = if status == 204 {
			serde_path_to_error::deserialize(JsonValue::Null)
		} else {
			response.decode()
		}
		.map_err(|source| DecodeError::ResponseBody { status, source })?;

		Ok(ApiResponse { status, body, rate_limit })
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by the default reqwest transport.
	pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
		Ok(Self::with_transport(credentials, config, ReqwestTransport::new()?))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			assembler: self.assembler.clone(),
			rate_limit: self.rate_limit.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("assembler", &self.assembler)
			.field("rate_limit", &self.rate_limit.snapshot())
			.finish()
	}
}

fn parse_method(method: &str) -> Result<Method, ConfigError> {
	Ok(Method::from_bytes(method.to_ascii_uppercase().as_bytes())?)
}
