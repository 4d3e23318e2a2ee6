//! Transport primitives for sending signed requests.
//!
//! The client's only dependency on an HTTP stack is [`HttpTransport`]. Implementations receive a
//! fully assembled [`SignedRequest`], perform exactly one exchange honoring its timeout, and
//! return the raw [`TransportResponse`]. They never retry, follow redirects, or interpret status
//! codes; classification happens in the client.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::HeaderMap;
#[cfg(feature = "reqwest")] use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::TransportError, request::SignedRequest};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a [`SignedRequest`].
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many clones of a
/// client. Timeouts must surface as [`TransportError::Timeout`] so callers can tell them apart
/// from connection failures.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	fn send(&self, request: SignedRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: SignedRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}
}

/// Raw response as returned by the transport.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Undecoded response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Returns `true` for the success statuses (200 and 204).
	pub fn is_success(&self) -> bool {
		matches!(self.status, 200 | 204)
	}

	/// Decodes the JSON body into `T`.
	///
	/// Fails distinguishably from decoding an empty or `null` document: an empty body is an
	/// error, while a literal `null` decodes successfully when `T` permits it.
	pub fn decode<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let deserializer = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(deserializer)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client does not follow redirects: a redirected request would be re-sent to a
/// path its signature does not cover. Configure any custom [`ReqwestClient`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds the default transport with redirects disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: SignedRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let SignedRequest { method, url, headers, body, timeout } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn success_statuses_are_200_and_204() {
		assert!(TransportResponse::new(200, HeaderMap::new(), "{}").is_success());
		assert!(TransportResponse::new(204, HeaderMap::new(), "").is_success());
		assert!(!TransportResponse::new(201, HeaderMap::new(), "{}").is_success());
		assert!(!TransportResponse::new(400, HeaderMap::new(), "{}").is_success());
	}

	#[test]
	fn decode_distinguishes_failure_from_null() {
		let value: JsonValue = TransportResponse::new(200, HeaderMap::new(), "null")
			.decode()
			.expect("A literal null should decode.");

		assert!(value.is_null());
		assert!(TransportResponse::new(200, HeaderMap::new(), "").decode::<JsonValue>().is_err());
		assert!(
			TransportResponse::new(200, HeaderMap::new(), "<html>")
				.decode::<JsonValue>()
				.is_err()
		);
	}

	#[test]
	fn decode_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Resident {
			id: String,
			age: u32,
		}

		let err = TransportResponse::new(200, HeaderMap::new(), r#"{"id":"r1","age":"old"}"#)
			.decode::<Resident>()
			.expect_err("Mismatched field type should fail.");

		assert_eq!(err.path().to_string(), "age");
	}
}
