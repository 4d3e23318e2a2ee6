//! Client-level error types: service rejections, local precondition failures, transport and
//! decode failures.
//!
//! The four top-level variants let callers tell apart "the service rejected the request"
//! ([`Error::Api`]) from "the service could not be reached" ([`Error::Transport`]) and from
//! problems detected before anything was sent ([`Error::Config`]).

mod api;

pub use api::*;

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The service answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Local precondition violation detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (timeout, DNS, TCP, TLS, malformed HTTP).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A successful response carried a body that could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}
impl Error {
	/// Returns the API error when the service rejected the request.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(err) => Some(err),
			_ => None,
		}
	}

	/// Returns the API error kind when the service rejected the request.
	pub fn api_kind(&self) -> Option<ApiErrorKind> {
		self.as_api().map(|err| err.kind)
	}
}

/// Configuration and validation failures raised before a request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL failed validation.
	#[error("Base URL `{url}` is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
		/// Why the URL was rejected.
		reason: &'static str,
	},
	/// Timeout is negative, zero, or not a finite number of seconds.
	#[error("Timeout of {secs} seconds is invalid.")]
	InvalidTimeout {
		/// Offending value in seconds.
		secs: f64,
	},
	/// Endpoint URL could not be built from the base URL and path.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint path would be rewritten by URL normalization.
	#[error("Endpoint path `{path}` is invalid: {reason}.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Why the path was rejected.
		reason: &'static str,
	},
	/// HTTP method is not a valid token.
	#[error("HTTP method is invalid.")]
	InvalidMethod(#[from] http::method::InvalidMethod),
	/// A header value contains characters HTTP does not allow.
	#[error("Value for header `{header}` contains invalid characters.")]
	InvalidHeaderValue {
		/// Header whose value was rejected.
		header: &'static str,
	},
	/// Parameters were supplied as a JSON value that is not an object.
	#[error("Parameters must be a JSON object, found {found}.")]
	ParamsNotAnObject {
		/// JSON kind that was supplied instead.
		found: &'static str,
	},
	/// A parameter value cannot be expressed as a string or list of strings.
	#[error("Parameter `{key}` has an unsupported {kind} value.")]
	UnsupportedParamValue {
		/// Parameter name.
		key: String,
		/// JSON kind that was rejected.
		kind: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete within the configured timeout.
	#[error("Request timed out while calling the API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Returns `true` when the failure was a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Failures decoding the body of a successful response.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The body is not valid JSON or does not match the requested type.
	#[error("API returned a {status} response whose body could not be decoded.")]
	ResponseBody {
		/// HTTP status of the response.
		status: u16,
		/// Structured parsing failure, including the path to the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn api_accessors_only_match_api_errors() {
		let err = Error::from(ApiError::new(404, None, None));

		assert_eq!(err.api_kind(), Some(ApiErrorKind::NotFound));

		let err = Error::from(ConfigError::InvalidHeaderValue { header: "X-CareHQ-APIKey" });

		assert!(err.as_api().is_none());
		assert_eq!(
			err.to_string(),
			"Value for header `X-CareHQ-APIKey` contains invalid characters."
		);
	}

	#[test]
	fn transport_error_reports_timeouts() {
		let err = TransportError::timeout(std::io::Error::other("deadline"));

		assert!(err.is_timeout());
		assert!(!TransportError::network(std::io::Error::other("reset")).is_timeout());
	}
}
