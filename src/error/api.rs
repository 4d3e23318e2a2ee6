//! Typed API errors and the status-to-kind dispatch table.

// self
use crate::{_prelude::*, rate_limit::RateLimitSnapshot};

/// Per-argument validation messages keyed by argument name.
pub type ArgErrors = BTreeMap<String, Vec<String>>;

/// Closed set of API error kinds selected by HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
	/// 400: missing or invalid parameter.
	InvalidRequest,
	/// 401: invalid credentials.
	Unauthorized,
	/// 403 and 405: method or permission denied.
	Forbidden,
	/// 404: endpoint or resource absent.
	NotFound,
	/// 429: request budget exhausted.
	RateLimitExceeded,
	/// Any other non-success status.
	Other,
}
impl ApiErrorKind {
	/// Maps an HTTP status code to its error kind.
	pub const fn from_status(status: u16) -> Self {
		match status {
			400 => Self::InvalidRequest,
			401 => Self::Unauthorized,
			403 | 405 => Self::Forbidden,
			404 => Self::NotFound,
			429 => Self::RateLimitExceeded,
			_ => Self::Other,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidRequest => "invalid_request",
			Self::Unauthorized => "unauthorized",
			Self::Forbidden => "forbidden",
			Self::NotFound => "not_found",
			Self::RateLimitExceeded => "rate_limit_exceeded",
			Self::Other => "api_error",
		}
	}

	/// Human-readable explanation of the kind.
	pub const fn description(self) -> &'static str {
		match self {
			Self::InvalidRequest =>
				"Not a valid request, most likely a missing or invalid parameter.",
			Self::Unauthorized => "The API credentials provided are not valid.",
			Self::Forbidden =>
				"The request is not allowed, most likely the HTTP method used to call the API \
				 endpoint is incorrect or the API key (via its associated account) does not have \
				 permission to call the endpoint and/or perform the action.",
			Self::NotFound =>
				"The endpoint you are calling or the document you referenced doesn't exist.",
			Self::RateLimitExceeded =>
				"You have exceeded the number of API requests allowed per second.",
			Self::Other => "An error occurred while processing an API request.",
		}
	}
}
impl Display for ApiErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Structured error fields extracted from a failed response body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorPayload {
	/// Additional information as to why the error occurred.
	pub hint: Option<String>,
	/// Errors relating to the arguments sent to the endpoint.
	pub arg_errors: Option<ArgErrors>,
}
impl ErrorPayload {
	/// Decodes a response body, falling back to an empty payload when the body is not JSON.
	pub fn decode(body: &[u8]) -> Self {
		serde_json::from_slice::<JsonValue>(body)
			.map(|value| Self::from_json(&value))
			.unwrap_or_default()
	}

	/// Extracts `hint` and `arg_errors` from a decoded body, ignoring fields of the wrong shape.
	pub fn from_json(value: &JsonValue) -> Self {
		let hint = value.get("hint").and_then(JsonValue::as_str).map(ToOwned::to_owned);
		let arg_errors = value.get("arg_errors").and_then(JsonValue::as_object).map(|object| {
			object
				.iter()
				.filter_map(|(arg, messages)| {
					let messages = match messages {
						JsonValue::String(message) => vec![message.clone()],
						JsonValue::Array(items) => items
							.iter()
							.filter_map(JsonValue::as_str)
							.map(ToOwned::to_owned)
							.collect(),
						_ => return None,
					};

					Some((arg.clone(), messages))
				})
				.collect::<ArgErrors>()
		});

		Self { hint, arg_errors }
	}
}

/// Error raised when the API responds with a status outside the success set.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
	/// Kind selected from the status code.
	pub kind: ApiErrorKind,
	/// HTTP status code of the response.
	pub status: u16,
	/// Optional hint supplied by the service.
	pub hint: Option<String>,
	/// Optional per-argument validation errors.
	pub arg_errors: Option<ArgErrors>,
	/// Rate-limit state reported on the failing response, if any.
	pub rate_limit: Option<RateLimitSnapshot>,
}
impl ApiError {
	/// Builds an error for `status`, selecting the kind from the dispatch table.
	pub fn new(status: u16, hint: Option<String>, arg_errors: Option<ArgErrors>) -> Self {
		Self { kind: ApiErrorKind::from_status(status), status, hint, arg_errors, rate_limit: None }
	}

	/// Attaches the rate-limit snapshot observed on the failing response.
	pub fn with_rate_limit(mut self, snapshot: Option<RateLimitSnapshot>) -> Self {
		self.rate_limit = snapshot;

		self
	}

	/// Returns `true` for [`ApiErrorKind::RateLimitExceeded`].
	pub fn is_rate_limited(&self) -> bool {
		matches!(self.kind, ApiErrorKind::RateLimitExceeded)
	}

	/// Messages recorded for a single argument.
	pub fn arg_error(&self, arg: &str) -> Option<&[String]> {
		self.arg_errors.as_ref()?.get(arg).map(Vec::as_slice)
	}
}
impl Display for ApiError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "[{}] {}", self.status, self.kind.description())?;

		if let Some(hint) = self.hint.as_deref().filter(|hint| !hint.is_empty()) {
			write!(f, "\n---\nHint: {hint}")?;
		}
		if let Some(arg_errors) = self.arg_errors.as_ref().filter(|errors| !errors.is_empty()) {
			f.write_str("\n---\nArgument errors:")?;

			for (arg, messages) in arg_errors {
				write!(f, "\n- {arg}: {}", messages.join(" "))?;
			}
		}

		Ok(())
	}
}
impl StdError for ApiError {}

/// Builds the typed error for a failed response.
///
/// A body that cannot be decoded yields an error with neither hint nor argument errors.
pub fn dispatch(status: u16, body: &[u8]) -> ApiError {
	let ErrorPayload { hint, arg_errors } = ErrorPayload::decode(body);

	ApiError::new(status, hint, arg_errors)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_table_selects_kinds() {
		let table = [
			(400, ApiErrorKind::InvalidRequest),
			(401, ApiErrorKind::Unauthorized),
			(403, ApiErrorKind::Forbidden),
			(404, ApiErrorKind::NotFound),
			(405, ApiErrorKind::Forbidden),
			(429, ApiErrorKind::RateLimitExceeded),
			(499, ApiErrorKind::Other),
			(500, ApiErrorKind::Other),
		];

		for (status, kind) in table {
			let err = dispatch(status, b"{}");

			assert_eq!(err.kind, kind, "Status {status} mapped to the wrong kind.");
			assert_eq!(err.status, status);
		}
	}

	#[test]
	fn malformed_body_yields_empty_payload() {
		let err = dispatch(400, b"<html>bad gateway</html>");

		assert_eq!(err.kind, ApiErrorKind::InvalidRequest);
		assert_eq!(err.hint, None);
		assert_eq!(err.arg_errors, None);

		let err = dispatch(400, b"");

		assert_eq!(err.hint, None);
		assert_eq!(err.arg_errors, None);
	}

	#[test]
	fn payload_extracts_hint_and_arg_errors() {
		let body = serde_json::json!({
			"hint": "Check the filters.",
			"arg_errors": { "status": ["Not a valid choice."], "page": "Must be positive." },
		})
		.to_string();
		let err = dispatch(400, body.as_bytes());

		assert_eq!(err.hint.as_deref(), Some("Check the filters."));
		assert_eq!(err.arg_error("status"), Some(["Not a valid choice.".to_owned()].as_slice()));
		assert_eq!(err.arg_error("page"), Some(["Must be positive.".to_owned()].as_slice()));
	}

	#[test]
	fn payload_ignores_fields_of_the_wrong_shape() {
		let payload = ErrorPayload::decode(br#"{"hint":42,"arg_errors":["nope"]}"#);

		assert_eq!(payload, ErrorPayload::default());
	}

	#[test]
	fn display_renders_sections_in_order() {
		let mut arg_errors = ArgErrors::new();

		arg_errors.insert("name".into(), vec!["Required.".into(), "Too short.".into()]);
		arg_errors.insert("age".into(), vec!["Must be a number.".into()]);

		let err = ApiError::new(400, Some("Fix the form.".into()), Some(arg_errors));

		assert_eq!(
			err.to_string(),
			"[400] Not a valid request, most likely a missing or invalid parameter.\n---\n\
			 Hint: Fix the form.\n---\n\
			 Argument errors:\n- age: Must be a number.\n- name: Required. Too short."
		);
		assert_eq!(
			ApiError::new(418, None, None).to_string(),
			"[418] An error occurred while processing an API request."
		);
	}
}
