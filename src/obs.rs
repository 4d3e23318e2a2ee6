//! Optional observability helpers for API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `carehq.request` with the `method` and `path`
//!   fields.
//! - Enable `metrics` to increment the `carehq_request_total` counter for every
//!   attempt/success/failure, labeled by `method` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, error::Error};

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to [`ApiClient::request`](crate::ApiClient::request).
	Attempt,
	/// Success status with a decodable body.
	Success,
	/// The service rejected the request.
	ApiError,
	/// The service could not be reached.
	TransportError,
	/// Local failure: invalid input or an undecodable success body.
	LocalError,
}
impl RequestOutcome {
	/// Classifies a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(Error::Api(_)) => Self::ApiError,
			Err(Error::Transport(_)) => Self::TransportError,
			Err(Error::Config(_) | Error::Decode(_)) => Self::LocalError,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::ApiError => "api_error",
			RequestOutcome::TransportError => "transport_error",
			RequestOutcome::LocalError => "local_error",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
