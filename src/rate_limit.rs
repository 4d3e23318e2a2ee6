//! Advisory rate-limit state reported by the service on every response.
//!
//! The tracker never throttles or delays calls; it only remembers what the service last said so
//! callers can decide when to back off.

// crates.io
use http::HeaderMap;
// self
use crate::_prelude::*;

/// Header carrying the number of requests allowed per window.
pub const LIMIT_HEADER: &str = "X-CareHQ-RateLimit-Limit";
/// Header carrying the reset instant in (fractional) seconds since the epoch.
pub const RESET_HEADER: &str = "X-CareHQ-RateLimit-Reset";
/// Header carrying the number of requests left before the reset.
pub const REMAINING_HEADER: &str = "X-CareHQ-RateLimit-Remaining";

/// Last rate-limit figures reported by the service.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
	/// Maximum number of requests per second allowed for the API key.
	pub limit: u32,
	/// Seconds since the epoch at which the current window resets.
	pub reset: f64,
	/// Requests remaining in the current window.
	pub remaining: u32,
}
impl RateLimitSnapshot {
	/// Parses the three rate-limit headers.
	///
	/// Returns `None` when the limit header is absent, or when any of the three is missing or
	/// malformed.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let limit = header_str(headers, LIMIT_HEADER)?;

		Some(Self {
			limit: limit.parse().ok()?,
			reset: header_str(headers, RESET_HEADER)?
				.parse()
				.ok()
				.filter(|reset: &f64| reset.is_finite())?,
			remaining: header_str(headers, REMAINING_HEADER)?.parse().ok()?,
		})
	}

	/// Reset instant as a UTC timestamp.
	pub fn reset_at(&self) -> Option<OffsetDateTime> {
		let nanos = (self.reset * 1_000_000_000.0).round();

		if !nanos.is_finite() {
			return None;
		}

		OffsetDateTime::from_unix_timestamp_nanos(nanos as i128).ok()
	}

	/// Returns `true` when no requests remain in the current window.
	pub fn is_exhausted(&self) -> bool {
		self.remaining == 0
	}
}

/// Shared, lock-guarded holder of the latest [`RateLimitSnapshot`].
///
/// Clones share state, so every clone of a client observes the same snapshot. Reads are
/// eventually consistent with respect to concurrent requests.
#[derive(Clone, Debug, Default)]
pub struct RateLimitTracker(Arc<Mutex<Option<RateLimitSnapshot>>>);
impl RateLimitTracker {
	/// Records the rate-limit headers of a response.
	///
	/// Responses without the headers leave the previous snapshot untouched. Returns the snapshot
	/// parsed from this response, if any.
	pub fn update(&self, headers: &HeaderMap) -> Option<RateLimitSnapshot> {
		if !headers.contains_key(LIMIT_HEADER) {
			return None;
		}

		let Some(snapshot) = RateLimitSnapshot::from_headers(headers) else {
			#[cfg(feature = "tracing")]
			tracing::debug!("ignoring malformed rate-limit headers");

			return None;
		};

		*self.0.lock() = Some(snapshot);

		#[cfg(feature = "tracing")]
		tracing::debug!(
			limit = snapshot.limit,
			remaining = snapshot.remaining,
			reset = snapshot.reset,
			"rate-limit snapshot updated"
		);

		Some(snapshot)
	}

	/// Latest snapshot, or `None` before the first response carrying rate-limit headers.
	pub fn snapshot(&self) -> Option<RateLimitSnapshot> {
		*self.0.lock()
	}
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)?.to_str().ok().map(str::trim)
}
