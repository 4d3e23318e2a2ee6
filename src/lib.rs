//! Signed, rate-limit aware HTTP client for the CareHQ API.
//!
//! Every call is turned into a request carrying an HMAC-SHA-256 signature over the timestamp,
//! a fresh nonce, the method, the path and a canonical rendering of the signed parameters.
//! Responses update an advisory rate-limit snapshot and failures surface as a typed
//! [`error::ApiError`] keyed by HTTP status.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod obs;
pub mod params;
pub mod rate_limit;
pub mod request;
pub mod sign;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use client::ReqwestApiClient;
pub use client::{ApiClient, ApiResponse};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use params::{ParamValue, Params};
pub use rate_limit::RateLimitSnapshot;
pub use sign::SignatureVersion;

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
