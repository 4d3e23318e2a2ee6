//! Demonstrates plugging a custom [`HttpTransport`] into [`ApiClient`].
//!
//! The transport here answers locally without any network I/O, which is also how the client can
//! be exercised in tests. A real implementation would forward [`SignedRequest`] to its HTTP stack,
//! apply `request.timeout`, and report timeouts as [`TransportError::Timeout`].

// crates.io
use color_eyre::Result;
// self
use carehq_client::{
	ApiClient, ClientConfig, Params,
	auth::Credentials,
	error::TransportError,
	http::HeaderMap,
	request::SignedRequest,
	transport::{HttpTransport, TransportFuture, TransportResponse},
};

/// Echoes the signed headers back as the JSON body.
struct EchoTransport;
impl HttpTransport for EchoTransport {
	fn send(&self, request: SignedRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			if request.url.path().ends_with("/unreachable") {
				return Err(TransportError::network(std::io::Error::other("connection refused")));
			}

			let headers = request
				.headers
				.iter()
				.filter(|(name, _)| name.as_str().starts_with("x-carehq-"))
				.map(|(name, value)| {
					let value = if value.is_sensitive() {
						"<redacted>"
					} else {
						value.to_str().unwrap_or_default()
					};

					(name.as_str().to_owned(), serde_json::Value::from(value))
				})
				.collect::<serde_json::Map<_, _>>();
			let body = serde_json::json!({
				"method": request.method.as_str(),
				"url": request.url.as_str(),
				"headers": headers,
				"body": request.body,
			});

			Ok(TransportResponse::new(200, HeaderMap::new(), body.to_string()))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client = ApiClient::with_transport(
		Credentials::new("demo-account", "demo-key", "demo-secret"),
		ClientConfig::default(),
		EchoTransport,
	);
	let data = Params::new().with("first_name", "Ada").with("active", true);
	let echoed = client.post("residents", Some(&data)).await?;

	println!("{:#}", echoed.body);

	if let Err(err) = client.get("unreachable", None).await {
		println!("Transport failure: {err}");
	}

	Ok(())
}
