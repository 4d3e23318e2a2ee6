//! Demonstrates a signed `GET` against a local mock of the API using the default reqwest
//! transport, then reads the rate-limit snapshot and handles a typed API error.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use carehq_client::{ApiClient, ApiErrorKind, ClientConfig, Params, auth::Credentials};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/residents")
				.query_param("status", "active")
				.header("x-carehq-signature-version", "2.0")
				.header_exists("x-carehq-signature");
			then.status(200)
				.header("content-type", "application/json")
				.header("X-CareHQ-RateLimit-Limit", "10")
				.header("X-CareHQ-RateLimit-Reset", "1700000000")
				.header("X-CareHQ-RateLimit-Remaining", "9")
				.body(r#"{"items":[{"_id":"r1","first_name":"Ada"}],"total_count":1}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/residents/missing");
			then.status(404)
				.header("content-type", "application/json")
				.body(r#"{"hint":"No resident with that id."}"#);
		})
		.await;

	let config = ClientConfig::builder()
		.base_url(server.base_url())
		.timeout(Duration::from_secs(5))
		.build()?;
	let client =
		ApiClient::new(Credentials::new("demo-account", "demo-key", "demo-secret"), config)?;
	let params = Params::new().with("status", vec!["active"]).with("page", 1);
	let residents = client.get("residents", Some(&params)).await?;

	println!("Residents: {}", residents.body);

	if let Some(snapshot) = client.rate_limit() {
		println!(
			"Rate limit: {}/{} remaining, resets at {:?}.",
			snapshot.remaining,
			snapshot.limit,
			snapshot.reset_at()
		);
	}

	list_mock.assert_async().await;

	match client.get("residents/missing", None).await {
		Err(err) if err.api_kind() == Some(ApiErrorKind::NotFound) => println!("{err}"),
		other => println!("Unexpected result: {other:?}"),
	}

	Ok(())
}
