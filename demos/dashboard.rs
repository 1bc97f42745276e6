//! Logs in against a mock backend, lets the access token expire, and fetches dashboard stats
//! through the transparent refresh.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use admin_api_client::{
	client::ApiClient,
	config::ClientConfig,
	session::LoginRequest,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/login");
			then.status(200).header("content-type", "application/json").body(
				r#"{"success":true,"accessToken":"demo-1","data":{"user":{"_id":"a1","username":"root","role":"MASTER_ADMIN"}}}"#,
			);
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats").header("authorization", "Bearer demo-1");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"jwt expired"}"#);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"success":true,"accessToken":"demo-2"}"#);
		})
		.await;
	let stats_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats").header("authorization", "Bearer demo-2");
			then.status(200).header("content-type", "application/json").body(
				r#"{"success":true,"data":{"stats":{"totalUsers":120,"activeSessions":8,"totalCodes":300,"revenue":1520.5}}}"#,
			);
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.base_url())?).build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let client = ApiClient::new(config, store)?;
	let user = client.login(LoginRequest::new("root", "s3cret")).await?;

	println!(
		"Logged in as {} ({}).",
		user.username.as_deref().unwrap_or("unknown"),
		user.role.as_ref().map(ToString::to_string).unwrap_or_default(),
	);

	let data = client.dashboard_stats().await?;

	println!(
		"Users: {}, active sessions: {}, refreshes: {}.",
		data.stats.total_users,
		data.stats.active_sessions,
		client.refresh_metrics().attempts(),
	);

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	stats_mock.assert_async().await;

	Ok(())
}
