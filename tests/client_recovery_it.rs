#![cfg(all(feature = "reqwest", feature = "test"))]

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::prelude::*;
// self
use admin_api_client::{
	_preludet::*,
	client::SessionListener,
	error::SessionExpired,
	http::ApiRequest,
	store::MemoryStore,
};

const STATS_OK: &str = r#"{"success":true,"data":{"stats":{"totalUsers":7}}}"#;
const EXPIRED: &str = r#"{"success":false,"message":"jwt expired"}"#;

#[derive(Default)]
struct CountingListener {
	calls: AtomicUsize,
	last: Mutex<Option<SessionExpired>>,
}
impl SessionListener for CountingListener {
	fn on_session_expired(&self, failure: &SessionExpired) {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last.lock() = Some(failure.clone());
	}
}

fn seed_session(store: &MemoryStore, token: &str) {
	store.insert("accessToken", token);
	store.insert("user", r#"{"_id":"a1","username":"root","role":"ADMIN"}"#);
}

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats").header("authorization", "Bearer tok1");
			then.status(401).header("content-type", "application/json").body(EXPIRED);
		})
		.await;
	let refreshed = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats").header("authorization", "Bearer tok2");
			then.status(200).header("content-type", "application/json").body(STATS_OK);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"success":true,"accessToken":"tok2"}"#);
		})
		.await;
	let (first, second) = tokio::join!(client.dashboard_stats(), client.dashboard_stats());

	assert_eq!(first.expect("First caller should recover after refresh.").stats.total_users, 7);
	assert_eq!(second.expect("Second caller should recover after refresh.").stats.total_users, 7);

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;
	refreshed.assert_calls_async(2).await;

	assert_eq!(store.get("accessToken").as_deref(), Some("tok2"));
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().successes(), 1);
	assert!(!client.is_refreshing());

	// The persisted credential is used directly afterwards.
	client.dashboard_stats().await.expect("Follow-up call should use the new credential.");

	refresh.assert_calls_async(1).await;
	refreshed.assert_calls_async(3).await;
}

#[tokio::test]
async fn failed_refresh_rejects_every_caller_and_purges_session() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let listener = Arc::new(CountingListener::default());
	let client = client.with_session_listener(listener.clone());

	seed_session(&store, "tok1");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/sessions/live");
			then.status(401).header("content-type", "application/json").body(EXPIRED);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"Refresh token missing"}"#);
		})
		.await;
	let (first, second) = tokio::join!(client.live_sessions(), client.live_sessions());
	let first = first.expect_err("First caller should fail once the refresh fails.");
	let second = second.expect_err("Second caller should fail once the refresh fails.");

	refresh.assert_calls_async(1).await;

	for err in [&first, &second] {
		let Error::SessionExpired(failure) = err else {
			panic!("Expected a session-expired error, got {err:?}.");
		};

		assert_eq!(failure.reason, "Refresh token missing");
		assert_eq!(failure.status, Some(401));
	}

	assert!(store.get("accessToken").is_none());
	assert!(store.get("user").is_none());
	assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
	assert_eq!(
		listener.last.lock().as_ref().map(|failure| failure.reason.as_str()),
		Some("Refresh token missing")
	);
	assert_eq!(client.refresh_metrics().failures(), 1);
}

#[tokio::test]
async fn refresh_without_token_counts_as_failure() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats");
			then.status(401).body(EXPIRED);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).header("content-type", "application/json").body(r#"{"success":true}"#);
		})
		.await;

	let err = client.dashboard_stats().await.expect_err("Refresh without a token should fail.");

	assert!(err.is_session_expired());
	assert!(store.get("accessToken").is_none());
}

#[tokio::test]
async fn retried_request_is_not_recovered_again() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/codes");
			then.status(401).header("content-type", "application/json").body(EXPIRED);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(r#"{"accessToken":"tok2"}"#);
		})
		.await;
	let err = client
		.send(ApiRequest::get("/admin/codes").mark_retried())
		.await
		.expect_err("A retried request should surface its 401.");

	refresh.assert_calls_async(0).await;

	assert_eq!(err.status(), Some(401));
	assert_eq!(err.backend_message(), Some("jwt expired"));
	assert_eq!(store.get("accessToken").as_deref(), Some("tok1"));
}

#[tokio::test]
async fn replayed_request_failing_again_surfaces_its_own_error() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	let stats = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats");
			then.status(401).header("content-type", "application/json").body(EXPIRED);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(r#"{"accessToken":"tok2"}"#);
		})
		.await;
	let err = client.dashboard_stats().await.expect_err("Replay should fail with the backend 401.");

	refresh.assert_calls_async(1).await;
	stats.assert_calls_async(2).await;

	assert_eq!(err.status(), Some(401));
	assert_eq!(store.get("accessToken").as_deref(), Some("tok2"));
}

#[tokio::test]
async fn wrong_master_password_does_not_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	let verify = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/admin/verify-master-password")
				.header("authorization", "Bearer tok1")
				.body(r#"{"password":"nope"}"#);
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"Incorrect password"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(r#"{"accessToken":"tok2"}"#);
		})
		.await;
	let err = client
		.verify_master_password("nope")
		.await
		.expect_err("A wrong master password should be reported.");

	verify.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(err.status(), Some(401));
	assert_eq!(err.backend_message(), Some("Incorrect password"));
	assert_eq!(store.get("accessToken").as_deref(), Some("tok1"));
	assert!(store.get("user").is_some());
}

#[tokio::test]
async fn expired_session_on_verification_endpoint_still_refreshes() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/admin/verify-master-password")
				.header("authorization", "Bearer tok1");
			then.status(401).header("content-type", "application/json").body(EXPIRED);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/admin/verify-master-password")
				.header("authorization", "Bearer tok2");
			then.status(200).body(r#"{"success":true}"#);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(r#"{"accessToken":"tok2"}"#);
		})
		.await;

	client.verify_master_password("right").await.expect("Verification should succeed after refresh.");
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_unauthorized_failures_pass_through() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_session(&store, "tok1");

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/admin/codes/c1");
			then.status(403)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"Master admin only"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats");
			then.status(503).header("retry-after", "12").body("upstream down");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(r#"{"accessToken":"tok2"}"#);
		})
		.await;
	let forbidden = client.delete_code("c1").await.expect_err("403 should pass through.");

	assert_eq!(forbidden.status(), Some(403));
	assert_eq!(forbidden.backend_message(), Some("Master admin only"));

	let unavailable = client.dashboard_stats().await.expect_err("503 should pass through.");
	let Error::Api { status, payload, retry_after } = unavailable else {
		panic!("Expected an API error, got {unavailable:?}.");
	};

	assert_eq!(status, 503);
	assert_eq!(payload.raw.as_deref(), Some("upstream down"));
	assert_eq!(retry_after, Some(Duration::seconds(12)));

	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn transport_failures_pass_through() {
	let (client, store) = build_reqwest_test_client("http://127.0.0.1:9");

	seed_session(&store, "tok1");

	let err = client.dashboard_stats().await.expect_err("Unreachable backend should fail.");

	assert!(matches!(err, Error::Transport(_)), "Unexpected error: {err:?}.");
	assert_eq!(client.refresh_metrics().attempts(), 0);
}
