#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use admin_api_client::{
	_preludet::*,
	api::{self, CodeQuery, NewAccessCode},
};

fn authed_client(server: &MockServer) -> ReqwestTestClient {
	let (client, store) = build_reqwest_test_client(&server.base_url());

	store.insert("accessToken", "tok1");

	client
}

#[tokio::test]
async fn dashboard_stats_decode_and_default() {
	let server = MockServer::start_async().await;
	let client = authed_client(&server);
	let stats = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/stats").header("authorization", "Bearer tok1");
			then.status(200).header("content-type", "application/json").body(
				r#"{
					"success": true,
					"data": {
						"stats": { "totalUsers": 120, "activeSessions": 8, "totalCodes": 300, "revenue": 1520.5 },
						"liveSessions": [{ "_id": "s1", "role": "user", "lastActive": "2025-01-01T10:00:00Z" }],
						"analytics": { "codesChart": [{ "date": "2025-01-01", "value": 4 }] }
					}
				}"#,
			);
		})
		.await;
	let data = client.dashboard_stats().await.expect("Dashboard stats should decode.");

	stats.assert_async().await;

	assert_eq!(data.stats.total_users, 120);
	assert_eq!(data.stats.revenue, 1520.5);
	assert_eq!(data.live_sessions.len(), 1);
	assert!(data.recent_activity.is_empty());
	assert_eq!(data.analytics.codes_chart[0].value, 4.0);
}

#[tokio::test]
async fn codes_list_create_reveal_delete() {
	let server = MockServer::start_async().await;
	let client = authed_client(&server);
	let list = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/admin/codes")
				.query_param("page", "2")
				.query_param("limit", "25")
				.query_param("search", "vip");
			then.status(200).header("content-type", "application/json").body(
				r#"{"success":true,"data":[{"_id":"c1","durationDays":30,"maxDevices":2,"usedCount":1,"status":"active"}]}"#,
			);
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/codes").body(r#"{"durationDays":7,"maxDevices":3}"#);
			then.status(201).header("content-type", "application/json").body(
				r#"{"success":true,"data":{"_id":"c2","code":"ABCD-1234","durationDays":7,"maxDevices":3,"status":"unused"}}"#,
			);
		})
		.await;
	let reveal = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/codes/c1/reveal").body(r#"{"password":"master"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"success":true,"data":{"code":"WXYZ-9876"}}"#);
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/admin/codes/c1");
			then.status(200).body(r#"{"success":true}"#);
		})
		.await;
	let codes = client
		.list_codes(&CodeQuery::default().page(2, 25).search("vip"))
		.await
		.expect("Code listing should succeed.");

	list.assert_async().await;

	assert_eq!(codes.len(), 1);
	assert!(codes[0].is_available());

	let created = client
		.create_code(NewAccessCode { duration_days: 7, max_devices: 3 })
		.await
		.expect("Code creation should succeed.");

	create.assert_async().await;

	assert_eq!(created.code.as_deref(), Some("ABCD-1234"));
	assert_eq!(created.used_count, 0);

	let secret = client.reveal_code("c1", Some("master")).await.expect("Reveal should succeed.");

	reveal.assert_async().await;

	assert_eq!(secret, "WXYZ-9876");

	client.delete_code("c1").await.expect("Delete should succeed.");
	delete.assert_async().await;
}

#[tokio::test]
async fn invalid_code_input_never_reaches_backend() {
	let server = MockServer::start_async().await;
	let client = authed_client(&server);
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/codes");
			then.status(200).body(r#"{"success":true}"#);
		})
		.await;
	let err = client
		.create_code(NewAccessCode { duration_days: 0, max_devices: 1 })
		.await
		.expect_err("Zero-day codes should be rejected locally.");

	assert!(matches!(err, Error::Validation { field: "durationDays", .. }));
	assert!(client.delete_code("../stats").await.is_err());
	assert!(client.reveal_code("", None).await.is_err());

	create.assert_calls_async(0).await;
}

#[tokio::test]
async fn live_sessions_search_and_sort() {
	let server = MockServer::start_async().await;
	let client = authed_client(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/sessions/live");
			then.status(200).header("content-type", "application/json").body(
				r#"{"success":true,"data":{"sessions":[
					{"_id":"s1","deviceId":"TV-1","ipAddress":"10.0.0.1","role":"user","lastActive":"2025-01-01T08:00:00Z"},
					{"_id":"s2","deviceId":"tv-2","ipAddress":"10.0.0.2","role":"user","lastActive":"2025-01-01T09:00:00Z","userId":{"_id":"u1","username":"alice"}},
					{"_id":"s3","deviceId":"phone","ipAddress":"10.0.0.3","role":"ADMIN"}
				]}}"#,
			);
		})
		.await;

	let sessions = client.live_sessions().await.expect("Live sessions should decode.");
	let hits = api::search_sessions(&sessions, "tv");

	assert_eq!(sessions.len(), 3);
	assert_eq!(hits.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), ["s2", "s1"]);
	assert_eq!(api::search_sessions(&sessions, "ALICE").len(), 1);
}

#[tokio::test]
async fn channels_by_category() {
	let server = MockServer::start_async().await;
	let client = authed_client(&server);
	let all = server
		.mock_async(|when, then| {
			when.method(GET).path("/stream/channels").query_param("category", "");
			then.status(200).header("content-type", "application/json").body(
				r#"{"success":true,"data":[
					{"_id":"1","name":"News 24","category":"News","isActive":true},
					{"_id":"2","name":"Goal","category":"Sports","isActive":false,"logoUrl":"https://cdn.example.com/goal.png"},
					{"_id":"3","name":"World","category":"News","isActive":true}
				]}"#,
			);
		})
		.await;
	let sports = server
		.mock_async(|when, then| {
			when.method(GET).path("/stream/channels").query_param("category", "Sports");
			then.status(200).header("content-type", "application/json").body(r#"{"success":true}"#);
		})
		.await;
	let channels = client.list_channels(Some("All")).await.expect("Channel listing should succeed.");

	client.list_channels(None).await.expect("Uncategorized listing should succeed.");
	all.assert_calls_async(2).await;

	assert_eq!(api::channel_categories(&channels), ["All", "News", "Sports"]);
	assert_eq!(api::filter_channels(&channels, "goal").len(), 1);

	let empty = client.list_channels(Some("Sports")).await.expect("Empty listing should succeed.");

	sports.assert_async().await;

	assert!(empty.is_empty());
}
