//! Live device sessions (`GET /admin/sessions/live`) and the list helpers the sessions page uses.

// self
use crate::{
	_prelude::*,
	api::codes::tail,
	client::ApiClient,
	http::{ApiRequest, ApiTransport, Envelope},
};

const LIVE_SESSIONS_PATH: &str = "/admin/sessions/live";
const RECENT_WINDOW: Duration = Duration::minutes(5);

/// A device session reported by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
	/// Backend identifier.
	#[serde(default, rename = "_id")]
	pub id: String,
	/// Device identifier.
	#[serde(default)]
	pub device_id: Option<String>,
	/// IP address seen by the backend.
	#[serde(default)]
	pub ip_address: Option<String>,
	/// Public IP reported by the client itself.
	#[serde(default)]
	pub client_public_ip: Option<String>,
	/// Confidence of the IP detection (`HIGH`, `LOW`, ...).
	#[serde(default)]
	pub ip_confidence: Option<String>,
	/// Raw user agent.
	#[serde(default)]
	pub user_agent: Option<String>,
	/// Role of the session owner.
	#[serde(default)]
	pub role: Option<String>,
	/// Last activity.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub last_active: Option<OffsetDateTime>,
	/// Session owner.
	#[serde(default)]
	pub user_id: Option<SessionOwner>,
}
impl LiveSession {
	/// Client-reported public IP, falling back to the backend-observed address.
	pub fn display_ip(&self) -> Option<&str> {
		self.client_public_ip.as_deref().or(self.ip_address.as_deref())
	}

	/// True when the session was active within the last five minutes of `now`.
	pub fn is_recent(&self, now: OffsetDateTime) -> bool {
		self.last_active.is_some_and(|last| now - last < RECENT_WINDOW)
	}

	/// Coarse device class derived from the user agent.
	pub fn device_kind(&self) -> DeviceKind {
		match self.user_agent.as_deref().map(str::to_lowercase) {
			None => DeviceKind::Unknown,
			Some(ua) if ua.contains("mobile") || ua.contains("android") => DeviceKind::Mobile,
			Some(_) => DeviceKind::Desktop,
		}
	}

	/// True when the session owner holds an admin role.
	pub fn is_admin(&self) -> bool {
		self.role.as_deref().is_some_and(|role| role.contains("ADMIN"))
	}

	/// Owner username, or the tail of the owner id for code-based users.
	pub fn owner_label(&self) -> String {
		let owner = self.user_id.as_ref();

		match owner.and_then(|o| o.username.as_deref()) {
			Some(username) => username.to_owned(),
			None => match owner.and_then(|o| o.id.as_deref()) {
				Some(id) => format!("Code: ...{}", tail(id, 6)),
				None => "Unknown".into(),
			},
		}
	}

	fn matches(&self, needle: &str) -> bool {
		let owner = self.user_id.as_ref();

		[
			self.device_id.as_deref(),
			self.ip_address.as_deref(),
			owner.and_then(|o| o.id.as_deref()),
			owner.and_then(|o| o.username.as_deref()),
		]
		.into_iter()
		.flatten()
		.any(|field| field.to_lowercase().contains(needle))
	}
}

/// Populated owner reference of a [`LiveSession`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOwner {
	/// Owner identifier.
	#[serde(default, rename = "_id")]
	pub id: Option<String>,
	/// Owner username; absent for code-based users.
	#[serde(default)]
	pub username: Option<String>,
}

/// Device class shown next to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
	/// No user agent was reported.
	Unknown,
	/// Phone or tablet.
	Mobile,
	/// Anything else.
	Desktop,
}

#[derive(Deserialize)]
struct LiveSessionsData {
	#[serde(default)]
	sessions: Vec<LiveSession>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Fetches live sessions; a missing `data.sessions` yields an empty list.
	pub async fn live_sessions(&self) -> Result<Vec<LiveSession>> {
		let response = self.send(ApiRequest::get(LIVE_SESSIONS_PATH)).await?;
		let data = response.json::<Envelope<LiveSessionsData>>()?.data;

		Ok(data.map(|data| data.sessions).unwrap_or_default())
	}
}

/// Filters sessions by a case-insensitive search over device id, IP, owner id, and username,
/// then orders them by last activity, newest first. Sessions without activity sort last.
pub fn search_sessions<'a>(sessions: &'a [LiveSession], search: &str) -> Vec<&'a LiveSession> {
	let needle = search.to_lowercase();
	let mut hits = sessions
		.iter()
		.filter(|session| needle.is_empty() || session.matches(&needle))
		.collect::<Vec<_>>();

	hits.sort_by(|a, b| b.last_active.cmp(&a.last_active));

	hits
}
