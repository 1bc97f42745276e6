//! Dashboard overview (`GET /admin/stats`).

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{ApiRequest, ApiTransport, Envelope},
};

const STATS_PATH: &str = "/admin/stats";

/// Everything the dashboard overview renders.
///
/// Every section defaults to empty so a partial backend answer still renders.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardData {
	/// Headline counters.
	pub stats: DashboardStats,
	/// Recent activity timeline.
	pub recent_activity: Vec<ActivityItem>,
	/// Most recently active sessions.
	pub live_sessions: Vec<super::LiveSession>,
	/// Chart series.
	pub analytics: Analytics,
}

/// Headline counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardStats {
	/// Registered users.
	pub total_users: u64,
	/// Currently active sessions.
	pub active_sessions: u64,
	/// Issued access codes.
	pub total_codes: u64,
	/// Revenue in the backend's currency.
	pub revenue: f64,
	/// Percentage change per counter.
	pub trends: Trends,
}

/// Percentage change per headline counter; absent when the backend has no baseline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trends {
	/// Users trend.
	pub users: Option<f64>,
	/// Sessions trend.
	pub sessions: Option<f64>,
	/// Codes trend.
	pub codes: Option<f64>,
	/// Revenue trend.
	pub revenue: Option<f64>,
}

/// One entry of the activity timeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityItem {
	/// Subject identifier (usually an access code id).
	pub id: Option<String>,
	/// Headline.
	pub title: Option<String>,
	/// Display time as sent by the backend.
	pub time: Option<String>,
	/// `success`, `warning`, or anything else for neutral.
	pub status: Option<String>,
	/// Entry type.
	#[serde(rename = "type")]
	pub kind: Option<String>,
	/// Extra details.
	pub details: Option<String>,
}

/// Chart series shown on the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Analytics {
	/// Sessions over time.
	pub sessions_chart: Vec<TimePoint>,
	/// Users per role.
	pub role_distribution: Vec<NamedValue>,
	/// Codes generated per day.
	pub codes_chart: Vec<DatePoint>,
}

/// `{ time, value }` chart point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimePoint {
	/// X-axis label.
	pub time: String,
	/// Y value.
	pub value: f64,
}

/// `{ name, value }` slice of a distribution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedValue {
	/// Slice label.
	pub name: String,
	/// Slice value.
	pub value: f64,
}

/// `{ date, value }` chart point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatePoint {
	/// X-axis label.
	pub date: String,
	/// Y value.
	pub value: f64,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Fetches the dashboard overview; a missing `data` field yields empty defaults.
	pub async fn dashboard_stats(&self) -> Result<DashboardData> {
		let response = self.send(ApiRequest::get(STATS_PATH)).await?;

		Ok(response.json::<Envelope<DashboardData>>()?.data.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn partial_payload_fills_defaults() {
		let data: DashboardData = serde_json::from_str(
			r#"{
				"stats": { "totalUsers": 42, "revenue": 99.5, "trends": { "users": 12.5 } },
				"analytics": { "roleDistribution": [{ "name": "ADMIN", "value": 2 }] },
				"recentActivity": [{ "id": "c1", "title": "Code created", "type": "code" }]
			}"#,
		)
		.expect("Partial dashboard payload should deserialize.");

		assert_eq!(data.stats.total_users, 42);
		assert_eq!(data.stats.active_sessions, 0);
		assert_eq!(data.stats.trends.users, Some(12.5));
		assert_eq!(data.stats.trends.revenue, None);
		assert!(data.live_sessions.is_empty());
		assert!(data.analytics.sessions_chart.is_empty());
		assert_eq!(data.analytics.role_distribution[0].name, "ADMIN");
		assert_eq!(data.recent_activity[0].kind.as_deref(), Some("code"));
	}
}
