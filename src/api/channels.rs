//! Stream channel catalog (`GET /stream/channels`).

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{ApiRequest, ApiTransport, Envelope},
};

const CHANNELS_PATH: &str = "/stream/channels";
/// Pseudo-category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// A stream source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
	/// Backend identifier.
	#[serde(default, rename = "_id")]
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Category label.
	#[serde(default)]
	pub category: String,
	/// True while the stream is online.
	#[serde(default)]
	pub is_active: bool,
	/// Logo location.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo_url: Option<String>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists channels, optionally restricted to one category.
	///
	/// `None` and [`ALL_CATEGORIES`] both request every channel (an empty `category`).
	pub async fn list_channels(&self, category: Option<&str>) -> Result<Vec<Channel>> {
		let category = category.filter(|c| *c != ALL_CATEGORIES).unwrap_or_default();
		let request = ApiRequest::get(CHANNELS_PATH).query("category", category);
		let response = self.send(request).await?;

		Ok(response.json::<Envelope<Vec<Channel>>>()?.data.unwrap_or_default())
	}
}

/// Case-insensitive search over channel name and category.
pub fn filter_channels<'a>(channels: &'a [Channel], search: &str) -> Vec<&'a Channel> {
	let needle = search.to_lowercase();

	channels
		.iter()
		.filter(|channel| {
			channel.name.to_lowercase().contains(&needle)
				|| channel.category.to_lowercase().contains(&needle)
		})
		.collect()
}

/// [`ALL_CATEGORIES`] followed by each distinct category in first-seen order.
pub fn channel_categories(channels: &[Channel]) -> Vec<String> {
	let mut categories = vec![ALL_CATEGORIES.to_owned()];

	for channel in channels {
		if !categories[1..].contains(&channel.category) {
			categories.push(channel.category.clone());
		}
	}

	categories
}
