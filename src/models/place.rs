use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, provider-assigned place identifier. Membership and overlay
/// targeting are keyed on this, never on the display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }
}

/// Summary record returned by place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub rating: f32,
    pub num_ratings: u32,
    pub photo_url: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

impl Place {
    pub fn rating_label(&self) -> String {
        if self.num_ratings == 0 {
            return "No ratings".to_string();
        }

        let noun = if self.num_ratings == 1 { "rating" } else { "ratings" };
        format!("{} / 5 ({} {})", self.rating, self.num_ratings, noun)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub formatted: String,
    pub google_maps_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author_name: String,
    pub rating: f32,
    pub text: String,
    #[serde(default)]
    pub relative_time: Option<String>,
}

/// Extended record fetched per place when the overlay opens. Replaced
/// wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub address: Address,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// `None` means the place has no website, which is not a failure.
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub business_hours: Option<Vec<String>>,
    #[serde(default)]
    pub reviews: Option<Vec<Review>>,
}

/// Places of one category as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceGroup {
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "data")]
    pub places: Vec<Place>,
}

impl PlaceGroup {
    pub fn display_name(&self) -> String {
        category_display_name(&self.category)
    }

    pub fn find(&self, id: &PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| &place.id == id)
    }
}

/// Maps provider type tags to group titles.
pub fn category_display_name(tag: &str) -> String {
    let known = match tag {
        "tourist_attraction" => Some("Tourist Attractions"),
        "restaurant" => Some("Restaurants"),
        "lodging" => Some("Hotels"),
        "cafe" => Some("Cafes"),
        "bar" => Some("Bars"),
        "museum" => Some("Museums"),
        "park" => Some("Parks"),
        "shopping_mall" => Some("Shopping"),
        _ => None,
    };

    if let Some(name) = known {
        return name.to_string();
    }

    tag.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
