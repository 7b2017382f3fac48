use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Deserialize;

use crate::models::{Coordinates, PlaceDetails, PlaceGroup, PlaceId};

use super::PlacesProvider;

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    groups: Vec<PlaceGroup>,
    #[serde(default)]
    details: HashMap<PlaceId, PlaceDetails>,
}

/// Provider backed by a JSON document of grouped places and per-place details.
pub struct FixturePlacesProvider {
    groups: Vec<PlaceGroup>,
    details: HashMap<PlaceId, PlaceDetails>,
    latency: Duration,
}

impl FixturePlacesProvider {
    pub fn from_json(contents: &str) -> Result<Self> {
        let fixture: FixtureFile =
            serde_json::from_str(contents).context("Failed to parse places fixture")?;
        Ok(Self {
            groups: fixture.groups,
            details: fixture.details,
            latency: Duration::ZERO,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read places fixture from {}", path.display()))?;
        let provider = Self::from_json(&contents)?;
        info!(
            "Loaded {} place groups and {} detail records from {}",
            provider.groups.len(),
            provider.details.len(),
            path.display()
        );
        Ok(provider)
    }

    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            details: HashMap::new(),
            latency: Duration::ZERO,
        }
    }

    /// Delay applied before every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl PlacesProvider for FixturePlacesProvider {
    async fn search_places(&self, _center: Coordinates) -> Result<Vec<PlaceGroup>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.groups.clone())
    }

    async fn place_details(&self, place_id: &PlaceId) -> Result<PlaceDetails> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.details
            .get(place_id)
            .cloned()
            .ok_or_else(|| anyhow!("no details for place {place_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "groups": [
            { "type": "museum", "data": [
                { "id": "m1", "name": "Maritime Museum", "type": "museum",
                  "rating": 4.6, "numRatings": 210, "photoUrl": "m1.jpg" }
            ] }
        ],
        "details": {
            "m1": {
                "photoUrls": ["m1-a.jpg", "m1-b.jpg"],
                "description": "Ships and such",
                "address": { "formatted": "2 Dock Rd", "googleMapsUrl": "https://maps.example/m1" },
                "website": "https://museum.example"
            }
        }
    }"#;

    #[tokio::test]
    async fn serves_groups_and_details() {
        let provider = FixturePlacesProvider::from_json(FIXTURE).unwrap();

        let groups = provider.search_places(Coordinates::default()).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].display_name(), "Museums");

        let details = provider.place_details(&PlaceId::new("m1")).await.unwrap();
        assert_eq!(details.photo_urls.len(), 2);
        assert_eq!(details.website.as_deref(), Some("https://museum.example"));
    }

    #[tokio::test]
    async fn unknown_place_is_an_error() {
        let provider = FixturePlacesProvider::from_json(FIXTURE).unwrap();
        let err = provider
            .place_details(&PlaceId::new("nope"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn latency_delays_every_response() {
        let provider = FixturePlacesProvider::from_json(FIXTURE)
            .unwrap()
            .with_latency(Duration::from_millis(30));

        let started = tokio::time::Instant::now();
        provider.search_places(Coordinates::default()).await.unwrap();
        provider.place_details(&PlaceId::new("m1")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn malformed_fixture_is_rejected() {
        assert!(FixturePlacesProvider::from_json("{ not json").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FixturePlacesProvider::load(Path::new("/definitely/missing.json"))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("/definitely/missing.json"));
    }
}
