pub mod fixture;

use std::future::Future;

use anyhow::Result;

use crate::models::{Coordinates, PlaceDetails, PlaceGroup, PlaceId};

pub use fixture::FixturePlacesProvider;

/// Source of place search results and per-place details.
pub trait PlacesProvider: Send + Sync + 'static {
    fn search_places(
        &self,
        center: Coordinates,
    ) -> impl Future<Output = Result<Vec<PlaceGroup>>> + Send;

    fn place_details(&self, place_id: &PlaceId)
        -> impl Future<Output = Result<PlaceDetails>> + Send;
}
