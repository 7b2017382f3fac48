//! Destination screen: grouped listings, the map, the weather panel and the
//! single place overlay, all sharing one [`SelectionSet`].

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Serialize;

use crate::{
    models::{Coordinates, Place, PlaceGroup, PlaceId},
    overlay::{OverlayConfig, OverlayController, OverlaySnapshot, OverlaySurface},
    provider::PlacesProvider,
    selection::{Membership, SelectionSet},
};

pub const SEARCH_FAILED_MESSAGE: &str = "Sorry, we had trouble with that search.";

#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    Loading,
    Failed,
    Ready(Vec<PlaceGroup>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub place_id: PlaceId,
    pub name: String,
    pub position: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub markers: Vec<MapMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherRequest {
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FavoriteState {
    Added,
    NotAdded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DestinationView<'a> {
    Loading,
    Failed { message: &'static str },
    Ready {
        map: MapView,
        groups: &'a [PlaceGroup],
        weather: WeatherRequest,
    },
}

pub struct DestinationScreen<P, S: OverlaySurface> {
    provider: Arc<P>,
    selection: SelectionSet,
    overlay: OverlayController<P, S>,
    center: Coordinates,
    listing: ListingState,
}

impl<P: PlacesProvider, S: OverlaySurface> DestinationScreen<P, S> {
    pub fn new(provider: Arc<P>, surface: Arc<S>, config: OverlayConfig) -> Self {
        let overlay = OverlayController::new(Arc::clone(&provider), surface, config);
        Self {
            provider,
            selection: SelectionSet::new(),
            overlay,
            center: Coordinates::default(),
            listing: ListingState::Loading,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn overlay(&self) -> &OverlayController<P, S> {
        &self.overlay
    }

    pub fn listing(&self) -> &ListingState {
        &self.listing
    }

    /// Searches around `center` and returns how many places came back.
    pub async fn load(&mut self, center: Coordinates) -> Result<usize> {
        self.center = center;
        self.listing = ListingState::Loading;

        match self.provider.search_places(center).await {
            Ok(groups) => {
                let count = groups.iter().map(|group| group.places.len()).sum();
                info!(
                    "Loaded {} places in {} groups around ({}, {})",
                    count,
                    groups.len(),
                    center.lat,
                    center.lng
                );
                self.listing = ListingState::Ready(groups);
                Ok(count)
            }
            Err(err) => {
                error!("Place search failed: {err:#}");
                self.listing = ListingState::Failed;
                Err(err)
            }
        }
    }

    pub fn view(&self) -> DestinationView<'_> {
        match &self.listing {
            ListingState::Loading => DestinationView::Loading,
            ListingState::Failed => DestinationView::Failed {
                message: SEARCH_FAILED_MESSAGE,
            },
            ListingState::Ready(groups) => DestinationView::Ready {
                map: self.map_view(),
                groups,
                weather: self.weather_request(),
            },
        }
    }

    pub fn find_place(&self, id: &PlaceId) -> Option<&Place> {
        match &self.listing {
            ListingState::Ready(groups) => groups.iter().find_map(|group| group.find(id)),
            _ => None,
        }
    }

    pub async fn card_clicked(&self, id: &PlaceId) -> Result<OverlaySnapshot> {
        let place = self
            .find_place(id)
            .cloned()
            .ok_or_else(|| anyhow!("no listed place with id {id}"))?;
        Ok(self.overlay.open(place).await)
    }

    /// Heart icon on a card or in the overlay.
    pub fn favorite_clicked(&self, id: &PlaceId) -> Result<Membership> {
        let place = self
            .find_place(id)
            .cloned()
            .or_else(|| {
                self.selection
                    .snapshot()
                    .places()
                    .iter()
                    .find(|place| &place.id == id)
                    .cloned()
            })
            .ok_or_else(|| anyhow!("no known place with id {id}"))?;
        Ok(self.selection.toggle(place))
    }

    pub fn favorite_state(&self, id: &PlaceId) -> FavoriteState {
        if self.selection.contains(id) {
            FavoriteState::Added
        } else {
            FavoriteState::NotAdded
        }
    }

    /// One marker per selected place, keyed by id.
    pub fn map_view(&self) -> MapView {
        let markers = self
            .selection
            .snapshot()
            .places()
            .iter()
            .map(|place| MapMarker {
                place_id: place.id.clone(),
                name: place.name.clone(),
                position: place.location,
            })
            .collect();

        MapView {
            center: self.center,
            markers,
        }
    }

    pub fn weather_request(&self) -> WeatherRequest {
        WeatherRequest {
            coordinates: self.center,
        }
    }
}
