use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Place, PlaceDetails};

use super::fetcher::{FetchFailure, FetchTicket};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OverlayStatus {
    Closed,
    Opening,
    Loading,
    Ready,
    Error,
}

impl Default for OverlayStatus {
    fn default() -> Self {
        OverlayStatus::Closed
    }
}

impl OverlayStatus {
    pub fn is_open(self) -> bool {
        !matches!(self, OverlayStatus::Closed)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub status: OverlayStatus,
    pub place: Option<Place>,
    pub details: Option<PlaceDetails>,
    pub failure: Option<FetchFailure>,
    pub opened_at: Option<DateTime<Utc>>,
    /// Open-cycle counter. Survives `reset` so every cycle gets a fresh value.
    pub epoch: u64,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new cycle for `place` and returns its epoch.
    pub fn begin_opening(&mut self, place: Place, now: DateTime<Utc>) -> u64 {
        let epoch = self.epoch + 1;
        *self = Self {
            status: OverlayStatus::Opening,
            place: Some(place),
            details: None,
            failure: None,
            opened_at: Some(now),
            epoch,
        };
        epoch
    }

    pub fn mark_loading(&mut self) {
        if self.status == OverlayStatus::Opening {
            self.status = OverlayStatus::Loading;
        }
    }

    /// The ticket a completion must carry to be applied right now.
    pub fn current_ticket(&self) -> Option<FetchTicket> {
        if self.status != OverlayStatus::Loading {
            return None;
        }
        self.place.as_ref().map(|place| FetchTicket {
            epoch: self.epoch,
            place_id: place.id.clone(),
        })
    }

    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.current_ticket().as_ref() == Some(ticket)
    }

    pub fn complete(&mut self, details: PlaceDetails) {
        self.status = OverlayStatus::Ready;
        self.details = Some(details);
        self.failure = None;
    }

    pub fn fail(&mut self, failure: FetchFailure) {
        self.status = OverlayStatus::Error;
        self.details = None;
        self.failure = Some(failure);
    }

    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaceId;

    fn place(id: &str) -> Place {
        Place {
            id: PlaceId::new(id),
            name: id.to_uppercase(),
            category: "park".into(),
            rating: 3.5,
            num_ratings: 2,
            photo_url: String::new(),
            location: None,
        }
    }

    #[test]
    fn epochs_increase_across_cycles() {
        let mut state = OverlayState::new();
        let first = state.begin_opening(place("a"), Utc::now());
        state.reset();
        let second = state.begin_opening(place("a"), Utc::now());

        assert!(second > first);
        assert_eq!(state.status, OverlayStatus::Opening);
    }

    #[test]
    fn only_loading_state_accepts_its_own_ticket() {
        let mut state = OverlayState::new();
        let epoch = state.begin_opening(place("a"), Utc::now());
        let ticket = FetchTicket {
            epoch,
            place_id: PlaceId::new("a"),
        };

        assert!(!state.accepts(&ticket));
        state.mark_loading();
        assert!(state.accepts(&ticket));
        assert!(!state.accepts(&FetchTicket {
            epoch: epoch - 1,
            place_id: PlaceId::new("a"),
        }));
        assert!(!state.accepts(&FetchTicket {
            epoch,
            place_id: PlaceId::new("b"),
        }));
    }

    #[test]
    fn reset_discards_place_and_details() {
        let mut state = OverlayState::new();
        state.begin_opening(place("a"), Utc::now());
        state.mark_loading();
        state.fail(FetchFailure::Aborted);

        state.reset();
        assert_eq!(state.status, OverlayStatus::Closed);
        assert!(state.place.is_none());
        assert!(state.failure.is_none());
        assert_eq!(state.epoch, 1);
    }
}
