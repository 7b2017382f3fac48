use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex};

use crate::{
    models::{Place, PlaceDetails, PlaceId},
    provider::PlacesProvider,
};

use super::{
    fetcher::{DetailFetcher, FetchFailure, FetchOutcome, FetchTicket},
    geometry::{ClickVerdict, OutsideClickDetector},
    state::{OverlayState, OverlayStatus},
    surface::{ListenerRegistration, OverlaySurface, SurfaceEvent},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub fetch_timeout: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    Button,
    OutsideClick,
    NativeDismiss,
    /// Another place was opened while this one was showing.
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OverlayEvent {
    Opened {
        place_id: PlaceId,
        epoch: u64,
    },
    DetailsLoaded {
        place_id: PlaceId,
        epoch: u64,
    },
    FetchFailed {
        place_id: PlaceId,
        epoch: u64,
        failure: FetchFailure,
    },
    StaleDiscarded {
        place_id: PlaceId,
        epoch: u64,
    },
    Closed {
        place_id: Option<PlaceId>,
        epoch: u64,
        reason: CloseReason,
    },
}

/// What the overlay surface should render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayContent<'a> {
    Hidden,
    Loading {
        place: &'a Place,
    },
    /// Fetch failed: only the summary the card already had.
    Summary {
        place: &'a Place,
        failure: Option<&'a FetchFailure>,
    },
    Full {
        place: &'a Place,
        details: &'a PlaceDetails,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub state: OverlayState,
    pub listeners_attached: bool,
    pub fetch_in_flight: bool,
}

impl OverlaySnapshot {
    pub fn status(&self) -> OverlayStatus {
        self.state.status
    }

    pub fn content(&self) -> OverlayContent<'_> {
        let Some(place) = self.state.place.as_ref() else {
            return OverlayContent::Hidden;
        };

        match (self.state.status, self.state.details.as_ref()) {
            (OverlayStatus::Closed, _) => OverlayContent::Hidden,
            (OverlayStatus::Opening | OverlayStatus::Loading, _) => OverlayContent::Loading { place },
            (OverlayStatus::Ready, Some(details)) => OverlayContent::Full { place, details },
            (OverlayStatus::Ready | OverlayStatus::Error, _) => OverlayContent::Summary {
                place,
                failure: self.state.failure.as_ref(),
            },
        }
    }
}

struct Inner<S: OverlaySurface> {
    state: OverlayState,
    listeners: Option<ListenerRegistration<S>>,
}

struct Shared<P, S: OverlaySurface> {
    inner: Mutex<Inner<S>>,
    fetcher: DetailFetcher<P>,
    surface: Arc<S>,
    detector: OutsideClickDetector,
    state_tx: watch::Sender<OverlaySnapshot>,
    events: broadcast::Sender<OverlayEvent>,
}

/// Drives the single place-detail overlay of a screen through
/// Closed -> Opening -> Loading -> Ready | Error -> Closed.
pub struct OverlayController<P, S: OverlaySurface> {
    shared: Arc<Shared<P, S>>,
}

impl<P, S: OverlaySurface> Clone for OverlayController<P, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: PlacesProvider, S: OverlaySurface> OverlayController<P, S> {
    pub fn new(provider: Arc<P>, surface: Arc<S>, config: OverlayConfig) -> Self {
        let (state_tx, _state_rx) = watch::channel(OverlaySnapshot::default());
        let (events, _events_rx) = broadcast::channel(EVENT_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: OverlayState::new(),
                    listeners: None,
                }),
                fetcher: DetailFetcher::new(provider, config.fetch_timeout),
                surface,
                detector: OutsideClickDetector,
                state_tx,
                events,
            }),
        }
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.shared.surface
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.shared.state_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OverlayEvent> {
        self.shared.events.subscribe()
    }

    /// Opens the overlay for `place`. An overlay already showing another
    /// place is closed first, which releases its listeners and orphans its
    /// fetch.
    pub async fn open(&self, place: Place) -> OverlaySnapshot {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;

        if inner.state.status.is_open() {
            shared.close_locked(&mut inner, CloseReason::Replaced);
        }

        let place_id = place.id.clone();
        let epoch = inner.state.begin_opening(place, Utc::now());

        // Listeners go on before the surface becomes interactive.
        inner.listeners = Some(ListenerRegistration::acquire(
            Arc::clone(&shared.surface),
            epoch,
        ));
        shared.surface.show_modal();
        inner.state.mark_loading();

        let weak: Weak<Shared<P, S>> = Arc::downgrade(shared);
        shared.fetcher.start(
            FetchTicket {
                epoch,
                place_id: place_id.clone(),
            },
            move |outcome| async move {
                if let Some(shared) = weak.upgrade() {
                    shared.apply_outcome(outcome).await;
                }
            },
        );

        log_info!("overlay opened for {} (epoch {})", place_id, epoch);
        shared.emit(OverlayEvent::Opened { place_id, epoch });
        shared.publish(&inner)
    }

    /// Returns `false` if the overlay was already closed.
    pub async fn close(&self, reason: CloseReason) -> bool {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        let closed = shared.close_locked(&mut inner, reason);
        if closed {
            shared.publish(&inner);
        }
        closed
    }

    /// Routes an event reported by the surface. `epoch` is the open cycle
    /// the delivering listener was registered under. Events arriving while
    /// no listeners are registered, or from an earlier cycle, are dropped.
    /// Returns `true` if the event closed the overlay.
    pub async fn handle_surface_event(&self, epoch: u64, event: SurfaceEvent) -> bool {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;

        let Some(registration) = inner.listeners.as_ref() else {
            log_debug!("ignoring {:?}: no listeners registered", event);
            return false;
        };
        if registration.epoch() != epoch {
            log_debug!(
                "ignoring {:?} from epoch {} during epoch {}",
                event,
                epoch,
                registration.epoch()
            );
            return false;
        }

        let reason = match event {
            SurfaceEvent::Cancel | SurfaceEvent::Close => CloseReason::NativeDismiss,
            SurfaceEvent::Click(pointer) => {
                match shared
                    .detector
                    .classify(shared.surface.bounding_rect(), pointer)
                {
                    ClickVerdict::Outside => CloseReason::OutsideClick,
                    ClickVerdict::Inside => return false,
                    ClickVerdict::NoGeometry => {
                        log_debug!("click at {:?} with no surface bounds (epoch {})", pointer, epoch);
                        return false;
                    }
                }
            }
        };

        let closed = shared.close_locked(&mut inner, reason);
        if closed {
            shared.publish(&inner);
        }
        closed
    }
}

impl<P: PlacesProvider, S: OverlaySurface> Shared<P, S> {
    /// Shared exit path for every close cause.
    fn close_locked(&self, inner: &mut Inner<S>, reason: CloseReason) -> bool {
        if !inner.state.status.is_open() {
            return false;
        }

        drop(inner.listeners.take());
        self.fetcher.detach();

        let place_id = inner.state.place.as_ref().map(|place| place.id.clone());
        let epoch = inner.state.epoch;
        inner.state.reset();
        self.surface.hide();

        log_info!(
            "overlay closed ({:?}) for {:?} (epoch {})",
            reason,
            place_id.as_ref().map(PlaceId::as_str),
            epoch
        );
        self.emit(OverlayEvent::Closed {
            place_id,
            epoch,
            reason,
        });
        true
    }

    async fn apply_outcome(&self, outcome: FetchOutcome) {
        let mut inner = self.inner.lock().await;
        self.fetcher.finish(&outcome.ticket);

        let FetchTicket { epoch, place_id } = outcome.ticket.clone();

        if !inner.state.accepts(&outcome.ticket) {
            log_debug!("discarding stale details for {} (epoch {})", place_id, epoch);
            self.emit(OverlayEvent::StaleDiscarded { place_id, epoch });
            return;
        }

        match outcome.result {
            Ok(details) => {
                log_info!("details ready for {} (epoch {})", place_id, epoch);
                inner.state.complete(details);
                self.emit(OverlayEvent::DetailsLoaded { place_id, epoch });
            }
            Err(failure) => {
                log_warn!("details failed for {} (epoch {}): {}", place_id, epoch, failure);
                inner.state.fail(failure.clone());
                self.emit(OverlayEvent::FetchFailed {
                    place_id,
                    epoch,
                    failure,
                });
            }
        }

        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner<S>) -> OverlaySnapshot {
        let snapshot = OverlaySnapshot {
            state: inner.state.clone(),
            listeners_attached: inner.listeners.is_some(),
            fetch_in_flight: self.fetcher.in_flight().is_some(),
        };
        self.state_tx.send_replace(snapshot.clone());
        snapshot
    }

    fn emit(&self, event: OverlayEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
