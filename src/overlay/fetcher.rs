use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use tokio::{task::JoinHandle, time};

use crate::{
    models::{PlaceDetails, PlaceId},
    provider::PlacesProvider,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Why an overlay could not show extended details. The overlay falls back to
/// the place summary in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchFailure {
    #[error("place details unavailable: {message}")]
    Provider { message: String },
    #[error("place details timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("place details task ended before reporting")]
    Aborted,
}

/// Identifies one fetch: the open cycle that issued it and the place it was
/// issued for. A completion is applied only while both still match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub epoch: u64,
    pub place_id: PlaceId,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<PlaceDetails, FetchFailure>,
}

struct InFlight {
    ticket: FetchTicket,
    handle: JoinHandle<()>,
}

/// Runs at most one tracked detail request at a time. Starting a new request
/// detaches the previous one: its task keeps running to completion, and the
/// completion handler is expected to discard it by ticket.
pub struct DetailFetcher<P> {
    provider: Arc<P>,
    timeout: Duration,
    in_flight: Mutex<Option<InFlight>>,
}

impl<P: PlacesProvider> DetailFetcher<P> {
    pub fn new(provider: Arc<P>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            in_flight: Mutex::new(None),
        }
    }

    pub fn start<F, Fut>(&self, ticket: FetchTicket, on_complete: F)
    where
        F: FnOnce(FetchOutcome) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        let timeout = self.timeout;
        let task_ticket = ticket.clone();

        // Hold the slot while spawning so the task cannot finish before it
        // has been recorded as in flight.
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        log_info!(
            "fetching details for {} (epoch {})",
            ticket.place_id,
            ticket.epoch
        );

        let handle = tokio::spawn(async move {
            let place_id = task_ticket.place_id.clone();
            let request = tokio::spawn(async move {
                time::timeout(timeout, provider.place_details(&place_id)).await
            });

            let result = match request.await {
                Ok(Ok(Ok(details))) => Ok(details),
                Ok(Ok(Err(err))) => Err(FetchFailure::Provider {
                    message: format!("{err:#}"),
                }),
                Ok(Err(_)) => Err(FetchFailure::Timeout {
                    after_ms: saturating_millis(timeout),
                }),
                Err(join_err) => {
                    log_error!(
                        "detail request for {} ended abnormally: {join_err}",
                        task_ticket.place_id
                    );
                    Err(FetchFailure::Aborted)
                }
            };

            on_complete(FetchOutcome {
                ticket: task_ticket,
                result,
            })
            .await;
        });

        if let Some(previous) = slot.replace(InFlight { ticket, handle }) {
            log_debug!(
                "detached superseded fetch for {} (epoch {})",
                previous.ticket.place_id,
                previous.ticket.epoch
            );
        }
    }

    /// Stops tracking the current request without aborting it.
    pub fn detach(&self) -> Option<FetchTicket> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        slot.take().map(|in_flight| {
            log_debug!(
                "detached fetch for {} (epoch {})",
                in_flight.ticket.place_id,
                in_flight.ticket.epoch
            );
            in_flight.ticket
        })
    }

    /// Clears the slot if `ticket` is the tracked request.
    pub fn finish(&self, ticket: &FetchTicket) -> bool {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(in_flight) if &in_flight.ticket == ticket => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        let slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|in_flight| in_flight.ticket.clone())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<P> Drop for DetailFetcher<P> {
    fn drop(&mut self) {
        let slot = match self.in_flight.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(in_flight) = slot.take() {
            in_flight.handle.abort();
        }
    }
}
