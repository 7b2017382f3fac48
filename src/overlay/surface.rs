use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Serialize;

use super::geometry::{Point, Rect};

/// Dismissal listeners the controller attaches to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenerKind {
    Cancel,
    Close,
    Click,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [ListenerKind::Cancel, ListenerKind::Close, ListenerKind::Click];
}

/// Events the surface reports back to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Native cancel, e.g. the escape key.
    Cancel,
    /// Native close of the modal element.
    Close,
    Click(Point),
}

impl SurfaceEvent {
    pub fn listener(&self) -> ListenerKind {
        match self {
            SurfaceEvent::Cancel => ListenerKind::Cancel,
            SurfaceEvent::Close => ListenerKind::Close,
            SurfaceEvent::Click(_) => ListenerKind::Click,
        }
    }
}

/// The modal element the overlay renders into.
pub trait OverlaySurface: Send + Sync + 'static {
    fn show_modal(&self);
    fn hide(&self);
    /// `None` until the surface has been laid out.
    fn bounding_rect(&self) -> Option<Rect>;
    /// `epoch` identifies the open cycle; events delivered through this
    /// listener must carry it back to the controller.
    fn add_listener(&self, kind: ListenerKind, epoch: u64);
    fn remove_listener(&self, kind: ListenerKind, epoch: u64);
}

/// Every dismissal listener for one open cycle. Dropping the registration
/// removes all of them, so no exit path can leave one behind.
pub struct ListenerRegistration<S: OverlaySurface> {
    surface: Arc<S>,
    epoch: u64,
}

impl<S: OverlaySurface> ListenerRegistration<S> {
    pub fn acquire(surface: Arc<S>, epoch: u64) -> Self {
        for kind in ListenerKind::ALL {
            surface.add_listener(kind, epoch);
        }
        Self { surface, epoch }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl<S: OverlaySurface> Drop for ListenerRegistration<S> {
    fn drop(&mut self) {
        for kind in ListenerKind::ALL {
            self.surface.remove_listener(kind, self.epoch);
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    visible: bool,
    bounds: Option<Rect>,
    listeners: HashMap<ListenerKind, usize>,
    listener_epoch: Option<u64>,
    show_count: usize,
}

/// In-memory surface that records what the controller did to it.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    pub fn new(bounds: Option<Rect>) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                bounds,
                ..HeadlessState::default()
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut HeadlessState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn set_bounds(&self, bounds: Option<Rect>) {
        self.with_state(|state| state.bounds = bounds);
    }

    pub fn is_visible(&self) -> bool {
        self.with_state(|state| state.visible)
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.with_state(|state| state.listeners.get(&kind).copied().unwrap_or(0))
    }

    pub fn total_listeners(&self) -> usize {
        self.with_state(|state| state.listeners.values().sum())
    }

    /// Open cycle the live listeners belong to, used to stamp dispatched events.
    pub fn listener_epoch(&self) -> Option<u64> {
        self.with_state(|state| state.listener_epoch)
    }

    pub fn show_count(&self) -> usize {
        self.with_state(|state| state.show_count)
    }
}

impl OverlaySurface for HeadlessSurface {
    fn show_modal(&self) {
        self.with_state(|state| {
            state.visible = true;
            state.show_count += 1;
        });
    }

    fn hide(&self) {
        self.with_state(|state| state.visible = false);
    }

    fn bounding_rect(&self) -> Option<Rect> {
        self.with_state(|state| if state.visible { state.bounds } else { None })
    }

    fn add_listener(&self, kind: ListenerKind, epoch: u64) {
        self.with_state(|state| {
            *state.listeners.entry(kind).or_insert(0) += 1;
            state.listener_epoch = Some(epoch);
        });
    }

    fn remove_listener(&self, kind: ListenerKind, epoch: u64) {
        self.with_state(|state| {
            if let Some(count) = state.listeners.get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
            if state.listener_epoch == Some(epoch) && state.listeners.values().all(|n| *n == 0) {
                state.listener_epoch = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_releases_every_listener_on_drop() {
        let surface = Arc::new(HeadlessSurface::new(None));

        let registration = ListenerRegistration::acquire(Arc::clone(&surface), 4);
        assert_eq!(registration.epoch(), 4);
        for kind in ListenerKind::ALL {
            assert_eq!(surface.listener_count(kind), 1);
        }
        assert_eq!(surface.listener_epoch(), Some(4));

        drop(registration);
        assert_eq!(surface.total_listeners(), 0);
        assert_eq!(surface.listener_epoch(), None);
    }

    #[test]
    fn hidden_surface_reports_no_geometry() {
        let surface = HeadlessSurface::new(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(surface.bounding_rect(), None);

        surface.show_modal();
        assert_eq!(surface.bounding_rect(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(surface.show_count(), 1);

        surface.hide();
        assert!(!surface.is_visible());
    }

    #[test]
    fn events_map_to_their_listener() {
        assert_eq!(SurfaceEvent::Cancel.listener(), ListenerKind::Cancel);
        assert_eq!(
            SurfaceEvent::Click(Point::new(1.0, 2.0)).listener(),
            ListenerKind::Click
        );
    }
}
