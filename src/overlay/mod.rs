pub mod controller;
pub mod fetcher;
pub mod geometry;
pub mod state;
pub mod surface;

pub use controller::{
    CloseReason, OverlayConfig, OverlayContent, OverlayController, OverlayEvent, OverlaySnapshot,
};
pub use fetcher::{DetailFetcher, FetchFailure, FetchOutcome, FetchTicket};
pub use geometry::{ClickVerdict, OutsideClickDetector, Point, Rect};
pub use state::{OverlayState, OverlayStatus};
pub use surface::{HeadlessSurface, ListenerKind, ListenerRegistration, OverlaySurface, SurfaceEvent};
