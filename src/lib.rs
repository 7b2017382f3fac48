pub mod models;
pub mod overlay;
pub mod provider;
pub mod screen;
pub mod selection;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

use overlay::{CloseReason, HeadlessSurface, OverlayContent, OverlayEvent, Rect};
use provider::FixturePlacesProvider;
use screen::{DestinationScreen, DestinationView};
use settings::{ExplorerSettings, SettingsStore};

const SETTINGS_ENV: &str = "EXPLORER_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = "explorer-settings.json";

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Destination explorer starting up...");

    let settings_path = std::env::var(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let settings_store = SettingsStore::new(settings_path)?;
    let settings = settings_store.current();

    let provider = match settings.fixture_path.as_deref() {
        Some(path) => {
            FixturePlacesProvider::load(path)?.with_latency(settings.fixture_latency())
        }
        None => {
            warn!(
                "No fixture_path in {}; starting with an empty place list",
                settings_store.path().display()
            );
            FixturePlacesProvider::empty()
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(explore(provider, settings))
}

async fn explore(provider: FixturePlacesProvider, settings: ExplorerSettings) -> Result<()> {
    let surface = Arc::new(HeadlessSurface::new(Some(Rect::new(0.0, 0.0, 960.0, 720.0))));
    let mut screen = DestinationScreen::new(
        Arc::new(provider),
        surface,
        settings.overlay_config(),
    );

    if let Err(err) = screen.load(settings.default_center).await {
        warn!("Search failed: {err:#}");
    }

    let first_place = match screen.view() {
        DestinationView::Ready { groups, .. } => {
            for group in groups {
                info!("{}", group.display_name());
                for place in &group.places {
                    info!("  {} - {}", place.name, place.rating_label());
                }
            }
            groups
                .iter()
                .flat_map(|group| group.places.first())
                .next()
                .map(|place| place.id.clone())
        }
        DestinationView::Failed { message } => {
            info!("{message}");
            None
        }
        DestinationView::Loading => None,
    };

    let Some(place_id) = first_place else {
        return Ok(());
    };

    let mut events = screen.overlay().subscribe_events();
    screen.card_clicked(&place_id).await?;

    loop {
        match events.recv().await {
            Ok(OverlayEvent::DetailsLoaded { .. } | OverlayEvent::FetchFailed { .. }) => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {skipped} overlay events");
            }
            Err(RecvError::Closed) => break,
        }
    }

    match screen.overlay().snapshot().content() {
        OverlayContent::Full { place, details } => {
            info!("{}: {}", place.name, details.description);
            info!("{}", details.address.formatted);
            if let Some(website) = &details.website {
                info!("Visit their website: {website}");
            }
        }
        OverlayContent::Summary { place, failure } => {
            info!("{} ({})", place.name, place.rating_label());
            if let Some(failure) = failure {
                warn!("{failure}");
            }
        }
        OverlayContent::Loading { .. } | OverlayContent::Hidden => {}
    }

    screen.overlay().close(CloseReason::Button).await;
    Ok(())
}
