//! # Hotel Bookings Server
//!
//! Assembles the application from its adapters according to the
//! `db-postgres` feature and the loaded [`Settings`], then serves HTTP until
//! Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use api_adapters::{build_router, AppState, CookieSettings, Metrics};
use configs::Settings;
use domains::{ReservationStore, RoomStore};
use services::{AvailabilityService, BookingFlow, FlowSettings, ReservationService};
use storage_adapters::{LogTransport, MailDispatcher, MemorySessionStore};
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_logger(&settings)?;
    bootstrap(settings).await
}

fn init_logger(settings: &Settings) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| settings.log.level.as_str().into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .try_init()?;
    }
    Ok(())
}

type Stores = (Arc<dyn RoomStore>, Arc<dyn ReservationStore>);

#[cfg(feature = "db-postgres")]
async fn open_stores(settings: &Settings) -> Result<Stores> {
    use configs::ExposeSecret;
    use storage_adapters::PgStore;

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
        settings.acquire_timeout(),
    )
    .await
    .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    let store = Arc::new(store);
    let rooms: Arc<dyn RoomStore> = store.clone();
    let reservations: Arc<dyn ReservationStore> = store;
    Ok((rooms, reservations))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_stores(_settings: &Settings) -> Result<Stores> {
    use storage_adapters::MemoryStore;

    let store = MemoryStore::new();
    store.add_room("General's Quarters").await;
    store.add_room("Major's Suite").await;
    tracing::warn!("using the in-memory store, bookings are lost on exit");

    let store = Arc::new(store);
    let rooms: Arc<dyn RoomStore> = store.clone();
    let reservations: Arc<dyn ReservationStore> = store;
    Ok((rooms, reservations))
}

async fn bootstrap(settings: Settings) -> Result<()> {
    let timeout = settings.storage_timeout();

    // 1. Stores and collaborators
    let (rooms, reservations) = open_stores(&settings).await?;
    let (mailer, _mail_worker) =
        MailDispatcher::spawn(Arc::new(LogTransport), settings.booking.mail_queue);
    let sessions = Arc::new(MemorySessionStore::new(settings.session_lifetime()));
    sessions.clone().spawn_reaper(SESSION_SWEEP);

    // 2. Booking core
    let flow = BookingFlow::new(
        AvailabilityService::new(rooms, timeout),
        ReservationService::new(reservations, timeout),
        Arc::new(mailer),
        FlowSettings {
            mail_from: settings.booking.mail_from.clone(),
            owner_email: settings.booking.owner_email.clone(),
        },
    );

    // 3. HTTP
    let state = AppState::new(
        flow,
        sessions,
        Arc::new(Metrics::new()),
        CookieSettings {
            name: settings.session.cookie_name.clone(),
            secure: settings.session.secure_cookie,
        },
    );
    let app = build_router(state);

    let addr = settings.bind_address()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e, error.message = %e, "Unexpected error"
            )
        })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested, draining connections"),
        Err(err) => {
            tracing::error!(error = %err, "cannot listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
