//! Seeds the reference rooms. Safe to run repeatedly: rooms that already
//! exist by name are left alone. Restriction kinds come with the migrations.

use anyhow::{Context, Result};
use configs::{ExposeSecret, Settings};
use storage_adapters::PgStore;

const ROOMS: [&str; 2] = ["General's Quarters", "Major's Suite"];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let settings = Settings::load().context("loading settings")?;
    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        1,
        settings.acquire_timeout(),
    )
    .await
    .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    for name in ROOMS {
        let inserted = sqlx::query(
            "INSERT INTO rooms (room_name) \
             SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM rooms WHERE room_name = $1)",
        )
        .bind(name)
        .execute(store.pool())
        .await
        .with_context(|| format!("inserting room {name}"))?
        .rows_affected();

        if inserted > 0 {
            tracing::info!(room = name, "room created");
        } else {
            tracing::info!(room = name, "room already present");
        }
    }
    Ok(())
}
