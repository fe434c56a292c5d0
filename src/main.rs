use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use roombook::clock::SystemClock;
use roombook::limits::{DEFAULT_BOOKING_HORIZON_DAYS, DEFAULT_MAX_STAY_NIGHTS};
use roombook::scheduler::{BookingPolicy, Scheduler};
use roombook::store::RoomStore;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("ROOMBOOK_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    roombook::observability::init(metrics_port)?;

    let port = std::env::var("ROOMBOOK_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("ROOMBOOK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("ROOMBOOK_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let compact_threshold: u64 = env_or("ROOMBOOK_COMPACT_THRESHOLD", 1000);
    let room_name = std::env::var("ROOMBOOK_ROOM_NAME").unwrap_or_else(|_| "Room 1".into());
    let room_beds: u32 = env_or("ROOMBOOK_ROOM_BEDS", 4);
    let policy = BookingPolicy {
        max_stay_nights: env_or("ROOMBOOK_MAX_STAY_NIGHTS", DEFAULT_MAX_STAY_NIGHTS),
        horizon_days: env_or("ROOMBOOK_BOOKING_HORIZON_DAYS", DEFAULT_BOOKING_HORIZON_DAYS),
    };

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;
    let wal_path = PathBuf::from(&data_dir).join("reservations.wal");

    let store = Arc::new(RoomStore::open(&wal_path, compact_threshold)?);
    let room = store.ensure_room(&room_name, room_beds).await?;
    let scheduler = Arc::new(
        Scheduler::new(store.clone(), Arc::new(SystemClock)).with_policy(policy),
    );
    let app = roombook::http::router(scheduler);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("roombook listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!("  compact_threshold: {compact_threshold}");
    info!("  room: {} ({}, {} beds)", room.name, room.id, room.beds);
    info!(
        "  policy: max {} nights, {} day horizon",
        policy.max_stay_nights, policy.horizon_days
    );
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, let in-flight requests finish
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let shutdown = async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
        info!("shutdown signal received, draining requests");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(
        "roombook stopped with {} reservations on {} room(s)",
        store.reservation_count(),
        store.room_count()
    );
    Ok(())
}
