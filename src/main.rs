use std::path::PathBuf;
use std::sync::Arc;

use time::macros::format_description;
use time::{Date, Time};
use tracing::info;

use maitre::engine::{BookingRequest, Engine};
use maitre::model::DayWindow;
use maitre::{observability, seed, sweeper};

const DATE_FMT: &'static [time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// One-shot driver: load the catalog, run a discovery for the requested
/// party, optionally commit the booking, print the outcome as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("MAITRE_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    observability::init(metrics_port);

    let seed_path = std::env::var("MAITRE_SEED").unwrap_or_else(|_| "./seed.json".into());
    let sector = std::env::var("MAITRE_SECTOR").unwrap_or_else(|_| "main".into());
    let date_raw = std::env::var("MAITRE_DATE")?;
    let date = Date::parse(&date_raw, DATE_FMT)?;
    let party_size: u32 = std::env::var("MAITRE_PARTY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);
    let windows = match std::env::var("MAITRE_WINDOW") {
        Ok(raw) => Some(vec![parse_window(&raw)?]),
        Err(_) => None,
    };
    let book = std::env::var("MAITRE_BOOK").is_ok_and(|v| v == "1");
    let idempotency_key = std::env::var("MAITRE_IDEMPOTENCY_KEY").ok();

    let engine = Arc::new(Engine::new());
    let loaded = seed::load(&PathBuf::from(&seed_path), engine.store())?;
    info!("loaded {loaded} sectors from {seed_path}");

    tokio::spawn(sweeper::run_sweeper(engine.clone()));

    if book {
        let request = BookingRequest {
            sector_id: sector,
            date,
            party_size,
            windows,
            idempotency_key,
        };
        let reservation = engine.create_booking(&request)?;
        println!("{}", serde_json::to_string_pretty(&reservation)?);
    } else {
        let candidates =
            engine.find_availability(&sector, date, party_size, windows.as_deref())?;
        info!("{} candidates for party of {party_size}", candidates.len());
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    }

    Ok(())
}

/// `HH:MM-HH:MM`
fn parse_window(raw: &str) -> Result<DayWindow, Box<dyn std::error::Error>> {
    let (start, end) = raw
        .split_once('-')
        .ok_or("window must be HH:MM-HH:MM")?;
    Ok(DayWindow::new(
        Time::parse(start.trim(), seed::TIME_FMT)?,
        Time::parse(end.trim(), seed::TIME_FMT)?,
    ))
}
