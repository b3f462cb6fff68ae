use std::io;
use std::path::Path;

use serde::Deserialize;
use time::Time;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::engine::AllocationStore;
use crate::model::{DayWindow, Sector, Table};

pub const TIME_FMT: &'static [BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]");

/// On-disk catalog shape:
/// `{"sectors":[{"id":"main","service_windows":[["11:30","14:30"]],
///   "tables":[{"id":"T1","min_size":2,"max_size":4}]}]}`
#[derive(Debug, Deserialize)]
struct SeedFile {
    sectors: Vec<SeedSector>,
}

#[derive(Debug, Deserialize)]
struct SeedSector {
    id: String,
    #[serde(default)]
    service_windows: Vec<(String, String)>,
    tables: Vec<Table>,
}

fn invalid(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

/// Load the sector catalog from a JSON seed file into the store.
/// Returns the number of sectors loaded.
pub fn load(path: &Path, store: &AllocationStore) -> io::Result<usize> {
    let raw = std::fs::read_to_string(path)?;
    let seed: SeedFile = serde_json::from_str(&raw).map_err(invalid)?;

    let mut loaded = 0;
    for sector in seed.sectors {
        let mut windows = Vec::with_capacity(sector.service_windows.len());
        for (start, end) in &sector.service_windows {
            let start = Time::parse(start, TIME_FMT).map_err(invalid)?;
            let end = Time::parse(end, TIME_FMT).map_err(invalid)?;
            if start >= end {
                return Err(invalid(format!(
                    "inverted service window {start}..{end} in sector {}",
                    sector.id
                )));
            }
            windows.push(DayWindow::new(start, end));
        }
        store.insert_sector(Sector {
            id: sector.id,
            service_windows: windows,
            tables: sector.tables,
        });
        loaded += 1;
    }
    Ok(loaded)
}
