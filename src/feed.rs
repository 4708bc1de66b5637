//! Cyclic feed over a recorded current log.
//!
//! The recording is loaded once at startup and then replayed forever: every
//! call to [`FeedReader::next`] hands out the reading under the cursor and
//! moves the cursor one step, wrapping back to the first record after the
//! last. With no recording at all the feed falls back to synthetic readings
//! around the 220 V baseline so the front-end always has something to plot.

use std::{
    fs::File,
    io::Read,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::models::{RawReading, Reading, VOLTAGE_BASELINE};

// ---

/// Half-width of the synthetic voltage band around the baseline.
const SYNTHETIC_VOLTAGE_SPREAD: f64 = 10.0;

/// Upper bound of the synthetic current.
const SYNTHETIC_CURRENT_MAX: f64 = 0.5;

/// Replays a fixed sequence of readings as an endless stream.
pub struct FeedReader {
    // ---
    readings: Vec<Reading>,
    cursor: Mutex<usize>,
    clock: Arc<dyn Clock>,
}

impl FeedReader {
    // ---
    /// Build a feed from an already-parsed sequence.
    pub fn from_readings(readings: Vec<Reading>, clock: Arc<dyn Clock>) -> Self {
        Self {
            readings,
            cursor: Mutex::new(0),
            clock,
        }
    }

    /// Load the feed from a CSV file.
    ///
    /// A missing or unparseable file is not an error: the feed comes up empty
    /// and serves synthetic readings instead.
    pub fn load(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        // ---
        let path = path.as_ref();
        let readings = match File::open(path)
            .with_context(|| format!("Failed to open feed source '{}'", path.display()))
            .and_then(parse_csv)
        {
            Ok(readings) => {
                info!("Loaded {} data points from {}", readings.len(), path.display());
                readings
            }
            Err(e) => {
                error!("Error loading feed data, falling back to simulated readings: {:#}", e);
                Vec::new()
            }
        };
        Self::from_readings(readings, clock)
    }

    /// Load the feed from any CSV byte stream, with the same fallback as [`FeedReader::load`].
    pub fn load_from_reader<R: Read>(source: R, clock: Arc<dyn Clock>) -> Self {
        // ---
        let readings = parse_csv(source).unwrap_or_else(|e| {
            error!("Error loading feed data, falling back to simulated readings: {:#}", e);
            Vec::new()
        });
        Self::from_readings(readings, clock)
    }

    /// Return the reading under the cursor and advance it, wrapping at the end.
    ///
    /// An empty feed returns a fresh synthetic reading and leaves the cursor alone.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Reading {
        // ---
        if self.readings.is_empty() {
            return self.synthetic();
        }

        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = self.readings[*cursor].clone();
        *cursor = (*cursor + 1) % self.readings.len();
        reading
    }

    /// The last `n` readings of the recording, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Reading> {
        let start = self.readings.len().saturating_sub(n);
        self.readings[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Human label for where readings come from.
    pub fn data_source(&self) -> &'static str {
        if self.is_empty() {
            "Simulated"
        } else {
            "CSV"
        }
    }

    fn synthetic(&self) -> Reading {
        // ---
        let mut rng = rand::thread_rng();
        let reading = Reading {
            timestamp: self.clock.now().format("%H:%M:%S").to_string(),
            voltage: VOLTAGE_BASELINE
                + rng.gen_range(-SYNTHETIC_VOLTAGE_SPREAD..=SYNTHETIC_VOLTAGE_SPREAD),
            current: rng.gen_range(0.0..=SYNTHETIC_CURRENT_MAX),
        };
        debug!("Synthetic reading: {:?}", reading);
        reading
    }
}

/// Parse every row of the log; any bad row rejects the whole source.
fn parse_csv<R: Read>(source: R) -> Result<Vec<Reading>> {
    // ---
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    reader
        .deserialize::<RawReading>()
        .enumerate()
        .map(|(i, row)| {
            row.map(|raw| raw.to_reading())
                .with_context(|| format!("Invalid feed record {}", i + 1))
        })
        .collect()
}
