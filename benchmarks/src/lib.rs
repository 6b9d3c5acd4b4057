//! Benchmark utilities for the flight-delay pipeline.
//!
//! Provides a seeded generator of synthetic flight histories so the
//! benchmarks run without the real dataset.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use flight_delay::FlightRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Airlines drawn by [`synthetic_flights`]; the first four are whitelisted features.
pub const AIRLINES: [&str; 6] = [
    "Grupo LATAM",
    "Sky Airline",
    "Copa Air",
    "Latin American Wings",
    "Aerolineas Argentinas",
    "American Airlines",
];

/// `n` flights during 2017 with departure timestamps.
///
/// International flights are late more often, so a fitted classifier has
/// signal to find.
pub fn synthetic_flights(n: usize, seed: u64) -> Vec<FlightRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN);

    (0..n)
        .map(|_| {
            let scheduled = start + Duration::minutes(rng.gen_range(0..365 * 24 * 60));
            let international = rng.gen_bool(0.4);
            let delay_p = if international { 0.45 } else { 0.1 };
            let late = if rng.gen_bool(delay_p) {
                rng.gen_range(16..90)
            } else {
                rng.gen_range(-10..15)
            };
            let airline = AIRLINES.choose(&mut rng).copied().unwrap_or(AIRLINES[0]);
            FlightRecord::new(
                airline,
                if international { "I" } else { "N" },
                scheduled.month(),
            )
            .with_departures(scheduled, scheduled + Duration::minutes(late))
        })
        .collect()
}
