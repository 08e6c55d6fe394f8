//! Synthetic `station;temperature` measurements.

use std::io::{self, BufWriter, Write};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

const STD_DEV: f64 = 10.0;
const MIN_TEMP: f64 = -99.9;
const MAX_TEMP: f64 = 99.9;

const BUILTIN_STATIONS: &[(&str, f64)] = &[
    ("Abha", 18.0),
    ("Abidjan", 26.0),
    ("Abéché", 29.4),
    ("Accra", 26.4),
    ("Addis Ababa", 16.0),
    ("Adelaide", 17.3),
    ("Anchorage", 2.8),
    ("Ashgabat", 17.1),
    ("Baghdad", 22.77),
    ("Bangkok", 28.6),
    ("Bāgepalli", 24.1),
    ("Berlin", 10.3),
    ("Bilbao", 14.7),
    ("Cairo", 21.4),
    ("Cape Town", 16.2),
    ("Dakar", 24.0),
    ("Dikson", -11.1),
    ("Dodoma", 22.7),
    ("Hamburg", 9.7),
    ("Helsinki", 5.9),
    ("Istanbul", 13.9),
    ("İzmir", 17.9),
    ("Jakarta", 26.7),
    ("Konibodom", 14.9),
    ("Lima", 19.3),
    ("Melbourne", 15.1),
    ("Mexico City", 17.5),
    ("Nuuk", -1.4),
    ("Oslo", 5.7),
    ("Paris", 12.3),
    ("Pālakodu", 27.3),
    ("Reykjavík", 4.3),
    ("San Francisco", 14.6),
    ("São Paulo", 19.7),
    ("Thiruvananthapuram", 27.7),
    ("Tokyo", 15.4),
    ("Ürümqi", 7.4),
    ("Vostok", -55.0),
    ("Wellington", 12.9),
    ("Yakutsk", -8.8),
];

#[derive(Debug, Error)]
pub enum StationError {
    #[error("invalid station line {line:?}")]
    InvalidLine { line: String },

    #[error("no stations to sample from")]
    NoStations,
}

#[derive(Debug, Clone)]
pub struct Station {
    name: String,
    distribution: Normal<f64>,
}

impl Station {
    pub fn new(name: &str, mean: f64) -> Result<Self, StationError> {
        let distribution =
            Normal::new(mean, STD_DEV).map_err(|_| StationError::InvalidLine {
                line: format!("{name};{mean}"),
            })?;

        Ok(Self {
            name: name.to_string(),
            distribution,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.distribution.sample(rng).clamp(MIN_TEMP, MAX_TEMP)
    }
}

impl FromStr for Station {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StationError::InvalidLine {
            line: s.to_string(),
        };

        let (name, mean_str) = s.split_once(';').ok_or_else(invalid)?;
        let mean: f64 = mean_str.trim().parse().map_err(|_| invalid())?;
        if name.is_empty() || !mean.is_finite() {
            return Err(invalid());
        }

        Station::new(name, mean)
    }
}

pub fn builtin_stations() -> Vec<Station> {
    BUILTIN_STATIONS
        .iter()
        .filter_map(|&(name, mean)| Station::new(name, mean).ok())
        .collect()
}

/// Parses `name;mean` lines, skipping blanks and `#` comments.
pub fn parse_stations(text: &str) -> Result<Vec<Station>, StationError> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::parse)
        .collect()
}

pub struct Generator {
    stations: Vec<Station>,
    rng: StdRng,
}

impl Generator {
    /// Seeded generators produce identical output for identical stations.
    pub fn new(stations: Vec<Station>, seed: Option<u64>) -> Result<Self, StationError> {
        if stations.is_empty() {
            return Err(StationError::NoStations);
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self { stations, rng })
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Picks a random station and draws one temperature for it.
    pub fn next_record(&mut self) -> (&str, f64) {
        let station = &self.stations[self.rng.random_range(0..self.stations.len())];
        (station.name(), station.sample(&mut self.rng))
    }

    pub fn write_records<W: Write>(&mut self, count: u64, writer: W) -> io::Result<()> {
        let mut writer = BufWriter::with_capacity(1 << 20, writer);

        for _ in 0..count {
            let (name, temp) = self.next_record();
            writeln!(writer, "{name};{temp:.1}")?;
        }

        writer.flush()
    }
}
