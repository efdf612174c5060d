//! Mars Timestamp Types
//!
//! Simulation time is measured in millisols: one thousandth of a Martian
//! solar day. A timestamp carries the scheduler tick alongside the sol and
//! millisol of day.
//!
//! # Example
//!
//! ```
//! use colony_events::MarsTimestamp;
//!
//! let ts = MarsTimestamp::from_millisols(12, 3450.5);
//! assert_eq!(ts.sol, 4);
//! assert_eq!(ts.to_string(), "sol_4.msol_450.500");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// Earth seconds in one millisol.
pub const SECONDS_PER_MILLISOL: f64 = 88.775244;

/// A point in simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarsTimestamp {
    /// Monotonically increasing scheduler tick.
    pub tick: u64,
    /// Sol number, starting at 1.
    pub sol: u32,
    /// Millisols into the current sol, `0.0..1000.0`.
    pub millisol: f64,
}

impl MarsTimestamp {
    /// Creates a timestamp from its parts.
    pub fn new(tick: u64, sol: u32, millisol: f64) -> Self {
        Self { tick, sol, millisol }
    }

    /// Timestamp of the simulation start.
    pub fn start() -> Self {
        Self::new(0, 1, 0.0)
    }

    /// Builds a timestamp from total elapsed millisols since the start.
    pub fn from_millisols(tick: u64, total: f64) -> Self {
        let total = total.max(0.0);
        let sol = (total / MILLISOLS_PER_SOL).floor();
        Self {
            tick,
            sol: sol as u32 + 1,
            millisol: total - sol * MILLISOLS_PER_SOL,
        }
    }

    /// Total millisols elapsed since the simulation start.
    pub fn total_millisols(&self) -> f64 {
        f64::from(self.sol.saturating_sub(1)) * MILLISOLS_PER_SOL + self.millisol
    }
}

impl fmt::Display for MarsTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sol_{}.msol_{:07.3}", self.sol, self.millisol)
    }
}

/// Error type for parsing timestamps from strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTimestampError {
    InvalidFormat(String),
    InvalidSol(String),
    InvalidMillisol(String),
}

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTimestampError::InvalidFormat(s) => {
                write!(f, "invalid timestamp format: '{}', expected 'sol_N.msol_M'", s)
            }
            ParseTimestampError::InvalidSol(s) => write!(f, "invalid sol: '{}'", s),
            ParseTimestampError::InvalidMillisol(s) => write!(f, "invalid millisol: '{}'", s),
        }
    }
}

impl std::error::Error for ParseTimestampError {}

/// Sol and millisol only; the tick is not part of the textual form.
impl FromStr for MarsTimestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sol_part, msol_part) = s
            .split_once('.')
            .ok_or_else(|| ParseTimestampError::InvalidFormat(s.to_string()))?;

        let sol = sol_part
            .strip_prefix("sol_")
            .ok_or_else(|| ParseTimestampError::InvalidFormat(s.to_string()))?
            .parse::<u32>()
            .map_err(|_| ParseTimestampError::InvalidSol(sol_part.to_string()))?;

        let millisol = msol_part
            .strip_prefix("msol_")
            .ok_or_else(|| ParseTimestampError::InvalidFormat(s.to_string()))?
            .parse::<f64>()
            .map_err(|_| ParseTimestampError::InvalidMillisol(msol_part.to_string()))?;

        if !(0.0..MILLISOLS_PER_SOL).contains(&millisol) {
            return Err(ParseTimestampError::InvalidMillisol(msol_part.to_string()));
        }

        Ok(MarsTimestamp::new(0, sol, millisol))
    }
}

#[derive(Serialize, Deserialize)]
struct TimestampRepr {
    tick: u64,
    date: String,
}

// Serialized as {"tick": N, "date": "sol_N.msol_M"}
impl Serialize for MarsTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        TimestampRepr {
            tick: self.tick,
            date: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MarsTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = TimestampRepr::deserialize(deserializer)?;
        let mut ts: MarsTimestamp = repr.date.parse().map_err(serde::de::Error::custom)?;
        ts.tick = repr.tick;
        Ok(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start() {
        let ts = MarsTimestamp::start();
        assert_eq!(ts.tick, 0);
        assert_eq!(ts.sol, 1);
        assert_eq!(ts.millisol, 0.0);
    }

    #[test]
    fn test_from_millisols_rolls_over_sols() {
        let ts = MarsTimestamp::from_millisols(7, 2000.0);
        assert_eq!(ts.sol, 3);
        assert_eq!(ts.millisol, 0.0);
        assert_eq!(ts.total_millisols(), 2000.0);
    }

    #[test]
    fn test_display() {
        let ts = MarsTimestamp::new(0, 12, 45.25);
        assert_eq!(ts.to_string(), "sol_12.msol_045.250");
    }

    #[test]
    fn test_parse() {
        let ts: MarsTimestamp = "sol_12.msol_045.250".parse().unwrap();
        assert_eq!(ts.sol, 12);
        assert!((ts.millisol - 45.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_errors() {
        assert!("garbage".parse::<MarsTimestamp>().is_err());
        assert!("sol_x.msol_1".parse::<MarsTimestamp>().is_err());
        assert!("sol_1.msol_abc".parse::<MarsTimestamp>().is_err());
        assert!("sol_1.msol_1200".parse::<MarsTimestamp>().is_err());
    }

    #[test]
    fn test_serialization() {
        let ts = MarsTimestamp::new(42, 3, 500.0);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#"{"tick":42,"date":"sol_3.msol_500.000"}"#);

        let parsed: MarsTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }
}
