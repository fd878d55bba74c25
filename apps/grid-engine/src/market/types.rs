//! Market data types shared across the engine.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::MarketDataError;

/// One interval's OHLCV summary of price activity.
///
/// Bar sequences are ordered ascending by `open_time` with no duplicate
/// timestamps; gaps are permitted and never auto-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, milliseconds since the Unix epoch.
    pub open_time: i64,
    /// Opening price.
    pub open: Decimal,
    /// Highest price within the interval.
    pub high: Decimal,
    /// Lowest price within the interval.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Decimal,
}

/// Supported kline intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    /// One minute.
    #[serde(rename = "1m")]
    OneMinute,
    /// Five minutes.
    #[serde(rename = "5m")]
    FiveMinutes,
    /// Fifteen minutes.
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// Four hours.
    #[serde(rename = "4h")]
    FourHours,
    /// One day.
    #[serde(rename = "1d")]
    OneDay,
}

impl KlineInterval {
    /// Exchange wire name of the interval.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }

    /// Fixed annualization constant: bars per calendar year.
    ///
    /// Crypto markets trade continuously, so the table uses full
    /// calendar coverage (365 days, 24 hours). The Sharpe ratio of a run
    /// is scaled by the square root of this value; the table never
    /// changes between runs so results stay comparable.
    #[must_use]
    pub const fn bars_per_year(&self) -> u64 {
        match self {
            Self::OneMinute => 525_600,
            Self::FiveMinutes => 105_120,
            Self::FifteenMinutes => 35_040,
            Self::OneHour => 8_760,
            Self::FourHours => 2_190,
            Self::OneDay => 365,
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::OneMinute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1h" => Ok(Self::OneHour),
            "4h" => Ok(Self::FourHours),
            "1d" => Ok(Self::OneDay),
            other => Err(MarketDataError::UnknownInterval(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_round_trips_through_str() {
        for interval in [
            KlineInterval::OneMinute,
            KlineInterval::FiveMinutes,
            KlineInterval::FifteenMinutes,
            KlineInterval::OneHour,
            KlineInterval::FourHours,
            KlineInterval::OneDay,
        ] {
            assert_eq!(interval.as_str().parse::<KlineInterval>().unwrap(), interval);
        }
    }

    #[test]
    fn unknown_interval_is_rejected() {
        assert!(matches!(
            "3w".parse::<KlineInterval>(),
            Err(MarketDataError::UnknownInterval(_))
        ));
    }

    #[test]
    fn hourly_annualization_is_calendar_hours() {
        assert_eq!(KlineInterval::OneHour.bars_per_year(), 24 * 365);
    }

    #[test]
    fn interval_serde_uses_wire_names() {
        let json = serde_json::to_string(&KlineInterval::FourHours).unwrap();
        assert_eq!(json, "\"4h\"");
        let back: KlineInterval = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(back, KlineInterval::OneDay);
    }
}
