use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLC(V) bar. Serialised with the compact `t/o/h/l/c/v` keys the
/// chart front end and the kline proxy exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, epoch milliseconds.
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Representative price `(high + low + close) / 3`.
    pub fn hlc3(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check every candle invariant the indicators rely on.
///
/// Fails on the first offending bar:
/// - any non-finite price or volume
/// - `high < low`
/// - open or close outside `[low, high]`
/// - negative volume
/// - open time not strictly increasing
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    let mut previous: Option<i64> = None;

    for (index, c) in candles.iter().enumerate() {
        for (field, value) in [
            ("open", c.open),
            ("high", c.high),
            ("low", c.low),
            ("close", c.close),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteValue { index, field });
            }
        }

        if c.high < c.low {
            return Err(ValidationError::HighBelowLow {
                index,
                high: c.high,
                low: c.low,
            });
        }

        let body_hi = c.open.max(c.close);
        let body_lo = c.open.min(c.close);
        if body_hi > c.high || body_lo < c.low {
            return Err(ValidationError::OpenCloseOutsideRange { index });
        }

        if let Some(v) = c.volume {
            if !v.is_finite() {
                return Err(ValidationError::NonFiniteValue {
                    index,
                    field: "volume",
                });
            }
            if v < 0.0 {
                return Err(ValidationError::NegativeVolume { index, volume: v });
            }
        }

        if let Some(prev) = previous {
            if c.open_time <= prev {
                return Err(ValidationError::NonMonotonicTime {
                    index,
                    previous: prev,
                    current: c.open_time,
                });
            }
        }
        previous = Some(c.open_time);
    }

    Ok(())
}

/// Close prices, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(t: i64, low: f64, high: f64, close: f64) -> Candle {
        Candle::new(t, close, high, low, close)
    }

    #[test]
    fn deserialises_compact_keys_without_volume() {
        let json = r#"{"t":1700000000000,"o":1.0,"h":2.0,"l":0.5,"c":1.5}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.open_time, 1_700_000_000_000);
        assert_eq!(c.volume, None);
        assert!((c.hlc3() - (2.0 + 0.5 + 1.5) / 3.0).abs() < 1e-12);

        let back = serde_json::to_string(&c).unwrap();
        assert!(!back.contains("\"v\""));
    }

    #[test]
    fn valid_series_passes() {
        let candles = vec![
            bar(1_000, 9.0, 11.0, 10.0),
            bar(2_000, 10.0, 12.0, 11.0).with_volume(5.0),
            bar(3_000, 8.0, 10.0, 9.0).with_volume(0.0),
        ];
        assert!(validate_candles(&candles).is_ok());
        assert!(validate_candles(&[]).is_ok());
    }

    #[test]
    fn rejects_high_below_low() {
        let candles = vec![Candle::new(1, 10.0, 9.0, 11.0, 10.0)];
        assert!(matches!(
            validate_candles(&candles),
            Err(ValidationError::HighBelowLow { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_close_outside_range() {
        let candles = vec![Candle::new(1, 10.0, 11.0, 9.0, 12.0)];
        assert_eq!(
            validate_candles(&candles),
            Err(ValidationError::OpenCloseOutsideRange { index: 0 })
        );
    }

    #[test]
    fn rejects_repeated_timestamp() {
        let candles = vec![bar(5, 9.0, 11.0, 10.0), bar(5, 9.0, 11.0, 10.0)];
        assert_eq!(
            validate_candles(&candles),
            Err(ValidationError::NonMonotonicTime {
                index: 1,
                previous: 5,
                current: 5,
            })
        );
    }

    #[test]
    fn rejects_negative_volume_and_nan() {
        let candles = vec![bar(1, 9.0, 11.0, 10.0).with_volume(-1.0)];
        assert!(matches!(
            validate_candles(&candles),
            Err(ValidationError::NegativeVolume { index: 0, .. })
        ));

        let candles = vec![bar(1, 9.0, f64::NAN, 10.0)];
        assert_eq!(
            validate_candles(&candles),
            Err(ValidationError::NonFiniteValue {
                index: 0,
                field: "high"
            })
        );
    }
}
