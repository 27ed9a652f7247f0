// =============================================================================
// Shared types used across the channel & signal engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Which detector produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalReason {
    /// Close crossed the LRC midline.
    LrcCross,
    /// Close beyond LRC tier 2 while still inside the inner VWAP band.
    Early,
    /// Close beyond both LRC tier 2 and the inner VWAP band.
    Strong,
    /// Wick beyond LRC tier 3 and the inner VWAP band.
    Super,
}

impl std::fmt::Display for SignalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LrcCross => write!(f, "LRC_CROSS"),
            Self::Early => write!(f, "EARLY"),
            Self::Strong => write!(f, "STRONG"),
            Self::Super => write!(f, "SUPER"),
        }
    }
}

/// A directional signal emitted on a bar close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// Open time of the signalling bar, epoch milliseconds.
    pub time: i64,
    pub side: Side,
    pub reason: SignalReason,
    /// Close of the signalling bar.
    pub price: f64,
    /// Set after merging: whether the previous signal pointed the same way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on: Option<bool>,
}

impl Signal {
    pub fn new(time: i64, side: Side, reason: SignalReason, price: f64) -> Self {
        Self {
            time,
            side,
            reason,
            price,
            add_on: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let mut sig = Signal::new(1_700_000_000_000, Side::Long, SignalReason::LrcCross, 101.5);
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(
            json,
            r#"{"time":1700000000000,"side":"long","reason":"LRC_CROSS","price":101.5}"#
        );

        sig.add_on = Some(true);
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.ends_with(r#""addOn":true}"#));

        let back: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(SignalReason::Super.to_string(), "SUPER");
        assert_eq!(Side::Short.to_string(), "short");
        assert_eq!(Side::Short.opposite(), Side::Long);
    }
}
