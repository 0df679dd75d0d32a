use serde::{Deserialize, Serialize};

use super::Variant;

/// Host-supplied configuration for a game.
///
/// The options double as the game's win bookkeeping: a finished game
/// records its winner and the reason there, and a host can seed a loaded
/// game by constructing options with `finished` already set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameOptions {
    pub variant: Variant,
    /// Seed for the RNG behind [`Variant::Random`]. Identical options
    /// produce identical setups.
    pub seed: u64,
    pub time: Option<TimeControl>,
    pub finished: bool,
    /// `0` for Black, `1` for White, `-1` for a drawn result.
    pub winner: Option<i8>,
    pub win_cause: Option<u8>,
    pub win_reason: Option<WinReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeControl {
    /// Starting time per side, in milliseconds, indexed by [`crate::board::Side`].
    pub start: [u64; 2],
    pub running_clocks: bool,
    pub running_clock_time: Option<u64>,
    pub running_clock_grace_time: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinReason {
    Checkmate,
    Stalemate,
    Resign,
    Timeout,
    Draw,
}

/// External clock collaborator, driven by the engine around `submit`.
///
/// The engine never measures time itself; a host that wants clocks
/// implements this trait and hands it to the game, which stops the
/// mover's clock when a turn is submitted and starts the opponent's.
pub trait Clock {
    /// Starts timing the side about to move. The skip amounts let a host
    /// discount grace or lag time already spent.
    fn start_time(&mut self, skip_grace_amount: Option<u64>, skip_amount: Option<u64>);

    /// Stops the running clock and reports the elapsed milliseconds.
    fn stop_time(&mut self) -> u64;

    /// Adjusts the stored remaining time, e.g. from a remote authority.
    fn update_time(&mut self, ms: u64);
}

/// Result of a `submit` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub submitted: bool,
    /// Milliseconds the submitting player spent, when a clock is
    /// attached.
    pub elapsed_ms: Option<u64>,
    /// Cap on the time the submitting player may gain back, from the
    /// running-clock configuration.
    pub time_gained_cap: Option<u64>,
}

impl SubmitOutcome {
    pub(crate) fn rejected() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn options_serialize_camel_case() {
        let options = GameOptions {
            variant: Variant::NoQueens,
            seed: 7,
            time: Some(TimeControl {
                start: [300_000, 300_000],
                running_clocks: true,
                running_clock_time: Some(20_000),
                running_clock_grace_time: Some(2_000),
            }),
            finished: false,
            winner: None,
            win_cause: None,
            win_reason: None,
        };

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["variant"], "no-queens");
        assert_eq!(json["time"]["runningClockTime"], 20_000);
        assert_eq!(json["winReason"], serde_json::Value::Null);
    }

    #[test]
    fn options_round_trip() {
        let options = GameOptions {
            variant: Variant::Random,
            seed: 42,
            finished: true,
            winner: Some(-1),
            win_reason: Some(WinReason::Draw),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: GameOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let options: GameOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.variant, Variant::Standard);
        assert!(!options.finished);
        assert_eq!(options.time, None);
    }

    #[test]
    fn win_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&WinReason::Checkmate).unwrap(),
            "\"checkmate\""
        );
        assert_eq!(
            serde_json::from_str::<WinReason>("\"stalemate\"").unwrap(),
            WinReason::Stalemate
        );
    }
}
