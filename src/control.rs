//! Control-code classification for prompt text streams.
//!
//! Page text is a byte stream mixing printable characters with embedded
//! directive bytes. The reveal loop never does range arithmetic itself; it
//! consumes the tagged variants produced here.

/// Simulation ticks per second.
pub const TICRATE: i32 = 35;

/// First byte of the speed-directive range.
pub const SPEED_BASE: u8 = 0xA0;
/// Number of distinct speed levels.
pub const SPEED_COUNT: u8 = 16;
/// First byte of the delay-directive range.
pub const DELAY_BASE: u8 = 0xB0;

/// Page terminator byte honored by the cutscene completion policy.
pub const TERMINATOR: u8 = b'#';

/// One classified unit of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCode {
    /// Sets the reveal speed level (0..=15, lower is faster).
    Speed(i32),
    /// Pauses the reveal for the given number of ticks (0..=TICRATE-1).
    Delay(i32),
    /// Color or other markup; copied through without costing budget.
    Markup(u8),
    /// An ordinary visible byte.
    Printable(u8),
}

impl ControlCode {
    /// Classifies a single source byte.
    pub fn classify(byte: u8) -> Self {
        if (SPEED_BASE..SPEED_BASE + SPEED_COUNT).contains(&byte) {
            ControlCode::Speed(i32::from(byte - SPEED_BASE))
        } else if (DELAY_BASE..DELAY_BASE + TICRATE as u8).contains(&byte) {
            ControlCode::Delay(i32::from(byte - DELAY_BASE))
        } else if byte >= 0x80 {
            ControlCode::Markup(byte)
        } else {
            ControlCode::Printable(byte)
        }
    }
}

/// Builds a speed directive byte for the given level, clamped to the range.
pub fn speed_byte(level: u8) -> u8 {
    SPEED_BASE + level.min(SPEED_COUNT - 1)
}

/// Builds a delay directive byte pausing for `ticks`, clamped to the range.
pub fn delay_byte(ticks: u8) -> u8 {
    DELAY_BASE + ticks.min(TICRATE as u8 - 1)
}
