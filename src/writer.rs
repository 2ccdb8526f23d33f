//! Letter-by-letter text reveal, throttled by the simulation clock.

use std::sync::Arc;

use crate::control::{ControlCode, TERMINATOR, TICRATE};

/// How many characters a boosted tick may reveal.
const BOOST_BUDGET: i32 = 8;

/// Default reveal speed applied on reset.
const DEFAULT_SPEED: i32 = 9;

/// Outcome of one reveal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// A delay is pending; nothing was revealed this tick.
    Blocked,
    /// Characters were revealed and more text remains.
    Revealing,
    /// The page's text is fully revealed.
    Complete,
}

/// When a step reports `Complete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Cutscene text: only end-of-source or a literal `'#'` completes.
    TerminatorOnly,
    /// Dialog text: end-of-source completes, and so does a batch that ends
    /// on whitespace with nothing revealable left. Trailing whitespace must
    /// not leave the controller waiting on a phantom "more text" state.
    WhitespaceOrEnd,
}

/// Streams source text into a revealed output buffer, a bounded number of
/// characters per tick, honoring embedded speed and delay directives.
#[derive(Clone, Debug, Default)]
pub struct TextWriter {
    source: Arc<[u8]>,
    read_cursor: usize,
    output: Vec<u8>,
    speed: i32,
    delay: i32,
    boost: bool,
}

impl TextWriter {
    pub fn new() -> Self {
        Self {
            source: Arc::from(&b""[..]),
            read_cursor: 0,
            output: Vec::new(),
            speed: DEFAULT_SPEED,
            delay: 0,
            boost: false,
        }
    }

    /// Assigns new source text and rewinds all reveal state.
    ///
    /// The output buffer is cleared but keeps its capacity; the same writer
    /// is reused across every page of a dialog. The initial delay is a
    /// half-second cinematic lead-in before the first character appears.
    pub fn reset(&mut self, source: Arc<[u8]>) {
        self.source = source;
        self.output.clear();
        self.read_cursor = 0;
        self.speed = DEFAULT_SPEED;
        self.delay = TICRATE / 2;
        self.boost = false;
    }

    /// Overrides the reveal speed level.
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed;
    }

    /// Overrides the pending delay, in ticks.
    pub fn set_delay(&mut self, delay: i32) {
        self.delay = delay;
    }

    /// Arms or clears the per-tick boost flag. The controller clears it at
    /// the top of every tick before deciding whether to re-arm it.
    pub fn set_boost(&mut self, boost: bool) {
        self.boost = boost;
    }

    /// The bytes revealed so far.
    pub fn revealed(&self) -> &[u8] {
        &self.output
    }

    /// True once any source byte has been examined since the last reset.
    /// Gates the hold-to-advance boost so a held button cannot skip an
    /// entire page on the very first tick after a page swap.
    pub fn has_started(&self) -> bool {
        self.read_cursor != 0
    }

    /// Advances the reveal by one simulation tick.
    pub fn step(&mut self, policy: CompletionPolicy) -> StepResult {
        let mut budget = 1;

        if self.boost {
            budget = BOOST_BUDGET;
        } else {
            // Don't reveal anything if the count was 1 or more on entry.
            self.delay -= 1;
            if self.delay >= 0 {
                return StepResult::Blocked;
            }

            if self.speed < 7 {
                budget = BOOST_BUDGET.saturating_sub(self.speed);
            }
        }

        let mut delay_directive_fired = false;
        let mut last_byte = 0u8;

        while budget > 0 {
            let Some(&byte) = self.source.get(self.read_cursor) else {
                return StepResult::Complete;
            };
            if byte == 0 || (policy == CompletionPolicy::TerminatorOnly && byte == TERMINATOR) {
                return StepResult::Complete;
            }

            last_byte = byte;
            self.read_cursor += 1;

            match ControlCode::classify(byte) {
                ControlCode::Speed(level) => self.speed = level,
                ControlCode::Delay(ticks) => {
                    self.delay = ticks;
                    delay_directive_fired = true;
                    budget = 0;
                }
                ControlCode::Markup(markup) => self.output.push(markup),
                ControlCode::Printable(printable) => {
                    self.output.push(printable);
                    budget -= 1;
                }
            }
        }

        // Re-derive the delay for the next tick from the speed level, unless
        // a delay directive already set it this call.
        if !delay_directive_fired && self.delay < 0 {
            self.delay = if self.speed > 7 { self.speed - 7 } else { 0 };
        }

        if policy == CompletionPolicy::WhitespaceOrEnd
            && last_byte.is_ascii_whitespace()
            && !self.has_revealable_remaining()
        {
            return StepResult::Complete;
        }

        StepResult::Revealing
    }

    /// Replays byte classification without tick budgeting or delays until
    /// the output holds `target_len` bytes or the source runs out. Used to
    /// open a dialog already showing part of its text.
    pub fn prefill_to(&mut self, target_len: usize) {
        while self.output.len() < target_len {
            let Some(&byte) = self.source.get(self.read_cursor) else {
                return;
            };
            if byte == 0 || byte == TERMINATOR {
                return;
            }

            self.read_cursor += 1;

            match ControlCode::classify(byte) {
                ControlCode::Speed(_) | ControlCode::Delay(_) => {}
                ControlCode::Markup(markup) => self.output.push(markup),
                ControlCode::Printable(printable) => self.output.push(printable),
            }
        }
    }

    /// True while the source still holds bytes that would reach the output.
    fn has_revealable_remaining(&self) -> bool {
        self.source[self.read_cursor..].iter().any(|&byte| {
            byte != 0
                && matches!(
                    ControlCode::classify(byte),
                    ControlCode::Markup(_) | ControlCode::Printable(_)
                )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{delay_byte, speed_byte};

    fn writer_for(text: &[u8]) -> TextWriter {
        let mut writer = TextWriter::new();
        writer.reset(Arc::from(text));
        writer.set_delay(0);
        writer
    }

    /// Steps until the writer completes, with an iteration guard.
    fn run_to_completion(writer: &mut TextWriter, policy: CompletionPolicy) -> usize {
        for ticks in 0..10_000 {
            if writer.step(policy) == StepResult::Complete {
                return ticks;
            }
        }
        panic!("writer never completed");
    }

    #[test]
    fn fast_speeds_reveal_fixed_batches() {
        for speed in 0..=6 {
            let mut writer = writer_for(b"abcdefghijklmnop");
            writer.set_speed(speed);
            assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
            assert_eq!(
                writer.revealed().len() as i32,
                8 - speed,
                "speed {speed} must reveal exactly {} bytes",
                8 - speed
            );
        }
    }

    #[test]
    fn slow_speeds_reveal_one_byte_then_block() {
        let mut writer = writer_for(b"abcdef");
        writer.set_speed(9);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"a");
        // speed 9 blocks for 9 - 7 = 2 ticks between reveals
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Blocked);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Blocked);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"ab");
    }

    #[test]
    fn speed_directive_costs_no_budget_and_stays_hidden() {
        let mut source = vec![b'a'];
        source.push(speed_byte(0));
        source.extend_from_slice(b"bcdefgh");
        let mut writer = writer_for(&source);
        writer.set_speed(0); // budget 8
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"abcdefgh");
    }

    #[test]
    fn delay_directive_halts_batch_and_blocks() {
        // "AB\xB2CD" at default speed 9: reveals "AB"? No - speed 9 reveals
        // one byte per unblocked tick. Use speed 0 so the delay lands inside
        // one batch.
        let mut source = b"AB".to_vec();
        source.push(delay_byte(2));
        source.extend_from_slice(b"CD");
        let mut writer = writer_for(&source);
        writer.set_speed(0);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"AB");
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Blocked);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Blocked);
        // the final batch writes "CD" and runs into end-of-source in the same call
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Complete);
        assert_eq!(writer.revealed(), b"ABCD");
    }

    #[test]
    fn markup_bytes_are_copied_for_free() {
        let source = [b'a', 0xD5, 0xD6, b'b', b'c', b'd', b'e', b'f', b'g', b'h'];
        let mut writer = writer_for(&source);
        writer.set_speed(0);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        // 8 printable bytes plus 2 free markup bytes in one batch
        assert_eq!(writer.revealed(), &source[..]);
    }

    #[test]
    fn reset_is_idempotent() {
        let source: Arc<[u8]> = Arc::from(&b"hello world"[..]);
        let mut once = TextWriter::new();
        once.reset(source.clone());
        let mut twice = TextWriter::new();
        twice.reset(source.clone());
        twice.reset(source);
        for _ in 0..40 {
            assert_eq!(
                once.step(CompletionPolicy::WhitespaceOrEnd),
                twice.step(CompletionPolicy::WhitespaceOrEnd)
            );
        }
        assert_eq!(once.revealed(), twice.revealed());
    }

    #[test]
    fn reset_applies_lead_in_delay() {
        let mut writer = TextWriter::new();
        writer.reset(Arc::from(&b"abc"[..]));
        // TICRATE/2 = 17 blocked ticks before the first reveal
        for _ in 0..17 {
            assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Blocked);
        }
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
    }

    #[test]
    fn round_trip_strips_directives_and_preserves_order() {
        let mut source = Vec::new();
        source.push(speed_byte(2));
        source.extend_from_slice(b"The quick ");
        source.push(delay_byte(3));
        source.push(0x85); // color markup survives
        source.extend_from_slice(b"brown fox!");
        source.push(speed_byte(12));
        source.extend_from_slice(b" done");

        let mut writer = writer_for(&source);
        run_to_completion(&mut writer, CompletionPolicy::WhitespaceOrEnd);

        let expected: Vec<u8> = source
            .iter()
            .copied()
            .filter(|&byte| {
                matches!(
                    ControlCode::classify(byte),
                    ControlCode::Markup(_) | ControlCode::Printable(_)
                )
            })
            .collect();
        assert_eq!(writer.revealed(), &expected[..]);
    }

    #[test]
    fn terminator_policy_stops_at_hash() {
        let mut writer = writer_for(b"ab#cd");
        writer.set_speed(0);
        assert_eq!(writer.step(CompletionPolicy::TerminatorOnly), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"ab");
        assert_eq!(writer.step(CompletionPolicy::TerminatorOnly), StepResult::Complete);
        // dialog policy treats '#' as ordinary text
        let mut dialog = writer_for(b"ab#cd");
        dialog.set_speed(0);
        dialog.step(CompletionPolicy::WhitespaceOrEnd);
        assert_eq!(dialog.revealed(), b"ab#cd");
    }

    #[test]
    fn trailing_whitespace_completes_on_the_same_tick() {
        // exactly one batch, ending on the trailing space: the budget runs
        // out before end-of-source is seen, but nothing revealable remains
        let mut writer = writer_for(b"1234567 ");
        writer.set_speed(0);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Complete);
        assert_eq!(writer.revealed(), b"1234567 ");
    }

    #[test]
    fn mid_text_whitespace_does_not_complete() {
        // batch of 8 ends exactly on the space; more text remains
        let mut writer = writer_for(b"1234567 89");
        writer.set_speed(0);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Complete);
        assert_eq!(writer.revealed(), b"1234567 89");
    }

    #[test]
    fn boost_reveals_eight_and_skips_delays() {
        let mut writer = writer_for(b"abcdefghij");
        writer.set_speed(15);
        writer.set_delay(5);
        writer.set_boost(true);
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Revealing);
        assert_eq!(writer.revealed(), b"abcdefgh");
    }

    #[test]
    fn prefill_ignores_directives_and_budget() {
        let mut source = b"ab".to_vec();
        source.push(delay_byte(30));
        source.push(speed_byte(15));
        source.extend_from_slice(b"cdef");
        let mut writer = writer_for(&source);
        writer.prefill_to(4);
        assert_eq!(writer.revealed(), b"abcd");
        writer.prefill_to(100);
        assert_eq!(writer.revealed(), b"abcdef");
    }

    #[test]
    fn empty_source_completes_immediately() {
        let mut writer = writer_for(b"");
        assert_eq!(writer.step(CompletionPolicy::WhitespaceOrEnd), StepResult::Complete);
        assert!(!writer.has_started());
    }
}
