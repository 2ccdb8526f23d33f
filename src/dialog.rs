//! Per-dialog page/prompt state machine.
//!
//! A dialog owns one text writer and one picture sequencer. Pages are
//! read-only shared data; every navigation swaps the current page in place
//! (writer reset, choice and picture state rebuilt) without recreating the
//! dialog. The session decides who ticks a dialog; this module only runs
//! the driving player's navigation logic.

use crate::control::TICRATE;
use crate::effects::{SideEffect, SoundCue};
use crate::layout::{LineWrapper, TextMetrics};
use crate::library::{PromptLibrary, TutorialConfig};
use std::sync::Arc;

use crate::page::{ChoiceCompiled, PageCompiled, PicMode};
use crate::session::PlayerId;
use crate::writer::{CompletionPolicy, StepResult, TextWriter};

/// Ticks the chevron indicator takes to bob through one cycle.
const CHEVRON_PERIOD: i32 = 8;

/// Default hold-to-advance timer for player-driven pages.
const DEFAULT_HOLD_TICKS: i32 = TICRATE / 10;

/// Default reveal speed for dialog pages without an override.
const DEFAULT_PAGE_SPEED: i32 = TICRATE / 5;

/// What the session must do after ticking a dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Continue,
    /// Navigation ran out of pages; the session closes the dialog.
    Close,
}

/// Read-only collaborators threaded through the tick call graph.
pub(crate) struct TickContext<'a> {
    pub library: &'a PromptLibrary,
    pub tutorial: &'a TutorialConfig,
    pub wrapper: &'a dyn LineWrapper,
    pub metrics: &'a dyn TextMetrics,
    pub effects: &'a mut Vec<SideEffect>,
}

/// Picture sequencing state rebuilt on every page enter.
#[derive(Clone, Debug, Default)]
pub(crate) struct PictureState {
    /// Index of the displayed picture; `None` once destroyed.
    pub current: Option<usize>,
    pub timer: u32,
    pub loop_to: usize,
    pub mode: PicMode,
}

/// One active, navigable run of prompt/page content.
#[derive(Debug)]
pub(crate) struct Dialog {
    pub prompt_num: Option<usize>,
    pub page_num: Option<usize>,
    /// Shared handle to the current page definition.
    pub page: Option<Arc<PageCompiled>>,
    pub writer: TextWriter,
    /// Player-driven pages: ticks before boost is permitted, 0 once the
    /// reveal is finished. Timed pages: ticks until auto-advance.
    pub time_to_next: i32,
    pub block_controls: bool,
    pub exit_trigger: Option<u32>,
    /// The originating player; the only one whose tick drives navigation.
    pub caller: PlayerId,
    pub broadcast: bool,
    pub cur_choice: usize,
    pub no_choice: Option<usize>,
    pub show_choices: bool,
    pub selected_choice: bool,
    pub longest_choice: i32,
    pub pics: PictureState,
    pub chevron_counter: i32,
}

impl Dialog {
    pub fn new(caller: PlayerId, broadcast: bool) -> Self {
        Self {
            prompt_num: None,
            page_num: None,
            page: None,
            writer: TextWriter::new(),
            time_to_next: 0,
            block_controls: false,
            exit_trigger: None,
            caller,
            broadcast,
            cur_choice: 0,
            no_choice: None,
            show_choices: false,
            selected_choice: false,
            longest_choice: 0,
            pics: PictureState::default(),
            chevron_counter: 0,
        }
    }

    pub fn choice_count(&self) -> usize {
        self.page.as_ref().map_or(0, |page| page.choices.len())
    }

    /// Wraps and assigns page text, optionally prefilled to `prefill` bytes
    /// of already-revealed output.
    pub fn set_text(&mut self, text: &[u8], prefill: usize, ctx: &mut TickContext<'_>) {
        let Some(page) = self.page.as_ref() else {
            return;
        };
        let geometry = crate::layout::page_geometry(page, self.longest_choice);
        let wrapped = ctx.wrapper.wrap(geometry.text_x, geometry.text_right, text);

        self.writer.reset(wrapped.into());
        let speed = if page.text_speed != 0 {
            page.text_speed
        } else {
            DEFAULT_PAGE_SPEED
        };
        self.writer.set_speed(speed);
        // no cinematic lead-in inside a dialog
        self.writer.set_delay(0);
        self.writer.set_boost(false);

        if prefill > 0 {
            self.writer.prefill_to(prefill);
        }
    }

    /// Enters the given page: writer, choices, pictures, music.
    pub fn start_page(&mut self, page: Arc<PageCompiled>, ctx: &mut TickContext<'_>) {
        // a page-level lock sticks for the rest of the dialog
        if page.lock_controls {
            self.block_controls = true;
        }
        // player-driven pages get a short hold delay before boost applies
        self.time_to_next = if page.time_to_next != 0 {
            page.time_to_next as i32
        } else {
            DEFAULT_HOLD_TICKS
        };

        if page.choices.is_empty() {
            self.cur_choice = 0;
            self.no_choice = None;
            self.longest_choice = 0;
        } else {
            let last = page.choices.len() - 1;
            self.cur_choice = page.start_choice.unwrap_or(0).min(last);
            self.no_choice = page.no_choice.map(|choice| choice.min(last));
            self.longest_choice = page
                .choices
                .iter()
                .map(|choice| ctx.metrics.string_width(choice.text.as_bytes()))
                .max()
                .unwrap_or(0);
        }
        self.show_choices = false;
        self.selected_choice = false;

        if page.pics.is_empty() {
            self.pics = PictureState::default();
        } else {
            let last = page.pics.len() - 1;
            let start = page.pic_start.min(last);
            self.pics = PictureState {
                current: Some(start),
                timer: page.pics[start].duration,
                loop_to: page.pic_loop.min(last),
                mode: page.pic_mode,
            };
        }

        if let Some(music) = &page.music {
            ctx.effects.push(SideEffect::ChangeMusic {
                track: music.track.clone(),
                flags: music.flags,
                looping: music.looping,
            });
        }

        let text = page.text.clone();
        self.page = Some(page);
        self.set_text(&text, 0, ctx);
    }

    /// One simulation tick for the driving player.
    pub fn run_tick(&mut self, advance_held: bool, ctx: &mut TickContext<'_>) -> TickOutcome {
        self.chevron_counter -= 1;
        if self.chevron_counter <= 0 {
            self.chevron_counter = CHEVRON_PERIOD;
        }

        self.writer.set_boost(false);

        let Some(page) = self.page.clone() else {
            return TickOutcome::Close;
        };

        if page.time_to_next != 0 {
            // timed page: same reveal procedure, no button handling
            if self.time_to_next >= 1 {
                self.time_to_next -= 1;
            }
            if self.time_to_next == 0 {
                return self.advance_to_next_page(&page, ctx);
            }
            if self.writer.step(CompletionPolicy::WhitespaceOrEnd) == StepResult::Revealing {
                self.push_text_cue(&page, ctx);
            }
        } else {
            if self.block_controls {
                if self.show_choices {
                    if self.selected_choice {
                        self.selected_choice = false;
                        ctx.effects.push(SideEffect::PlayCue {
                            cue: SoundCue::Confirm,
                            player: self.caller,
                        });
                        let choice = page.choices[self.cur_choice].clone();
                        return self.execute_choice(&choice, ctx);
                    }
                } else if advance_held {
                    if self.time_to_next > 1 {
                        self.time_to_next -= 1;
                    } else if self.writer.has_started() {
                        // never boost on the very first tick after a page
                        // reset, or a held button skips the whole page
                        self.writer.set_boost(true);
                    }

                    // time_to_next reaches 0 once the text finished revealing
                    if self.time_to_next == 0 && !self.show_choices {
                        let outcome = self.advance_to_next_page(&page, ctx);
                        if outcome == TickOutcome::Continue {
                            ctx.effects.push(SideEffect::PlayCue {
                                cue: SoundCue::Confirm,
                                player: self.caller,
                            });
                        }
                        return outcome;
                    }
                }
            }

            // pages with nothing to reveal skip straight to the advance gate
            if page.text_is_empty() {
                self.time_to_next = i32::from(!self.block_controls);
            }

            match self.writer.step(CompletionPolicy::WhitespaceOrEnd) {
                StepResult::Revealing => self.push_text_cue(&page, ctx),
                StepResult::Blocked => {}
                StepResult::Complete => {
                    if self.block_controls && !self.show_choices && !page.choices.is_empty() {
                        self.show_choices = true;
                    }
                    self.time_to_next = i32::from(!self.block_controls);
                }
            }
        }

        self.update_pics(&page);
        TickOutcome::Continue
    }

    /// Resolves the page's own navigation targets and loads the result.
    fn advance_to_next_page(&mut self, page: &PageCompiled, ctx: &mut TickContext<'_>) -> TickOutcome {
        let (next_prompt, next_page) = resolve_targets(
            page.next_prompt,
            page.next_page,
            page.next_tag.as_deref(),
            ctx.library,
            ctx.tutorial,
        );
        self.load_page(next_prompt, next_page, ctx)
    }

    /// Runs a confirmed choice: its trigger first, then its navigation.
    /// The trigger fires even when the navigation closes the dialog.
    fn execute_choice(&mut self, choice: &ChoiceCompiled, ctx: &mut TickContext<'_>) -> TickOutcome {
        if let Some(trigger) = choice.exec_trigger {
            ctx.effects.push(SideEffect::ExecuteTrigger {
                trigger,
                player: self.caller,
            });
        }
        let (next_prompt, next_page) = resolve_targets(
            choice.next_prompt,
            choice.next_page,
            choice.next_tag.as_deref(),
            ctx.library,
            ctx.tutorial,
        );
        self.load_page(next_prompt, next_page, ctx)
    }

    /// Applies a resolved `(prompt, page)` transition. `None` targets keep
    /// the current prompt and fall through to the next sequential page; an
    /// out-of-range target unsets the slot, which closes the dialog.
    fn load_page(
        &mut self,
        next_prompt: Option<usize>,
        next_page: Option<usize>,
        ctx: &mut TickContext<'_>,
    ) -> TickOutcome {
        let old_prompt = self.prompt_num;

        if let Some(prompt) = next_prompt {
            self.prompt_num = (prompt < ctx.library.prompt_count()).then_some(prompt);
        }

        if let Some(target) = next_page {
            if let Some(prompt) = self.prompt_num {
                self.page_num = (target < ctx.library.page_count(prompt)).then_some(target);
            }
        } else if let Some(prompt) = self.prompt_num {
            if old_prompt != self.prompt_num {
                self.page_num = Some(0);
            } else {
                self.page_num = match self.page_num {
                    Some(page) if page + 1 < ctx.library.page_count(prompt) => Some(page + 1),
                    _ => None,
                };
            }
        }

        let resolved = match (self.prompt_num, self.page_num) {
            (Some(prompt), Some(page)) => ctx.library.page(prompt, page).cloned(),
            _ => None,
        };
        match resolved {
            Some(page) => {
                self.start_page(Arc::new(page), ctx);
                TickOutcome::Continue
            }
            None => TickOutcome::Close,
        }
    }

    fn push_text_cue(&self, page: &PageCompiled, ctx: &mut TickContext<'_>) {
        if let Some(cue) = page.text_cue {
            ctx.effects.push(SideEffect::PlayCue {
                cue: SoundCue::Text(cue),
                player: self.caller,
            });
        }
    }

    /// Advances the picture sequencer by one tick.
    fn update_pics(&mut self, page: &PageCompiled) {
        let Some(current) = self.pics.current else {
            return;
        };
        if page.pics.is_empty() || current >= page.pics.len() {
            return;
        }

        if self.pics.timer == 0 {
            let mut freeze_timer = false;

            // an empty-named frame ends the sequence early
            let next = current + 1;
            if next < page.pics.len() && !page.pics[next].name.is_empty() {
                self.pics.current = Some(next);
            } else {
                match self.pics.mode {
                    PicMode::Loop => self.pics.current = Some(self.pics.loop_to),
                    PicMode::Destroy => self.pics.current = None,
                    PicMode::Persist => freeze_timer = true,
                }
            }

            if !freeze_timer {
                if let Some(next) = self.pics.current {
                    self.pics.timer = page.pics[next].duration;
                }
            }
        } else {
            self.pics.timer -= 1;
        }
    }
}

/// Target precedence: a named tag, when it resolves, overrides both numeric
/// targets; an unresolved tag leaves the numeric targets in effect.
fn resolve_targets(
    next_prompt: Option<usize>,
    next_page: Option<usize>,
    next_tag: Option<&str>,
    library: &PromptLibrary,
    tutorial: &TutorialConfig,
) -> (Option<usize>, Option<usize>) {
    if let Some(tag) = next_tag {
        if let Some((prompt, page)) = library.resolve_named_tag(tag, tutorial) {
            return (Some(prompt), Some(page));
        }
    }
    (next_prompt, next_page)
}
