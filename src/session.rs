//! Dialog session: players, broadcast dialogs, lifecycle, and ticking.
//!
//! The session is the explicit object replacing any notion of a global
//! "currently active prompt": it owns every dialog instance and the
//! per-player slots referencing them, and is threaded through the host's
//! simulation step. Players are ticked in index order once per simulation
//! step; a broadcast dialog is mutated only by its driving player's tick,
//! so outcomes are deterministic across all participants.

use std::sync::Arc;

use crate::control::TICRATE;
use crate::dialog::{Dialog, TickContext, TickOutcome};
use crate::effects::{SideEffect, SoundCue};
use crate::error::{PromptError, PromptResult};
use crate::layout::{LineWrapper, MonospaceMetrics, PassthroughWrapper, TextMetrics};
use crate::library::{PromptLibrary, TutorialConfig};
use crate::page::{encode_page_text, PageCompiled};
use crate::view::{ChevronState, DialogView, PicView};

/// Index into the session's player table.
pub type PlayerId = usize;

/// Ticks of ignored input granted after a control-locking dialog closes,
/// so a held button doesn't fire an action the instant controls return.
const CLOSE_INPUT_GRACE: u32 = (TICRATE / 4) as u32;

/// Per-player control snapshot for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    /// Confirm/advance is held this tick.
    pub advance_held: bool,
}

/// Options for starting a dialog.
#[derive(Clone, Copy, Debug, Default)]
pub struct StartOptions {
    /// Trigger fired once the dialog fully closes.
    pub exit_trigger: Option<u32>,
    /// Suppress normal player input while the dialog is open.
    pub block_controls: bool,
    /// Share the dialog with every in-game player, driven by the caller.
    pub broadcast: bool,
}

#[derive(Clone, Copy, Debug)]
struct PlayerSlot {
    in_game: bool,
    spectator: bool,
    disconnected: bool,
    dialog: Option<usize>,
    prompt_active: bool,
    /// Set every tick a control-locking dialog covers this player.
    controls_locked: bool,
    input_grace: u32,
}

impl PlayerSlot {
    fn new(in_game: bool) -> Self {
        Self {
            in_game,
            spectator: false,
            disconnected: false,
            dialog: None,
            prompt_active: false,
            controls_locked: false,
            input_grace: 0,
        }
    }

    fn clear_dialog(&mut self) {
        self.dialog = None;
        self.prompt_active = false;
        self.controls_locked = false;
    }
}

/// Owns all dialog state for one simulation.
pub struct DialogSession {
    library: PromptLibrary,
    tutorial: TutorialConfig,
    players: Vec<PlayerSlot>,
    dialogs: Vec<Option<Dialog>>,
    effects: Vec<SideEffect>,
    wrapper: Box<dyn LineWrapper>,
    metrics: Box<dyn TextMetrics>,
    splitscreen: bool,
}

impl DialogSession {
    /// Creates a session for `player_count` players, all initially in-game.
    pub fn new(library: PromptLibrary, player_count: usize) -> Self {
        Self {
            library,
            tutorial: TutorialConfig::default(),
            players: vec![PlayerSlot::new(true); player_count],
            dialogs: Vec::new(),
            effects: Vec::new(),
            wrapper: Box::new(PassthroughWrapper),
            metrics: Box::new(MonospaceMetrics),
            splitscreen: false,
        }
    }

    pub fn with_tutorial(mut self, tutorial: TutorialConfig) -> Self {
        self.tutorial = tutorial;
        self
    }

    pub fn with_wrapper(mut self, wrapper: Box<dyn LineWrapper>) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_metrics(mut self, metrics: Box<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn set_splitscreen(&mut self, splitscreen: bool) {
        self.splitscreen = splitscreen;
    }

    pub fn library(&self) -> &PromptLibrary {
        &self.library
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Marks a player in or out of the game. Out-of-game players are
    /// skipped by broadcasts and ticking.
    pub fn set_in_game(&mut self, player: PlayerId, in_game: bool) -> PromptResult<()> {
        self.slot_mut(player)?.in_game = in_game;
        Ok(())
    }

    pub fn set_spectator(&mut self, player: PlayerId, spectator: bool) -> PromptResult<()> {
        self.slot_mut(player)?.spectator = spectator;
        Ok(())
    }

    pub fn set_disconnected(&mut self, player: PlayerId, disconnected: bool) -> PromptResult<()> {
        self.slot_mut(player)?.disconnected = disconnected;
        Ok(())
    }

    /// Whether a prompt is currently shown to this player.
    pub fn prompt_active(&self, player: PlayerId) -> bool {
        self.players
            .get(player)
            .is_some_and(|slot| slot.prompt_active)
    }

    /// Whether this player's normal controls are suppressed this tick.
    pub fn controls_locked(&self, player: PlayerId) -> bool {
        self.players
            .get(player)
            .is_some_and(|slot| slot.controls_locked)
    }

    /// Remaining post-close input grace, in ticks.
    pub fn input_grace(&self, player: PlayerId) -> u32 {
        self.players.get(player).map_or(0, |slot| slot.input_grace)
    }

    /// Number of choices on the page shown to `player`.
    pub fn choice_count(&self, player: PlayerId) -> usize {
        self.active_page(player).map_or(0, |page| page.choices.len())
    }

    /// Drains the pending side-effect queue, in execution order.
    pub fn take_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Starts a dialog at `(prompt, page)` for a player, or for everyone
    /// when `options.broadcast` is set.
    ///
    /// Invalid indices are not an error: the dialog immediately runs its
    /// close sequence as a forced exit, so a queued exit trigger still
    /// fires even though the page never displayed.
    pub fn start_dialog(
        &mut self,
        player: PlayerId,
        prompt: usize,
        page: usize,
        options: StartOptions,
    ) -> PromptResult<()> {
        self.slot_mut(player)?;

        let prompt_num = (prompt < self.library.prompt_count()).then_some(prompt);
        let page_num =
            prompt_num.and_then(|p| (page < self.library.page_count(p)).then_some(page));

        let mut dialog = Dialog::new(player, options.broadcast);
        dialog.exit_trigger = options.exit_trigger;
        dialog.block_controls = options.block_controls;
        dialog.prompt_num = prompt_num;
        dialog.page_num = page_num;

        let dialog_id = if options.broadcast {
            // a broadcast replaces every running prompt, silently
            self.end_all_dialogs(false, true);
            let id = self.alloc_dialog(dialog);
            for slot in self.players.iter_mut().filter(|slot| slot.in_game) {
                slot.dialog = Some(id);
            }
            id
        } else if let Some(id) = self.players[player].dialog {
            // reuse the player's dialog slot in place
            self.dialogs[id] = Some(dialog);
            id
        } else {
            let id = self.alloc_dialog(dialog);
            self.players[player].dialog = Some(id);
            id
        };

        let target = match (prompt_num, page_num) {
            (Some(prompt), Some(page)) => self.library.page(prompt, page).cloned().map(Arc::new),
            _ => None,
        };

        match target {
            Some(target) => {
                if options.broadcast {
                    for slot in self.players.iter_mut().filter(|slot| slot.in_game) {
                        slot.prompt_active = true;
                    }
                } else {
                    self.players[player].prompt_active = true;
                }

                if let Some(mut dialog) = self.dialogs[dialog_id].take() {
                    let mut ctx = TickContext {
                        library: &self.library,
                        tutorial: &self.tutorial,
                        wrapper: self.wrapper.as_ref(),
                        metrics: self.metrics.as_ref(),
                        effects: &mut self.effects,
                    };
                    dialog.start_page(target, &mut ctx);
                    self.dialogs[dialog_id] = Some(dialog);
                }
            }
            None => {
                // never displayed; run the close sequence with forced effects
                self.end_dialog_by_id(dialog_id, true, false);
            }
        }

        Ok(())
    }

    /// Ends the dialog shown to `player`, if any. The exit trigger fires
    /// iff (the dialog was active OR `force_effects`) AND NOT
    /// `suppress_effects`, and only after all player state is cleared.
    pub fn end_dialog(&mut self, player: PlayerId, force_effects: bool, suppress_effects: bool) {
        let Some(dialog_id) = self.players.get(player).and_then(|slot| slot.dialog) else {
            return;
        };
        self.end_dialog_by_id(dialog_id, force_effects, suppress_effects);
    }

    /// Ends every dialog in the session, including those held by players
    /// who have since left the game.
    pub fn end_all_dialogs(&mut self, force_effects: bool, suppress_effects: bool) {
        for player in 0..self.players.len() {
            self.end_dialog(player, force_effects, suppress_effects);
        }
    }

    /// Ticks every player's dialog in index order and returns the drained
    /// side effects. Call exactly once per simulation step.
    pub fn run_tick(&mut self, inputs: &[PlayerInput]) -> Vec<SideEffect> {
        for player in 0..self.players.len() {
            let input = inputs.get(player).copied().unwrap_or_default();
            self.tick_player(player, input);
        }
        self.take_effects()
    }

    /// Ticks one player. Passengers of a broadcast dialog only receive the
    /// control lock; navigation runs for the driving player alone.
    pub fn tick_player(&mut self, player: PlayerId, input: PlayerInput) {
        let Some(slot) = self.players.get_mut(player) else {
            return;
        };

        if slot.input_grace > 0 {
            slot.input_grace -= 1;
        }
        slot.controls_locked = false;

        if !slot.prompt_active {
            return;
        }
        let Some(dialog_id) = slot.dialog else {
            // reference went stale; recover locally
            slot.prompt_active = false;
            return;
        };

        if slot.spectator || slot.disconnected {
            return;
        }

        let Some(dialog) = self.dialogs.get(dialog_id).and_then(Option::as_ref) else {
            self.players[player].clear_dialog();
            return;
        };
        let block_controls = dialog.block_controls;
        let is_driver = dialog.caller == player;

        if block_controls {
            self.players[player].controls_locked = true;
        }
        if !is_driver {
            return;
        }

        let Some(mut dialog) = self.dialogs[dialog_id].take() else {
            return;
        };
        let mut ctx = TickContext {
            library: &self.library,
            tutorial: &self.tutorial,
            wrapper: self.wrapper.as_ref(),
            metrics: self.metrics.as_ref(),
            effects: &mut self.effects,
        };
        let outcome = dialog.run_tick(input.advance_held, &mut ctx);
        self.dialogs[dialog_id] = Some(dialog);

        if outcome == TickOutcome::Close {
            self.end_dialog_by_id(dialog_id, false, false);
        }
    }

    /// Moves the highlight onto a choice and plays the navigation cue.
    pub fn set_choice(&mut self, player: PlayerId, choice: usize) -> PromptResult<()> {
        let dialog_id = self.active_dialog_id(player)?;
        let Some(dialog) = self.dialogs.get_mut(dialog_id).and_then(Option::as_mut) else {
            return Err(PromptError::NoActiveDialog(player));
        };
        if choice >= dialog.choice_count() {
            return Err(PromptError::ChoiceOutOfRange);
        }
        dialog.cur_choice = choice;
        let caller = dialog.caller;
        self.effects.push(SideEffect::PlayCue {
            cue: SoundCue::Confirm,
            player: caller,
        });
        Ok(())
    }

    /// Highlights a choice and arms confirmation; the choice runs (trigger
    /// first, then navigation) on the driving player's next tick.
    pub fn select_choice(&mut self, player: PlayerId, choice: usize) -> PromptResult<()> {
        let dialog_id = self.active_dialog_id(player)?;
        let Some(dialog) = self.dialogs.get_mut(dialog_id).and_then(Option::as_mut) else {
            return Err(PromptError::NoActiveDialog(player));
        };
        if choice >= dialog.choice_count() {
            return Err(PromptError::ChoiceOutOfRange);
        }
        dialog.cur_choice = choice;
        dialog.selected_choice = true;
        Ok(())
    }

    /// Replaces the current page's text, revealing the first `prefill`
    /// bytes immediately.
    pub fn set_dialog_text(
        &mut self,
        player: PlayerId,
        text: &str,
        prefill: usize,
    ) -> PromptResult<()> {
        let encoded = encode_page_text(text)?;
        let dialog_id = self.active_dialog_id(player)?;
        let Some(mut dialog) = self.dialogs[dialog_id].take() else {
            return Err(PromptError::NoActiveDialog(player));
        };
        let mut ctx = TickContext {
            library: &self.library,
            tutorial: &self.tutorial,
            wrapper: self.wrapper.as_ref(),
            metrics: self.metrics.as_ref(),
            effects: &mut self.effects,
        };
        dialog.set_text(&encoded, prefill, &mut ctx);
        self.dialogs[dialog_id] = Some(dialog);
        Ok(())
    }

    /// Read-only presentation snapshot for a player's dialog, if any.
    pub fn view(&self, player: PlayerId) -> Option<DialogView<'_>> {
        let slot = self.players.get(player)?;
        if !slot.prompt_active {
            return None;
        }
        let dialog = self.dialogs.get(slot.dialog?)?.as_ref()?;
        let page = dialog.page.as_deref()?;

        let picture = dialog.pics.current.and_then(|index| {
            page.pics.get(index).map(|pic| PicView {
                name: &pic.name,
                x: pic.x,
                y: pic.y,
                hires: pic.hires,
            })
        });

        let geometry = crate::layout::page_geometry(page, dialog.longest_choice);
        // the chevron invites a page advance; hidden while anything else
        // wants the player's attention
        let chevron = if dialog.block_controls && dialog.time_to_next == 0 && !dialog.show_choices {
            ChevronState::Visible {
                bob: dialog.chevron_counter / 5,
            }
        } else {
            ChevronState::Hidden
        };

        Some(DialogView {
            revealed: dialog.writer.revealed(),
            speaker: (!page.name.is_empty()).then_some(&*page.name),
            icon: page.icon.as_deref(),
            icon_flip: page.icon_flip,
            back_color: page.back_color,
            picture,
            choices: page.choices.iter().map(|choice| &*choice.text).collect(),
            highlighted: dialog.cur_choice,
            no_choice: dialog.no_choice,
            choices_visible: dialog.show_choices,
            chevron,
            geometry,
        })
    }

    /// HUD-suppression query for a screen coordinate, driven by the page
    /// shown to `player`.
    pub fn hide_hud_at(&self, player: PlayerId, y: i32) -> bool {
        self.active_page(player)
            .is_some_and(|page| crate::layout::hide_hud_at(page, self.splitscreen, y))
    }

    /// Whether the whole HUD is hidden for `player`.
    pub fn hide_hud_all(&self, player: PlayerId) -> bool {
        self.active_page(player)
            .is_some_and(crate::layout::hide_hud_all)
    }

    fn active_page(&self, player: PlayerId) -> Option<&PageCompiled> {
        let slot = self.players.get(player)?;
        if !slot.prompt_active {
            return None;
        }
        self.dialogs.get(slot.dialog?)?.as_ref()?.page.as_deref()
    }

    /// Tears down one dialog instance for every player referencing it.
    fn end_dialog_by_id(&mut self, dialog_id: usize, force_effects: bool, suppress_effects: bool) {
        let Some(dialog) = self.dialogs.get_mut(dialog_id).and_then(Option::take) else {
            return;
        };

        // the caller's slot decides whether the exit trigger fires
        let caller_was_active = self
            .players
            .get(dialog.caller)
            .is_some_and(|slot| slot.prompt_active);

        for slot in &mut self.players {
            if slot.dialog != Some(dialog_id) {
                continue;
            }
            if slot.prompt_active && dialog.block_controls {
                // brief grace so a held button doesn't act immediately
                slot.input_grace = CLOSE_INPUT_GRACE;
            }
            slot.clear_dialog();
        }

        // the instance is gone and every slot is clear; only now may the
        // exit trigger run, so a trigger that starts a new dialog cannot
        // observe stale state
        if (caller_was_active || force_effects) && !suppress_effects {
            if let Some(trigger) = dialog.exit_trigger {
                self.effects.push(SideEffect::ExecuteTrigger {
                    trigger,
                    player: dialog.caller,
                });
            }
        }
    }

    fn active_dialog_id(&self, player: PlayerId) -> PromptResult<usize> {
        let slot = self
            .players
            .get(player)
            .ok_or(PromptError::PlayerOutOfRange(player))?;
        if !slot.prompt_active {
            return Err(PromptError::NoActiveDialog(player));
        }
        slot.dialog.ok_or(PromptError::NoActiveDialog(player))
    }

    fn slot_mut(&mut self, player: PlayerId) -> PromptResult<&mut PlayerSlot> {
        self.players
            .get_mut(player)
            .ok_or(PromptError::PlayerOutOfRange(player))
    }

    fn alloc_dialog(&mut self, dialog: Dialog) -> usize {
        if let Some(free) = self.dialogs.iter().position(Option::is_none) {
            self.dialogs[free] = Some(dialog);
            free
        } else {
            self.dialogs.push(Some(dialog));
            self.dialogs.len() - 1
        }
    }
}
