//! Side-effect commands emitted by the session.
//!
//! The engine never touches audio or trigger execution directly; it appends
//! commands to an ordered queue that the host drains after each call. The
//! queue order is part of the determinism contract: a choice's trigger is
//! always queued before any navigation effect it causes, and a dialog's
//! exit trigger is queued only after every per-player slot is cleared.

use crate::page::SharedStr;
use crate::session::PlayerId;

/// A sound cue decision. Mixing and "local player only" filtering are the
/// host's concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    /// Menu navigation / page confirmation blip.
    Confirm,
    /// Per-page text reveal cue, by id.
    Text(u32),
}

/// One deferred side effect, in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SideEffect {
    /// Fire a map/script trigger on behalf of a player.
    ExecuteTrigger { trigger: u32, player: PlayerId },
    /// Play a sound cue attributed to a player.
    PlayCue { cue: SoundCue, player: PlayerId },
    /// Switch the music track.
    ChangeMusic {
        track: SharedStr,
        flags: u16,
        looping: bool,
    },
}
