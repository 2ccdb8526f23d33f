//! Deterministic tick-driven text prompt engine.
//!
//! Drives letter-by-letter text reveal, paginated narrative content,
//! branching player choices, and inline speed/delay/color control codes,
//! synchronized to a fixed-tick simulation clock. All side effects are
//! emitted as an ordered command queue, so every participant in a shared
//! simulation observes identical behavior.

mod control;
mod dialog;
mod effects;
mod error;
mod layout;
mod library;
mod page;
mod resource;
mod session;
mod view;
mod writer;

pub use control::{delay_byte, speed_byte, ControlCode, TICRATE};
pub use effects::{SideEffect, SoundCue};
pub use error::{PromptError, PromptResult};
pub use layout::{
    hide_hud_all, hide_hud_at, hide_hud_bound, page_geometry, LineWrapper, MonospaceMetrics,
    PageGeometry, PassthroughWrapper, Rect, TextMetrics, BASE_HEIGHT, BASE_WIDTH,
};
pub use library::{
    ControlScheme, PromptBookRaw, PromptLibrary, TutorialConfig, BOOK_SCHEMA_VERSION,
};
pub use page::{
    encode_page_text, ChoiceCompiled, ChoiceRaw, HideHud, MusicSwitchCompiled, MusicSwitchRaw,
    PageCompiled, PageRaw, PicCompiled, PicMode, PicRaw, PromptCompiled, PromptRaw, SharedBytes,
    SharedStr,
};
pub use resource::ResourceLimits;
pub use session::{DialogSession, PlayerId, PlayerInput, StartOptions};
pub use view::{ChevronState, DialogView, PicView};
pub use writer::{CompletionPolicy, StepResult, TextWriter};
