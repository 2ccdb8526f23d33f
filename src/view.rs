//! Read-only presentation snapshots for renderers.
//!
//! A renderer reads one `DialogView` per frame and draws it; nothing here
//! mutates engine state, and nothing the renderer does can desync the
//! simulation.

use crate::layout::PageGeometry;

/// Current picture frame and placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PicView<'a> {
    pub name: &'a str,
    pub x: i32,
    pub y: i32,
    pub hires: bool,
}

/// The advance-page chevron, bobbing while the page waits on the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChevronState {
    Hidden,
    Visible { bob: i32 },
}

/// Everything a renderer needs to draw one player's dialog.
#[derive(Clone, Debug)]
pub struct DialogView<'a> {
    /// Revealed text bytes, including color markup, excluding directives.
    pub revealed: &'a [u8],
    pub speaker: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub icon_flip: bool,
    pub back_color: i32,
    pub picture: Option<PicView<'a>>,
    pub choices: Vec<&'a str>,
    pub highlighted: usize,
    /// Choice the host treats as "no selection" on a cancel input.
    pub no_choice: Option<usize>,
    pub choices_visible: bool,
    pub chevron: ChevronState,
    pub geometry: PageGeometry,
}
