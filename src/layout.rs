//! Text-box geometry and HUD suppression.
//!
//! All coordinates are in the 320x200 base resolution the renderer scales
//! from. Word wrapping and glyph measurement belong to the renderer; they
//! sit behind the `LineWrapper` and `TextMetrics` seams with conservative
//! defaults good enough for tests and headless hosts.

use crate::page::{HideHud, PageCompiled};

pub const BASE_WIDTH: i32 = 320;
pub const BASE_HEIGHT: i32 = 200;

/// Default page height in lines when the page doesn't specify one.
const DEFAULT_PAGE_LINES: i32 = 4;

/// Measures rendered string widths.
pub trait TextMetrics {
    fn string_width(&self, text: &[u8]) -> i32;
}

/// Fixed-advance fallback: 8 pixels per visible byte, control bytes free.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonospaceMetrics;

impl TextMetrics for MonospaceMetrics {
    fn string_width(&self, text: &[u8]) -> i32 {
        text.iter().filter(|&&byte| byte < 0x80).count() as i32 * 8
    }
}

/// Inserts line breaks into a control-code byte stream so it fits between
/// the given horizontal bounds. Directive bytes must be preserved.
pub trait LineWrapper {
    fn wrap(&self, left: i32, right: i32, text: &[u8]) -> Vec<u8>;
}

/// No-op wrapper for hosts that pre-wrap their text.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughWrapper;

impl LineWrapper for PassthroughWrapper {
    fn wrap(&self, _left: i32, _right: i32, text: &[u8]) -> Vec<u8> {
        text.to_vec()
    }
}

/// Rectangle in base-resolution coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Where everything on a page goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageGeometry {
    pub page_lines: i32,
    pub right_side: bool,
    pub box_height: i32,
    pub text_height: i32,
    pub text_y: i32,
    pub name_y: i32,
    pub chevron_y: i32,
    pub text_x: i32,
    pub text_right: i32,
    pub choices_x: i32,
    pub choices_y: i32,
    pub choices_box: Rect,
}

/// Height in pixels of a text box `lines` rows tall.
fn box_pixels(lines: i32) -> i32 {
    (lines * 4) + (lines / 2) * 4
}

/// Computes the layout for a page. `longest_choice` is the widest choice
/// label in pixels, as measured by the host's metrics.
pub fn page_geometry(page: &PageCompiled, longest_choice: i32) -> PageGeometry {
    let page_lines = if page.lines != 0 {
        i32::from(page.lines)
    } else {
        DEFAULT_PAGE_LINES
    };
    let has_icon = page.icon.is_some();
    let right_side = has_icon && page.right_side;

    let box_height = page_lines * 2;
    // the speaker name takes up the first line when present
    let text_height = if page.name.is_empty() {
        page_lines * 2
    } else {
        (page_lines - 1) * 2
    };
    let name_y = BASE_HEIGHT - box_pixels(box_height);

    // shift text right of a left-side icon, with a 4px margin
    let text_x = if has_icon && !right_side {
        box_pixels(box_height) + 4
    } else {
        4
    };
    let text_right = if right_side {
        BASE_WIDTH - (box_pixels(box_height) + 4)
    } else {
        BASE_WIDTH - 4
    };

    let mut geometry = PageGeometry {
        page_lines,
        right_side,
        box_height,
        text_height,
        text_y: BASE_HEIGHT - box_pixels(text_height),
        name_y,
        chevron_y: BASE_HEIGHT - box_pixels(2), // forced onto the last line
        text_x,
        text_right,
        choices_x: 0,
        choices_y: 0,
        choices_box: Rect::default(),
    };

    if !page.choices.is_empty() {
        let spacing = 4;
        let choices_w = (longest_choice + 16) + spacing * 2;
        let choices_h = page.choices.len() as i32 * 10 + spacing * 2;
        let choices_x = if page.choices_left_side {
            16
        } else {
            (BASE_WIDTH - 8) - choices_w
        };
        let choices_y = name_y - 8 - choices_h;

        geometry.choices_box = Rect {
            x: choices_x,
            y: choices_y,
            w: choices_w,
            h: choices_h,
        };
        geometry.choices_x = choices_x + spacing;
        geometry.choices_y = choices_y + spacing;
    }

    geometry
}

/// Vertical bound below which the HUD should be suppressed, or 0 for none.
/// Negative values measure up from the bottom of the screen.
pub fn hide_hud_bound(page: &PageCompiled, splitscreen: bool) -> i32 {
    match page.hide_hud {
        HideHud::None => 0,
        // don't hide on splitscreen unless hiding everything is forced
        HideHud::Hud if splitscreen => 0,
        HideHud::All => BASE_HEIGHT,
        HideHud::Hud => {
            let geometry = page_geometry(page, 0);
            // box height plus gaps between rows and some leeway
            let box_h = (geometry.box_height * 4) + (geometry.box_height / 2) * 5;
            -box_h
        }
    }
}

/// Whether a HUD element at vertical coordinate `y` should be hidden.
pub fn hide_hud_at(page: &PageCompiled, splitscreen: bool, y: i32) -> bool {
    let bound = hide_hud_bound(page, splitscreen);
    if bound == 0 {
        return false;
    }
    if bound >= 0 {
        y < bound
    } else {
        y >= BASE_HEIGHT + bound
    }
}

/// Whether the page hides the entire HUD. Splitscreen only suppresses the
/// partial mode, which never hides everything anyway.
pub fn hide_hud_all(page: &PageCompiled) -> bool {
    page.hide_hud == HideHud::All
}
