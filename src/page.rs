//! Prompt, page, choice, and picture definitions.
//!
//! Raw types are the JSON-facing authoring format; compiled types intern
//! their strings and encode page text into the byte stream the writer
//! consumes. Compiled pages are shared, read-only data: dialogs hold
//! references into the library and never mutate them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, PromptResult};

/// Shared string storage used by compiled prompt data.
pub type SharedStr = Arc<str>;

/// Shared byte storage for compiled page text.
pub type SharedBytes = Arc<[u8]>;

/// How the picture sequence behaves after its last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum PicMode {
    /// Freeze on the final frame.
    #[default]
    Persist,
    /// Jump back to the configured loop frame.
    Loop,
    /// Clear the picture entirely.
    Destroy,
}

/// Which HUD elements the page suppresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum HideHud {
    #[default]
    None,
    /// Hide elements overlapping the text box.
    Hud,
    /// Hide everything.
    All,
}

/// One picture frame in raw form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PicRaw {
    pub name: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub hires: bool,
}

/// One picture frame with an interned name.
#[derive(Clone, Debug)]
pub struct PicCompiled {
    pub name: SharedStr,
    pub duration: u32,
    pub x: i32,
    pub y: i32,
    pub hires: bool,
}

/// A music change issued when the page is entered, raw form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MusicSwitchRaw {
    pub track: String,
    #[serde(default)]
    pub flags: u16,
    #[serde(default = "default_true")]
    pub looping: bool,
}

/// A music change with an interned track name.
#[derive(Clone, Debug)]
pub struct MusicSwitchCompiled {
    pub track: SharedStr,
    pub flags: u16,
    pub looping: bool,
}

/// A player choice in raw form. Targets are zero-based page/prompt indices;
/// a named tag, when present, overrides both.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ChoiceRaw {
    pub text: String,
    #[serde(default)]
    pub next_prompt: Option<usize>,
    #[serde(default)]
    pub next_page: Option<usize>,
    #[serde(default)]
    pub next_tag: Option<String>,
    #[serde(default)]
    pub exec_trigger: Option<u32>,
}

/// A player choice with interned label and tag.
#[derive(Clone, Debug)]
pub struct ChoiceCompiled {
    pub text: SharedStr,
    pub next_prompt: Option<usize>,
    pub next_page: Option<usize>,
    pub next_tag: Option<SharedStr>,
    pub exec_trigger: Option<u32>,
}

/// One screenful of content in raw, JSON-facing form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PageRaw {
    /// Page text; characters U+0000..=U+00FF map to single bytes so that
    /// directive bytes can be authored with `\u00XX` escapes.
    #[serde(default)]
    pub text: String,
    /// Speaker name shown above the text.
    #[serde(default)]
    pub name: String,
    /// Narrator portrait asset name.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_flip: bool,
    /// Place the portrait (and text box gap) on the right side.
    #[serde(default)]
    pub right_side: bool,
    /// Text box height in lines; 0 means the default of 4.
    #[serde(default)]
    pub lines: u8,
    #[serde(default)]
    pub back_color: i32,
    #[serde(default)]
    pub hide_hud: HideHud,
    /// Named tag for non-sequential navigation.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub next_prompt: Option<usize>,
    #[serde(default)]
    pub next_page: Option<usize>,
    #[serde(default)]
    pub next_tag: Option<String>,
    /// Auto-advance timer in ticks; 0 means player-driven.
    #[serde(default)]
    pub time_to_next: u32,
    /// Reveal speed override; 0 keeps the page default.
    #[serde(default)]
    pub text_speed: i32,
    /// Sound cue id played while text reveals.
    #[serde(default)]
    pub text_cue: Option<u32>,
    /// Suppress normal player input from this page onward.
    #[serde(default)]
    pub lock_controls: bool,
    #[serde(default)]
    pub music: Option<MusicSwitchRaw>,
    #[serde(default)]
    pub choices: Vec<ChoiceRaw>,
    /// Initially highlighted choice index.
    #[serde(default)]
    pub start_choice: Option<usize>,
    /// Choice treated as "no selection" by the host UI.
    #[serde(default)]
    pub no_choice: Option<usize>,
    #[serde(default)]
    pub choices_left_side: bool,
    #[serde(default)]
    pub pics: Vec<PicRaw>,
    #[serde(default)]
    pub pic_start: usize,
    #[serde(default)]
    pub pic_loop: usize,
    #[serde(default)]
    pub pic_mode: PicMode,
}

/// One screenful of content, compiled and interned.
#[derive(Clone, Debug)]
pub struct PageCompiled {
    pub text: SharedBytes,
    pub name: SharedStr,
    pub icon: Option<SharedStr>,
    pub icon_flip: bool,
    pub right_side: bool,
    pub lines: u8,
    pub back_color: i32,
    pub hide_hud: HideHud,
    pub tag: Option<SharedStr>,
    pub next_prompt: Option<usize>,
    pub next_page: Option<usize>,
    pub next_tag: Option<SharedStr>,
    pub time_to_next: u32,
    pub text_speed: i32,
    pub text_cue: Option<u32>,
    pub lock_controls: bool,
    pub music: Option<MusicSwitchCompiled>,
    pub choices: Vec<ChoiceCompiled>,
    pub start_choice: Option<usize>,
    pub no_choice: Option<usize>,
    pub choices_left_side: bool,
    pub pics: Vec<PicCompiled>,
    pub pic_start: usize,
    pub pic_loop: usize,
    pub pic_mode: PicMode,
}

/// An ordered collection of pages, raw form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PromptRaw {
    pub pages: Vec<PageRaw>,
}

/// An ordered collection of compiled pages.
#[derive(Clone, Debug)]
pub struct PromptCompiled {
    pub pages: Vec<PageCompiled>,
}

/// Encodes authored page text into the writer's byte stream.
///
/// Each char in U+0000..=U+00FF becomes its byte value; anything wider has
/// no glyph in the byte-oriented font and is rejected.
pub fn encode_page_text(text: &str) -> PromptResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(PromptError::InvalidBook(format!(
                "page text contains unencodable char U+{code:04X}"
            )));
        }
        bytes.push(code as u8);
    }
    Ok(bytes)
}

impl ChoiceRaw {
    fn compile(&self) -> ChoiceCompiled {
        ChoiceCompiled {
            text: Arc::from(self.text.as_str()),
            next_prompt: self.next_prompt,
            next_page: self.next_page,
            next_tag: self.next_tag.as_deref().map(Arc::from),
            exec_trigger: self.exec_trigger,
        }
    }
}

impl PageRaw {
    /// Interns the page and encodes its text.
    pub fn compile(&self) -> PromptResult<PageCompiled> {
        Ok(PageCompiled {
            text: Arc::from(encode_page_text(&self.text)?),
            name: Arc::from(self.name.as_str()),
            icon: self.icon.as_deref().map(Arc::from),
            icon_flip: self.icon_flip,
            right_side: self.right_side,
            lines: self.lines,
            back_color: self.back_color,
            hide_hud: self.hide_hud,
            tag: self.tag.as_deref().map(Arc::from),
            next_prompt: self.next_prompt,
            next_page: self.next_page,
            next_tag: self.next_tag.as_deref().map(Arc::from),
            time_to_next: self.time_to_next,
            text_speed: self.text_speed,
            text_cue: self.text_cue,
            lock_controls: self.lock_controls,
            music: self.music.as_ref().map(|music| MusicSwitchCompiled {
                track: Arc::from(music.track.as_str()),
                flags: music.flags,
                looping: music.looping,
            }),
            choices: self.choices.iter().map(ChoiceRaw::compile).collect(),
            start_choice: self.start_choice,
            no_choice: self.no_choice,
            choices_left_side: self.choices_left_side,
            pics: self
                .pics
                .iter()
                .map(|pic| PicCompiled {
                    name: Arc::from(pic.name.as_str()),
                    duration: pic.duration,
                    x: pic.x,
                    y: pic.y,
                    hires: pic.hires,
                })
                .collect(),
            pic_start: self.pic_start,
            pic_loop: self.pic_loop,
            pic_mode: self.pic_mode,
        })
    }
}

impl PageCompiled {
    /// True when the page has no revealable text at all.
    pub fn text_is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_maps_latin_and_directives() {
        let encoded = encode_page_text("Hi\u{00B2}!").unwrap();
        assert_eq!(encoded, vec![b'H', b'i', 0xB2, b'!']);
    }

    #[test]
    fn encode_rejects_wide_chars() {
        assert!(matches!(
            encode_page_text("日本語"),
            Err(PromptError::InvalidBook(_))
        ));
    }

    #[test]
    fn page_compiles_from_json() {
        let json = r#"{
            "text": "Hello there.",
            "name": "Guide",
            "choices": [
                { "text": "Yes", "next_page": 1 },
                { "text": "No", "next_tag": "FAREWELL", "exec_trigger": 44 }
            ],
            "pic_mode": "loop"
        }"#;
        let raw: PageRaw = serde_json::from_str(json).unwrap();
        let page = raw.compile().unwrap();
        assert_eq!(&*page.text, b"Hello there.");
        assert_eq!(page.choices.len(), 2);
        assert_eq!(page.choices[1].next_tag.as_deref(), Some("FAREWELL"));
        assert_eq!(page.pic_mode, PicMode::Loop);
    }
}
