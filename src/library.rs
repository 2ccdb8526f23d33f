//! Prompt book loading, validation, and named-tag lookup.

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, PromptResult};
use crate::page::{PageCompiled, PromptCompiled, PromptRaw};
use crate::resource::ResourceLimits;

pub const BOOK_SCHEMA_VERSION: &str = "1.0";

/// Control scheme detected for the local player; selects which tag variant
/// a tutorial lookup prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    /// Mouse-look bindings; tutorial tags are used unsuffixed.
    #[default]
    Fps,
    Platform,
    Custom,
}

impl ControlScheme {
    /// Suffix appended to tutorial tags, or `None` for the base variant.
    pub fn tag_suffix(self) -> Option<&'static str> {
        match self {
            ControlScheme::Fps => None,
            ControlScheme::Platform => Some("PLATFORM"),
            ControlScheme::Custom => Some("CUSTOM"),
        }
    }
}

/// Tutorial-mode settings affecting named-tag resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct TutorialConfig {
    pub enabled: bool,
    pub scheme: ControlScheme,
    /// First prompt searched while the tutorial is active.
    pub start_prompt: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BookEnvelope {
    #[serde(default)]
    book_schema_version: Option<String>,
    prompts: Vec<PromptRaw>,
}

/// JSON-facing prompt book.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PromptBookRaw {
    pub prompts: Vec<PromptRaw>,
}

impl PromptBookRaw {
    pub fn new(prompts: Vec<PromptRaw>) -> Self {
        Self { prompts }
    }

    /// Parses a JSON book with default limits.
    pub fn from_json(input: &str) -> PromptResult<Self> {
        Self::from_json_with_limits(input, ResourceLimits::default())
    }

    /// Parses a JSON book, rejecting oversized input before deserializing.
    pub fn from_json_with_limits(input: &str, limits: ResourceLimits) -> PromptResult<Self> {
        if input.len() > limits.max_book_bytes {
            return Err(PromptError::ResourceLimit(format!(
                "book is {} bytes, limit is {}",
                input.len(),
                limits.max_book_bytes
            )));
        }
        let envelope: BookEnvelope = serde_json::from_str(input)
            .map_err(|err| PromptError::Serialization(err.to_string()))?;
        Ok(Self {
            prompts: envelope.prompts,
        })
    }

    /// Serializes the book with the current schema version.
    pub fn to_json(&self) -> PromptResult<String> {
        let envelope = BookEnvelope {
            book_schema_version: Some(BOOK_SCHEMA_VERSION.to_string()),
            prompts: self.prompts.clone(),
        };
        serde_json::to_string(&envelope).map_err(|err| PromptError::Serialization(err.to_string()))
    }

    /// Validates against the limits and interns everything.
    pub fn compile(&self, limits: ResourceLimits) -> PromptResult<PromptLibrary> {
        if self.prompts.len() > limits.max_prompts {
            return Err(PromptError::ResourceLimit(format!(
                "{} prompts exceeds limit of {}",
                self.prompts.len(),
                limits.max_prompts
            )));
        }
        let mut prompts = Vec::with_capacity(self.prompts.len());
        for (prompt_index, prompt) in self.prompts.iter().enumerate() {
            if prompt.pages.len() > limits.max_pages {
                return Err(PromptError::ResourceLimit(format!(
                    "prompt {prompt_index} has {} pages, limit is {}",
                    prompt.pages.len(),
                    limits.max_pages
                )));
            }
            let mut pages = Vec::with_capacity(prompt.pages.len());
            for (page_index, page) in prompt.pages.iter().enumerate() {
                if page.text.len() > limits.max_text_bytes {
                    return Err(PromptError::ResourceLimit(format!(
                        "page {prompt_index}/{page_index} text exceeds {} bytes",
                        limits.max_text_bytes
                    )));
                }
                if page.choices.len() > limits.max_choices {
                    return Err(PromptError::ResourceLimit(format!(
                        "page {prompt_index}/{page_index} has too many choices"
                    )));
                }
                if page.pics.len() > limits.max_pics {
                    return Err(PromptError::ResourceLimit(format!(
                        "page {prompt_index}/{page_index} has too many pictures"
                    )));
                }
                if page.time_to_next > i32::MAX as u32 {
                    return Err(PromptError::InvalidBook(format!(
                        "page {prompt_index}/{page_index} auto-advance timer overflows a tick counter"
                    )));
                }
                if !(0..=15).contains(&page.text_speed) {
                    return Err(PromptError::InvalidBook(format!(
                        "page {prompt_index}/{page_index} text speed {} is outside 0..=15",
                        page.text_speed
                    )));
                }
                if let Some(tag) = &page.tag {
                    if tag.len() > limits.max_tag_length {
                        return Err(PromptError::InvalidBook(format!(
                            "tag '{tag}' exceeds {} chars",
                            limits.max_tag_length
                        )));
                    }
                }
                pages.push(page.compile()?);
            }
            prompts.push(PromptCompiled { pages });
        }
        Ok(PromptLibrary { prompts })
    }
}

/// Compiled, read-only prompt data shared by every dialog.
#[derive(Clone, Debug, Default)]
pub struct PromptLibrary {
    prompts: Vec<PromptCompiled>,
}

impl PromptLibrary {
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    pub fn page_count(&self, prompt: usize) -> usize {
        self.prompts.get(prompt).map_or(0, |p| p.pages.len())
    }

    /// Looks up a page; every navigation miss is an ordinary `None`.
    pub fn page(&self, prompt: usize, page: usize) -> Option<&PageCompiled> {
        self.prompts.get(prompt)?.pages.get(page)
    }

    /// Resolves a named tag to a `(prompt, page)` pair.
    ///
    /// With tutorial mode active a control-scheme-suffixed variant of the
    /// tag is preferred: a suffixed match wins immediately, an unsuffixed
    /// match is remembered and used only if the full search finds no
    /// suffixed hit. Without tutorial mode the first exact match wins.
    pub fn resolve_named_tag(
        &self,
        tag: &str,
        tutorial: &TutorialConfig,
    ) -> Option<(usize, usize)> {
        if tag.is_empty() {
            return None;
        }

        let suffixed_tag = if tutorial.enabled {
            tutorial
                .scheme
                .tag_suffix()
                .map(|suffix| format!("{tag}{suffix}"))
        } else {
            None
        };
        let start_prompt = if tutorial.enabled {
            tutorial.start_prompt.min(self.prompts.len())
        } else {
            0
        };

        let mut fallback = None;

        for (prompt_index, prompt) in self.prompts.iter().enumerate().skip(start_prompt) {
            for (page_index, page) in prompt.pages.iter().enumerate() {
                let Some(page_tag) = page.tag.as_deref() else {
                    continue;
                };
                if let Some(suffixed) = suffixed_tag.as_deref() {
                    if page_tag == suffixed {
                        return Some((prompt_index, page_index));
                    }
                    if fallback.is_none() && page_tag == tag {
                        // keep searching in case a suffixed variant exists later
                        fallback = Some((prompt_index, page_index));
                    }
                } else if page_tag == tag {
                    return Some((prompt_index, page_index));
                }
            }
        }

        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageRaw;

    fn tagged_page(tag: &str) -> PageRaw {
        PageRaw {
            text: format!("page {tag}"),
            tag: Some(tag.to_string()),
            ..PageRaw::default()
        }
    }

    fn library_with_tags(tags: &[&[&str]]) -> PromptLibrary {
        let prompts = tags
            .iter()
            .map(|pages| PromptRaw {
                pages: pages.iter().map(|tag| tagged_page(tag)).collect(),
            })
            .collect();
        PromptBookRaw::new(prompts)
            .compile(ResourceLimits::default())
            .unwrap()
    }

    #[test]
    fn plain_lookup_finds_first_match() {
        let library = library_with_tags(&[&["INTRO", "MIDDLE"], &["MIDDLE"]]);
        assert_eq!(
            library.resolve_named_tag("MIDDLE", &TutorialConfig::default()),
            Some((0, 1))
        );
        assert_eq!(
            library.resolve_named_tag("MISSING", &TutorialConfig::default()),
            None
        );
    }

    #[test]
    fn suffixed_match_beats_earlier_unsuffixed_match() {
        let library = library_with_tags(&[&["TAM1", "OTHER"], &["TAM1PLATFORM"]]);
        let tutorial = TutorialConfig {
            enabled: true,
            scheme: ControlScheme::Platform,
            start_prompt: 0,
        };
        assert_eq!(library.resolve_named_tag("TAM1", &tutorial), Some((1, 0)));
    }

    #[test]
    fn unsuffixed_fallback_used_when_no_suffixed_hit() {
        let library = library_with_tags(&[&["TAM1"], &["TAM2CUSTOM"]]);
        let tutorial = TutorialConfig {
            enabled: true,
            scheme: ControlScheme::Custom,
            start_prompt: 0,
        };
        assert_eq!(library.resolve_named_tag("TAM1", &tutorial), Some((0, 0)));
    }

    #[test]
    fn fps_scheme_searches_unsuffixed() {
        let library = library_with_tags(&[&["TAM1", "TAM1PLATFORM"]]);
        let tutorial = TutorialConfig {
            enabled: true,
            scheme: ControlScheme::Fps,
            start_prompt: 0,
        };
        assert_eq!(library.resolve_named_tag("TAM1", &tutorial), Some((0, 0)));
    }

    #[test]
    fn tutorial_search_starts_at_configured_prompt() {
        let library = library_with_tags(&[&["SHARED"], &["SHARED"]]);
        let tutorial = TutorialConfig {
            enabled: true,
            scheme: ControlScheme::Fps,
            start_prompt: 1,
        };
        assert_eq!(library.resolve_named_tag("SHARED", &tutorial), Some((1, 0)));
    }

    #[test]
    fn book_round_trips_through_json() {
        let book = PromptBookRaw::new(vec![PromptRaw {
            pages: vec![tagged_page("A")],
        }]);
        let json = book.to_json().unwrap();
        let parsed = PromptBookRaw::from_json(&json).unwrap();
        assert_eq!(parsed.prompts.len(), 1);
        assert_eq!(parsed.prompts[0].pages[0].tag.as_deref(), Some("A"));
    }

    #[test]
    fn oversized_auto_advance_timer_is_rejected() {
        let book = PromptBookRaw::new(vec![PromptRaw {
            pages: vec![PageRaw {
                time_to_next: u32::MAX,
                ..PageRaw::default()
            }],
        }]);
        assert!(matches!(
            book.compile(ResourceLimits::default()),
            Err(PromptError::InvalidBook(_))
        ));
    }

    #[test]
    fn out_of_range_text_speed_is_rejected() {
        for text_speed in [-3, 16] {
            let book = PromptBookRaw::new(vec![PromptRaw {
                pages: vec![PageRaw {
                    text_speed,
                    ..PageRaw::default()
                }],
            }]);
            assert!(matches!(
                book.compile(ResourceLimits::default()),
                Err(PromptError::InvalidBook(_))
            ));
        }
    }

    #[test]
    fn oversized_book_is_rejected_before_parsing() {
        let limits = ResourceLimits {
            max_book_bytes: 16,
            ..ResourceLimits::default()
        };
        let result = PromptBookRaw::from_json_with_limits("{\"prompts\": []}        ", limits);
        assert!(matches!(result, Err(PromptError::ResourceLimit(_))));
    }
}
