use text_prompt_engine::{
    ChoiceRaw, DialogSession, PageRaw, PlayerInput, PromptBookRaw, PromptLibrary, PromptRaw,
    ResourceLimits, StartOptions,
};

/// Builds a page with just text.
pub fn text_page(text: &str) -> PageRaw {
    PageRaw {
        text: text.to_string(),
        ..PageRaw::default()
    }
}

/// Builds a choice with a label and optional trigger.
pub fn choice(text: &str, exec_trigger: Option<u32>) -> ChoiceRaw {
    ChoiceRaw {
        text: text.to_string(),
        exec_trigger,
        ..ChoiceRaw::default()
    }
}

/// Compiles a library out of one prompt per page list.
pub fn library(prompts: Vec<Vec<PageRaw>>) -> PromptLibrary {
    let prompts = prompts
        .into_iter()
        .map(|pages| PromptRaw { pages })
        .collect();
    PromptBookRaw::new(prompts)
        .compile(ResourceLimits::default())
        .expect("compile library")
}

/// Session with a single player.
pub fn solo_session(prompts: Vec<Vec<PageRaw>>) -> DialogSession {
    DialogSession::new(library(prompts), 1)
}

/// Locked-controls start options.
pub fn locked() -> StartOptions {
    StartOptions {
        block_controls: true,
        ..StartOptions::default()
    }
}

/// Ticks the session `ticks` times with the same input for player 0.
pub fn run_ticks(session: &mut DialogSession, ticks: usize, advance_held: bool) {
    for _ in 0..ticks {
        session.run_tick(&[PlayerInput { advance_held }]);
    }
}
