/// Validation budget applied when compiling a prompt book.
#[derive(Clone, Copy, Debug)]
pub struct ResourceLimits {
    pub max_prompts: usize,
    pub max_pages: usize,
    pub max_text_bytes: usize,
    pub max_choices: usize,
    pub max_pics: usize,
    pub max_tag_length: usize,
    pub max_book_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_prompts: 256,
            max_pages: 128,
            max_text_bytes: 16 * 1024,
            max_choices: 32,
            max_pics: 64,
            max_tag_length: 32,
            max_book_bytes: 1024 * 1024,
        }
    }
}
