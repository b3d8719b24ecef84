mod prompt;
mod translator;

pub use prompt::{build_translation_template, render_translation_prompt, EXAMPLE_QUESTIONS};
pub use translator::Translator;
