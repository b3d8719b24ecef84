use std::sync::Arc;

use crate::database::DatabaseSchema;
use crate::error::Result;
use crate::llm::{ChatModel, Message};

use super::prompt::{build_translation_template, render_translation_prompt};

/// One-shot natural-language-to-SQL translation.
///
/// The returned text is whatever the model wrote; it is neither parsed nor
/// executed.
pub struct Translator {
    model: Arc<dyn ChatModel>,
    template: String,
}

impl Translator {
    pub fn new(model: Arc<dyn ChatModel>, schema: &DatabaseSchema) -> Self {
        Self {
            model,
            template: build_translation_template(schema),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    #[tracing::instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn translate(&self, question: &str) -> Result<String> {
        let prompt = render_translation_prompt(&self.template, question);
        let response = self.model.complete(&[Message::user(prompt)], &[]).await?;
        Ok(response.trim().to_string())
    }
}
