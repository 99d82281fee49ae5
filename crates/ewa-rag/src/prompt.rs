//! Prompt assembly for support answers
//!
//! Author: hephaex@gmail.com

use ewa_core::RetrievedContext;

/// Persona and instructions placed at the top of every prompt
pub const SUPPORT_PERSONA: &str = "You are a knowledgeable and friendly support assistant for Ewa, an on-demand barbing service platform that connects customers with professional barbers in their area.\n\nYour role is to provide clear, helpful, and accurate responses to user inquiries based on the context provided below.";

/// Builder for constructing support prompts
///
/// Output layout:
///
/// ```text
/// <persona>
///
/// Context:
/// <passage 1>
/// <passage 2>
///
/// Question: <question>
/// Answer:
/// ```
pub struct PromptBuilder<'a> {
    persona: &'a str,
    context: Option<&'a RetrievedContext>,
    question: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder with the default persona
    pub fn new() -> Self {
        Self {
            persona: SUPPORT_PERSONA,
            context: None,
            question: "",
        }
    }

    /// Replace the persona preamble
    pub fn persona(mut self, persona: &'a str) -> Self {
        self.persona = persona;
        self
    }

    /// Set the retrieved passages
    pub fn context(mut self, context: &'a RetrievedContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the question
    pub fn question(mut self, question: &'a str) -> Self {
        self.question = question;
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        let context = self.context.map(RetrievedContext::joined).unwrap_or_default();

        let mut prompt = String::with_capacity(
            self.persona.len() + context.len() + self.question.len() + 32,
        );
        prompt.push_str(self.persona);
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&context);
        prompt.push_str("\n\nQuestion: ");
        prompt.push_str(self.question);
        prompt.push_str("\nAnswer:");
        prompt
    }
}

impl Default for PromptBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the support prompt for a question and its context
pub fn build_prompt(question: &str, context: &RetrievedContext) -> String {
    PromptBuilder::new().context(context).question(question).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let context = RetrievedContext::new(vec![
            "Ewa barbers come to your home.".to_string(),
            "You can pay by card or transfer.".to_string(),
        ]);

        let prompt = build_prompt("How do I pay?", &context);

        let expected = format!(
            "{SUPPORT_PERSONA}\n\nContext:\nEwa barbers come to your home.\nYou can pay by card or transfer.\n\nQuestion: How do I pay?\nAnswer:"
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_sections_in_order() {
        let context = RetrievedContext::new(vec!["first".to_string(), "second".to_string()]);
        let prompt = build_prompt("Where?", &context);

        let persona = prompt.find("support assistant for Ewa").unwrap();
        let ctx = prompt.find("Context:").unwrap();
        let first = prompt.find("first").unwrap();
        let second = prompt.find("second").unwrap();
        let question = prompt.find("Question: Where?").unwrap();
        let answer = prompt.find("Answer:").unwrap();

        assert!(persona < ctx);
        assert!(ctx < first && first < second);
        assert!(second < question && question < answer);
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_empty_context_keeps_headers() {
        let prompt = PromptBuilder::new()
            .persona("Persona.")
            .question("Anything?")
            .build();

        assert_eq!(prompt, "Persona.\n\nContext:\n\n\nQuestion: Anything?\nAnswer:");
    }
}
