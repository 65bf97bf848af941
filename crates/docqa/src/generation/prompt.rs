//! Prompt templates for extraction and answering

use regex::Regex;
use std::sync::OnceLock;

use crate::types::CompressedFragment;

/// Marker the extraction prompt asks for when nothing is relevant
pub const NO_OUTPUT: &str = "NO_OUTPUT";

/// Prompt builder for the extraction and answer calls
pub struct PromptBuilder;

impl PromptBuilder {
    /// Ask the model to copy out, verbatim, the parts of `context` that help answer `question`
    pub fn build_extraction_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Given the following question and context, extract any part of the context *AS IS* that is relevant to answer the question. If none of the context is relevant return {no_output}.

Remember, *DO NOT* edit the extracted parts of the context.

> Question: {question}
> Context:
>>>
{context}
>>>
Extracted relevant parts:"#,
            no_output = NO_OUTPUT,
            question = question,
            context = context
        )
    }

    /// `None` for an empty response or the no-output marker
    pub fn parse_extraction(output: &str) -> Option<String> {
        let trimmed = output.trim();
        if trimmed.is_empty() || is_no_output(trimmed) {
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Join extracted passages with blank lines
    pub fn build_context(fragments: &[CompressedFragment]) -> String {
        fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Final answer prompt, grounded in `context` and written in `language`
    pub fn build_answer_prompt(question: &str, context: &str, language: &str) -> String {
        format!(
            r#"You are an assistant that answers in {language}.
Use only the information in the context below. If the context does not contain the answer, say in {language} that the information is not available in the provided documents.

Context:
{context}

Question: {question}

Answer in a concise and clear way in {language}."#,
            language = language,
            context = context,
            question = question
        )
    }
}

/// Tolerates quoting or trailing punctuation around the marker
fn is_no_output(text: &str) -> bool {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"^\W*NO_OUTPUT\W*$").ok())
        .as_ref()
        .map_or(text == NO_OUTPUT, |re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    #[test]
    fn test_extraction_prompt_contains_inputs() {
        let prompt = PromptBuilder::build_extraction_prompt("What color is the sky?", "The sky is blue.");
        assert!(prompt.contains("What color is the sky?"));
        assert!(prompt.contains("The sky is blue."));
        assert!(prompt.contains(NO_OUTPUT));
    }

    #[test]
    fn test_parse_extraction() {
        assert_eq!(
            PromptBuilder::parse_extraction("  The sky is blue.\n"),
            Some("The sky is blue.".to_string())
        );
        assert_eq!(PromptBuilder::parse_extraction("NO_OUTPUT"), None);
        assert_eq!(PromptBuilder::parse_extraction(" \"NO_OUTPUT.\" "), None);
        assert_eq!(PromptBuilder::parse_extraction("   \n"), None);
        assert!(PromptBuilder::parse_extraction("NO_OUTPUT but the sky is blue").is_some());
    }

    #[test]
    fn test_context_joined_with_blank_line() {
        let frag = |t: &str| CompressedFragment {
            text: t.to_string(),
            metadata: Metadata::new(),
            score: 1.0,
        };
        let context = PromptBuilder::build_context(&[frag("one"), frag("two")]);
        assert_eq!(context, "one\n\ntwo");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_answer_prompt_language() {
        let prompt = PromptBuilder::build_answer_prompt("Q?", "ctx", "Spanish");
        assert!(prompt.contains("answers in Spanish"));
        assert!(prompt.contains("Context:\nctx"));
        assert!(prompt.contains("Question: Q?"));
    }
}
