//! Grounding context and prompt text

use crate::index::SearchHit;

/// Instructions given to the generation model with every question
pub const ANSWER_PREAMBLE: &str = "\
You are a helpful and informative chatbot for a website. Your task is to answer \
questions based ONLY on the context provided below. If the answer cannot be found \
in the context, politely state that you don't have enough information rather than \
making up an answer. Always provide accurate, factual responses based solely on the \
context. Format your response in a clear, concise manner. If appropriate, use \
markdown formatting for readability.

Remember:
1. Only use information found in the context below
2. If information is missing, acknowledge the limitations
3. Do not reference that you're using \"context\" or \"documents\" in your answer
4. Do not mention that you're an AI unless directly asked about your nature
5. Make your response conversational and helpful
";

/// Context used when retrieval returned nothing
pub const EMPTY_CONTEXT: &str = "No relevant information found.";

const UNKNOWN_SOURCE: &str = "Unknown source";
const UNTITLED: &str = "Untitled section";

/// Join retrieved chunks into one context block
///
/// Each chunk is numbered from 1 and tagged with its title and source URL;
/// blocks are separated by a `---` line.
pub fn build_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let source = non_empty(&hit.metadata.source_url).unwrap_or(UNKNOWN_SOURCE);
            let title = non_empty(&hit.metadata.title).unwrap_or(UNTITLED);
            format!(
                "[Document {}] {}\nSource: {}\n\n{}\n",
                i + 1,
                title,
                source,
                hit.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// The user turn sent alongside [`ANSWER_PREAMBLE`]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "CONTEXT:\n{}\n\nUSER QUESTION:\n{}\n\nYOUR RESPONSE:",
        context, question
    )
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
