//! Context assembly — budgeted flat context and chat message scaffolds.
//!
//! Two assembly forms are produced from the same inputs:
//!
//! - a flattened text blob under a strict token budget (preview and
//!   budgeting use), and
//! - a structured message list for the wire, where knowledge entries and
//!   snippets ride as assistant-role turns ahead of the user input.
//!
//! The message-list builders perform no token budgeting of their own; the
//! enabled-filter and the three-entry cap are the only bounds. Callers are
//! responsible for keeping entry and snippet sizes reasonable.

use tracing::debug;

use crate::knowledge::{CrossTabSnippet, KnowledgeEntry, MAX_ACTIVE_ENTRIES};
use crate::token::{estimate_tokens, truncate_to_budget};
use crate::types::{ChatMessage, TextAction};

/// Default token budget for flat context assembly.
pub const DEFAULT_CONTEXT_BUDGET: u32 = 2000;

/// Minimum remaining budget required to include a truncated knowledge entry.
const MIN_ENTRY_TRUNCATION: u32 = 50;

/// Minimum remaining budget required to include a truncated snippet.
const MIN_SNIPPET_TRUNCATION: u32 = 30;

const KNOWLEDGE_SECTION_HEADER: &str = "## Reference Knowledge Bases\n\n";
const SNIPPET_SECTION_HEADER: &str = "## Reference Context\n\n";

const COMPLETION_SYSTEM_PROMPT: &str = "You are an intelligent text completion assistant. Based on the user's current input and reference materials, provide concise and natural completion suggestions.

[IMPORTANT RULES]
1. Output the completion content directly without any explanations, notes, or formatting markers
2. The completion should naturally continue from the user's input, as if the user wrote it themselves
3. Reference materials are for background knowledge only - don't quote or explain them
4. Keep completions within 1-2 sentences
5. Maintain consistent style and terminology with the reference materials
6. Don't output words like \"suggestion\", \"completion\", \"could be written as\", etc.";

const PROCESS_SYSTEM_PROMPT: &str = "You are a professional text processing assistant. Process the user's text according to the style and context of the reference materials.

[IMPORTANT RULES]
1. Output the processed text directly without any explanations, notes, or prefixes
2. Don't output extra content like \"Rewrite notes\", \"After polishing\", \"Modification suggestions\", etc.
3. Don't use quotes, dashes, or other formatting markers
4. Return only the final text result, keeping style and tone consistent with the reference materials";

/// Errors from message scaffold construction.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("custom action requires a prompt")]
    MissingCustomPrompt,
}

/// Instruction template for a built-in text action.
///
/// `Custom` has no template; the caller's prompt leads instead.
fn action_instruction(action: TextAction) -> Option<&'static str> {
    match action {
        TextAction::Polish => Some(
            "Polish the following text to make it more fluent and elegant while keeping the original meaning. Output only the polished text without any explanations, notes, or formatting markers:",
        ),
        TextAction::Correct => Some(
            "Correct grammar, spelling, and expression errors in the following text. Output only the corrected text without any explanations, notes, or formatting markers:",
        ),
        TextAction::Simplify => Some(
            "Simplify the following text to make it more concise and clear. Output only the simplified text without any explanations, notes, or formatting markers:",
        ),
        TextAction::Expand => Some(
            "Expand the following text by adding details and depth to make it more comprehensive. Output only the expanded text without any explanations, notes, or formatting markers:",
        ),
        TextAction::Translate => Some(
            "Translate the following text to provide a bilingual comparison (Chinese-English). If the text is in Chinese, translate to English and show both. If in English, translate to Chinese and show both. Format as: Original | Translation. Output only the translation without any explanations:",
        ),
        TextAction::Custom => None,
    }
}

/// Build a flattened, token-budgeted context blob.
///
/// Knowledge entries are packed first (input order, capped to the first
/// three regardless of their enabled flag — upstream pre-filters, the cap
/// is re-applied defensively), then snippets. Each section packs greedily;
/// the first item that does not fit is truncated into the remaining budget
/// when enough budget is left, and the section stops there. The user input
/// is only measured here, never appended — it travels separately.
pub fn build_flat_context(
    user_input: &str,
    entries: &[KnowledgeEntry],
    snippets: &[CrossTabSnippet],
    max_context_tokens: u32,
) -> String {
    let mut context = String::new();
    let mut tokens_used: u32 = 0;

    debug!(
        user_input_tokens = estimate_tokens(user_input),
        budget = max_context_tokens,
        "assembling flat context"
    );

    if !entries.is_empty() {
        context.push_str(KNOWLEDGE_SECTION_HEADER);

        for entry in entries.iter().take(MAX_ACTIVE_ENTRIES) {
            let cost = entry.token_cost();

            // Compare against the remaining budget; a precomputed estimate
            // can be arbitrarily large and must not overflow the sum.
            if cost <= max_context_tokens - tokens_used {
                context.push_str(&format!("### {}\n{}\n\n", entry.title, entry.content));
                tokens_used += cost;
                debug!(title = %entry.title, tokens = cost, "added knowledge entry");
            } else {
                let remaining = max_context_tokens - tokens_used;
                if remaining > MIN_ENTRY_TRUNCATION {
                    let truncated = truncate_to_budget(&entry.content, remaining);
                    context.push_str(&format!("### {}\n{}\n\n", entry.title, truncated));
                    tokens_used = max_context_tokens;
                    debug!(title = %entry.title, tokens = remaining, "truncated knowledge entry");
                }
                break;
            }
        }
    }

    if !snippets.is_empty() && tokens_used < max_context_tokens {
        context.push_str(SNIPPET_SECTION_HEADER);

        for snippet in snippets {
            let cost = estimate_tokens(&snippet.text);

            if cost <= max_context_tokens - tokens_used {
                context.push_str(&format!(
                    "- Source: {}\n  {}\n\n",
                    snippet.source_label(),
                    snippet.text
                ));
                tokens_used += cost;
                debug!(source = snippet.source_label(), tokens = cost, "added snippet");
            } else {
                let remaining = max_context_tokens - tokens_used;
                if remaining > MIN_SNIPPET_TRUNCATION {
                    let truncated = truncate_to_budget(&snippet.text, remaining);
                    context.push_str(&format!(
                        "- Source: {}\n  {}\n\n",
                        snippet.source_label(),
                        truncated
                    ));
                    tokens_used = max_context_tokens;
                    debug!(source = snippet.source_label(), tokens = remaining, "truncated snippet");
                }
                break;
            }
        }
    }

    debug!(tokens_used, "flat context assembled");
    context.trim().to_string()
}

/// Push enabled knowledge entries (capped) and enabled snippets (uncapped)
/// onto `messages` as assistant-role reference turns.
fn push_reference_messages(
    messages: &mut Vec<ChatMessage>,
    entries: &[KnowledgeEntry],
    snippets: &[CrossTabSnippet],
) {
    for entry in entries
        .iter()
        .filter(|e| e.enabled)
        .take(MAX_ACTIVE_ENTRIES)
    {
        messages.push(ChatMessage::assistant(format!(
            "[Knowledge Base: {}]\n{}",
            entry.title, entry.content
        )));
        debug!(title = %entry.title, "added knowledge message");
    }

    for snippet in snippets.iter().filter(|s| s.enabled) {
        messages.push(ChatMessage::assistant(format!(
            "[Reference: {}]\n{}",
            snippet.source_label(),
            snippet.text
        )));
        debug!(source = snippet.source_label(), "added snippet message");
    }
}

/// Build the message list for an inline autocompletion request.
///
/// Shape: one system message, one assistant message per enabled knowledge
/// entry (cap 3) and per enabled snippet, then one user message embedding
/// the raw input with a completion-request suffix.
pub fn build_completion_messages(
    user_input: &str,
    entries: &[KnowledgeEntry],
    snippets: &[CrossTabSnippet],
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(COMPLETION_SYSTEM_PROMPT)];

    push_reference_messages(&mut messages, entries, snippets);

    messages.push(ChatMessage::user(format!(
        "User's current input:\n{user_input}\n\nProvide a completion suggestion:"
    )));

    debug!(count = messages.len(), "built completion messages");
    messages
}

/// Build the message list for a text transformation request.
///
/// Same scaffold as [`build_completion_messages`], with the final user
/// message drawn from a template keyed by `action`. For
/// [`TextAction::Custom`] the caller's prompt leads and the selection is
/// embedded as a labeled context block; a missing custom prompt is an
/// error, never a silently empty instruction.
pub fn build_text_process_messages(
    action: TextAction,
    selected_text: &str,
    entries: &[KnowledgeEntry],
    snippets: &[CrossTabSnippet],
    custom_prompt: Option<&str>,
) -> Result<Vec<ChatMessage>, ContextError> {
    let mut messages = vec![ChatMessage::system(PROCESS_SYSTEM_PROMPT)];

    push_reference_messages(&mut messages, entries, snippets);

    let user_message = match action_instruction(action) {
        Some(instruction) => format!("{instruction}\n\n{selected_text}"),
        None => {
            let prompt = custom_prompt
                .filter(|p| !p.is_empty())
                .ok_or(ContextError::MissingCustomPrompt)?;
            format!("{prompt}\n\n[Context - Selected Text]:\n{selected_text}")
        }
    };
    messages.push(ChatMessage::user(user_message));

    debug!(count = messages.len(), %action, "built text process messages");
    Ok(messages)
}
