//! Prompt augmentation with retrieved context.
//!
//! Both functions are pure: the same inputs always produce the same prompt,
//! and an empty context leaves the prompt untouched.

use folio_core::head_truncate;

use crate::knowledge::FrameworkSnippet;
use crate::retrieval::{ContextSnippet, RetrievedContext};

/// Characters of each snippet kept when no limit is given.
pub const DEFAULT_SNIPPET_CHARS: usize = 600;

/// Append retrieved critiques, then retrieved analyses, to `base_prompt`.
pub fn build_augmented_prompt(base_prompt: &str, context: &RetrievedContext) -> String {
    build_augmented_prompt_with_limit(base_prompt, context, DEFAULT_SNIPPET_CHARS)
}

/// [`build_augmented_prompt`] with an explicit per-snippet character limit.
pub fn build_augmented_prompt_with_limit(
    base_prompt: &str,
    context: &RetrievedContext,
    snippet_chars: usize,
) -> String {
    if context.is_empty() {
        return base_prompt.to_string();
    }

    let mut prompt = base_prompt.to_string();
    if !context.critiques.is_empty() {
        prompt.push_str("\n\n## Prior editorial critiques\n");
        for (i, snippet) in context.critiques.iter().enumerate() {
            let kind = snippet.kind.as_deref().unwrap_or("general");
            push_block(
                &mut prompt,
                &format!("Critique {} | type: {kind}", i + 1),
                snippet,
                snippet_chars,
            );
        }
    }
    if !context.analyses.is_empty() {
        prompt.push_str("\n\n## Approved prior analyses\n");
        for (i, snippet) in context.analyses.iter().enumerate() {
            push_block(&mut prompt, &format!("Analysis {}", i + 1), snippet, snippet_chars);
        }
    }
    prompt
}

/// Append retrieved frameworks to `prompt`.
pub fn append_framework_context(prompt: &str, frameworks: &[FrameworkSnippet]) -> String {
    if frameworks.is_empty() {
        return prompt.to_string();
    }

    let mut out = prompt.to_string();
    out.push_str("\n\n## Analytical frameworks\n");
    for (i, framework) in frameworks.iter().enumerate() {
        let name = framework.framework_name.as_deref().unwrap_or("unnamed");
        let category = framework.category.as_deref().unwrap_or("other");
        out.push_str(&format!(
            "\n[Framework {} | {name} | {category}]\n{}\n",
            i + 1,
            head_truncate(framework.text.trim(), DEFAULT_SNIPPET_CHARS)
        ));
    }
    out
}

fn push_block(prompt: &mut String, label: &str, snippet: &ContextSnippet, snippet_chars: usize) {
    prompt.push_str(&format!(
        "\n[{label} | {}]\n{}\n",
        snippet.created_at.format("%Y-%m-%d"),
        head_truncate(snippet.text.trim(), snippet_chars)
    ));
}
