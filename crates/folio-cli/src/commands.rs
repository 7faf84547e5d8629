//! Command handlers.
//!
//! Each handler runs one operation against [`Services`] and returns its
//! result as JSON for the caller to print.

use folio_core::{Error, Result};
use folio_review::{
    AnalysisPayload, CritiqueInput, EditorNotes, FeedbackInput, FrameworkCategory, FrameworkInput,
    append_framework_context, build_augmented_prompt_with_limit,
};
use folio_vector::Collection;
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;

use crate::cli::{CritiqueAction, FeedbackAction, FeedbackArgs, KnowledgeAction};
use crate::services::Services;

// ============================================================================
// Critiques
// ============================================================================

/// Run a critique subcommand.
pub async fn handle_critique(services: &Services, action: CritiqueAction) -> Result<Value> {
    match action {
        CritiqueAction::Create {
            text,
            article,
            title,
            critique_type,
            notes,
        } => {
            let mut input = CritiqueInput::new(text);
            input.news_id = article.news_id;
            input.article_url = article.url;
            input.article_title = title;
            input.critique_type = critique_type;
            if let Some(notes) = notes {
                input = input.with_editor_notes(parse_notes(&notes).await?);
            }
            to_json(&services.critiques.create(input).await?)
        }
        CritiqueAction::Revise {
            parent_id,
            text,
            critique_type,
            notes,
        } => {
            let mut input = CritiqueInput::new(text);
            input.critique_type = critique_type;
            if let Some(notes) = notes {
                input = input.with_editor_notes(parse_notes(&notes).await?);
            }
            to_json(&services.critiques.revise(parent_id, input).await?)
        }
        CritiqueAction::Versions { id } => to_json(&services.critiques.list_versions(id).await?),
        CritiqueAction::List { article } => {
            let key = article.identity().key()?;
            to_json(&services.critiques.list_for_article(&key).await?)
        }
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// Run a feedback subcommand.
pub async fn handle_feedback(services: &Services, action: FeedbackAction) -> Result<Value> {
    match action {
        FeedbackAction::Submit(args) => {
            let input = feedback_input(args).await?;
            to_json(&services.pipeline.submit_feedback(input).await?)
        }
        FeedbackAction::Revise(args) => {
            let input = feedback_input(args).await?;
            to_json(&services.pipeline.request_revision(input).await?)
        }
        FeedbackAction::Approve { id, analysis } => {
            let analysis = parse_analysis(&analysis).await?;
            to_json(&services.pipeline.approve(id, &analysis).await?)
        }
        FeedbackAction::History { article } => {
            to_json(&services.pipeline.get_history(&article.identity()).await?)
        }
    }
}

async fn feedback_input(args: FeedbackArgs) -> Result<FeedbackInput> {
    let analysis = parse_analysis(&args.analysis).await?;
    let mut input = FeedbackInput::new(args.article.identity(), args.comment, analysis);
    input.score = args.score;
    Ok(input)
}

// ============================================================================
// Knowledge
// ============================================================================

/// Run a knowledge subcommand.
pub async fn handle_knowledge(services: &Services, action: KnowledgeAction) -> Result<Value> {
    match action {
        KnowledgeAction::Add {
            category,
            name,
            title,
            content,
            keywords,
            source,
        } => {
            let input = FrameworkInput {
                category,
                framework_name: name,
                title,
                content: read_inline_or_file(&content).await?,
                keywords,
                source,
            };
            to_json(&services.knowledge.add(input).await?)
        }
        KnowledgeAction::List { category } => {
            let category = parse_category(category.as_deref())?;
            to_json(&services.knowledge.list(category.as_ref()).await?)
        }
        KnowledgeAction::Delete { id } => {
            services.knowledge.delete(id).await?;
            Ok(json!({ "deleted": id }))
        }
        KnowledgeAction::Search {
            query,
            top_k,
            category,
        } => {
            let category = parse_category(category.as_deref())?;
            to_json(&services.knowledge.search(&query, top_k, category.as_ref()).await)
        }
    }
}

fn parse_category(category: Option<&str>) -> Result<Option<FrameworkCategory>> {
    category.map(str::parse).transpose()
}

// ============================================================================
// Retrieval and status
// ============================================================================

/// Retrieve context for `query`, optionally augmenting `prompt` with it.
///
/// Frameworks are searched alongside critiques and analyses and appended
/// after them.
pub async fn handle_retrieve(
    services: &Services,
    query: &str,
    top_k: Option<usize>,
    prompt: Option<&str>,
) -> Result<Value> {
    let config = services.retrieval_config();
    let top_k = config.clamp_top_k(top_k.unwrap_or(config.default_top_k));

    let context = services.retrieval.retrieve_context(query, top_k).await;
    let frameworks = services.knowledge.search(query, top_k, None).await;

    let mut out = json!({
        "configured": services.retrieval.is_configured(),
        "top_k": top_k,
        "context": context,
        "frameworks": frameworks,
    });
    if let Some(base) = prompt {
        let augmented = build_augmented_prompt_with_limit(base, &context, config.snippet_chars);
        out["prompt"] = Value::String(append_framework_context(&augmented, &frameworks));
    }
    Ok(out)
}

/// Provider configuration and per-collection document counts.
pub async fn handle_status(services: &Services) -> Result<Value> {
    let corpus = services.corpus();
    let gateway = corpus.gateway();

    let mut collections = serde_json::Map::new();
    for collection in [Collection::Critique, Collection::Analysis, Collection::Knowledge] {
        collections.insert(
            collection.to_string(),
            json!({
                "documents": corpus.count(collection).await?,
                "embedded": corpus.count_embedded(collection).await?,
            }),
        );
    }

    Ok(json!({
        "data_dir": services.data_dir().display().to_string(),
        "embedding": {
            "configured": gateway.is_configured(),
            "provider": gateway.provider_name(),
            "dimension": gateway.dimension(),
        },
        "chat_configured": services.chat_configured(),
        "retrieval_configured": services.retrieval.is_configured(),
        "collections": collections,
    }))
}

// ============================================================================
// Argument helpers
// ============================================================================

/// The argument itself, or the contents of the file named after a leading `@`.
pub async fn read_inline_or_file(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let path = Path::new(path);
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::io_with_path(e, path))
        }
        None => Ok(arg.to_string()),
    }
}

/// Parse an analysis given as a JSON object or `@file`.
pub async fn parse_analysis(arg: &str) -> Result<AnalysisPayload> {
    let raw = read_inline_or_file(arg).await?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::validation(format!("analysis is not valid JSON: {e}")))?;
    AnalysisPayload::from_value(value)
}

/// Parse editor notes; anything that is not JSON is kept as plain text.
pub async fn parse_notes(arg: &str) -> Result<EditorNotes> {
    let raw = read_inline_or_file(arg).await?;
    Ok(serde_json::from_str(&raw).unwrap_or(EditorNotes::Text(raw)))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

// ============================================================================
// Tests
// ============================================================================
