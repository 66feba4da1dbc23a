//! Prompt compilation and per-document analysis

use litminer_domain::{AnalysisResult, DocumentRecord, EventSender, LlmClient, SamplingParams, TaskFailure};

/// Placeholder the template must contain
pub const CONTENT_PLACEHOLDER: &str = "{content_to_analyze}";

/// Characters of the title shown in progress lines
const TITLE_PREVIEW_CHARS: usize = 60;

/// The text block substituted into the template
pub fn compose_content(title: &str, abstract_text: &str) -> String {
    format!("Title: {}\n\nAbstract: {}", title, abstract_text)
}

/// Substitute `content` into `template`
///
/// `{{` and `}}` in the template stand for literal braces, so templates can
/// show the model a JSON skeleton. Any other brace text is kept verbatim.
pub fn render_template(template: &str, content: &str) -> Result<String, TaskFailure> {
    if !template.contains(CONTENT_PLACEHOLDER) {
        return Err(TaskFailure::InvalidPromptTemplate);
    }

    let mut out = String::with_capacity(template.len() + content.len());
    let mut rest = template;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(CONTENT_PLACEHOLDER) {
            out.push_str(content);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("{{") {
            out.push('{');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("}}") {
            out.push('}');
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    Ok(out)
}

/// Analyze one document
///
/// A blank title short-circuits without calling the client, as does a
/// template without the content placeholder.
pub async fn analyze_document(
    client: &dyn LlmClient,
    template: &str,
    record: &DocumentRecord,
    params: SamplingParams,
    events: &EventSender,
) -> AnalysisResult {
    if record.has_blank_title() {
        events.warn(format!("Skipping UID {}: missing title", record.uid));
        return Err(TaskFailure::MissingTitle);
    }

    let content = compose_content(&record.title, &record.abstract_text);
    let prompt = match render_template(template, &content) {
        Ok(prompt) => prompt,
        Err(failure) => {
            events.error(format!(
                "Prompt template is missing the required {} placeholder",
                CONTENT_PLACEHOLDER
            ));
            return Err(failure);
        }
    };

    events.info(format!(
        "Analyzing UID {}: {}",
        record.uid,
        record.title_preview(TITLE_PREVIEW_CHARS)
    ));
    client.analyze_text(&prompt, params).await
}
