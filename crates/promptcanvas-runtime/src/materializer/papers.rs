//! Markdown bodies for paper search results.

use crate::provider::Paper;
use crate::text;

/// Renders the body of a paper node.
pub(super) fn paper_markdown(paper: &Paper) -> String {
    let mut facts = Vec::new();
    if let Some(year) = paper.year {
        facts.push(format!("- **Year:** {year}"));
    }
    if let Some(citations) = paper.citation_count {
        facts.push(format!("- **Citations:** {citations}"));
    }
    if let Some(references) = paper.reference_count {
        facts.push(format!("- **References:** {references}"));
    }
    facts.push(format!(
        "- **Open access:** {}",
        if paper.is_open_access { "yes" } else { "no" }
    ));
    if !paper.authors.is_empty() {
        let authors: Vec<String> = paper.authors.iter().map(|a| text::strip_markup(a)).collect();
        facts.push(format!("- **Authors:** {}", authors.join(", ")));
    }
    if let Some(url) = paper.url.as_deref().filter(|u| !u.is_empty()) {
        facts.push(format!("- **Link:** <{}>", text::strip_markup(url)));
    }

    let mut body = facts.join("\n");
    if let Some(abstract_text) = paper.abstract_text.as_deref() {
        let abstract_text = text::strip_markup(abstract_text);
        let abstract_text = abstract_text.trim();
        if !abstract_text.is_empty() {
            body.push_str("\n\n");
            body.push_str(abstract_text);
        }
    }
    body
}
