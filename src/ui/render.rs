use once_cell::sync::Lazy;
use regex::Regex;

use super::modal::{Entry, ModalPresenter};

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code pattern"));

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes an answer, then applies the small markdown subset answers use:
/// line breaks, `**bold**` and `` `code` ``.
pub fn format_text(text: &str) -> String {
    let escaped = escape_html(text).replace('\n', "<br>");
    let bolded = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    INLINE_CODE
        .replace_all(&bolded, "<code>$1</code>")
        .into_owned()
}

fn entry_html(entry: &Entry) -> String {
    match entry {
        Entry::User(text) => format!(r#"<div class="msg-user">{}</div>"#, escape_html(text)),
        Entry::Answer(text) => format!(r#"<div class="msg-ai">{}</div>"#, format_text(text)),
        Entry::Error(text) => format!(
            r#"<div class="msg-ai" style="color:#dc2626;">Error: {}</div>"#,
            escape_html(text)
        ),
    }
}

/// Markup for the content area: one block per transcript entry, plus the
/// loading indicator while an answer is pending.
pub fn render_html(modal: &ModalPresenter) -> String {
    let mut html = String::new();
    for entry in modal.transcript() {
        html.push_str(r#"<div class="message-block">"#);
        html.push_str(&entry_html(entry));
        html.push_str("</div>");
    }
    if let Some(label) = modal.loading_label() {
        html.push_str(&format!(
            r#"<div class="loading">{}</div>"#,
            escape_html(label)
        ));
    }
    html
}

/// Plain-text rendering of a single entry for the terminal front-end.
pub fn render_terminal(entry: &Entry) -> String {
    match entry {
        Entry::User(text) => format!("> {}", text),
        Entry::Answer(text) => text.clone(),
        Entry::Error(text) => format!("Error: {}", text),
    }
}
