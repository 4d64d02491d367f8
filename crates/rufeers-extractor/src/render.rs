//! HTML rendering of entities and dependency arcs

use std::fmt::Write;

use rufeers_core::document::CharIndex;
use rufeers_core::ParsedDocument;

/// Escape text for inclusion in HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn escape_text(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Document text with every entity span highlighted and labelled
pub fn render_entities(doc: &ParsedDocument) -> String {
    let chars = CharIndex::new(doc.text());
    let text_len = chars.len();
    let mut html = String::from("<div class=\"entities\">");
    let mut cursor = 0;

    for entity in doc.entities() {
        if entity.start < cursor {
            continue;
        }
        let before = chars.slice(cursor, entity.start).unwrap_or_default();
        html.push_str(&escape_text(before));

        let label = escape_html(&entity.label);
        let _ = write!(
            html,
            "<mark class=\"entity\" data-label=\"{label}\">{} <span class=\"entity-label\">{label}</span></mark>",
            escape_text(&entity.text)
        );
        cursor = entity.end;
    }

    if cursor < text_len {
        html.push_str(&escape_text(
            chars.slice(cursor, text_len).unwrap_or_default(),
        ));
    }
    html.push_str("</div>");
    html
}

/// One table row per token: token, relation, head and part of speech
pub fn render_dependencies(doc: &ParsedDocument) -> String {
    let mut html = String::from(
        "<table class=\"dependencies\">\
         <thead><tr><th>Token</th><th>Dependency</th><th>Head</th><th>POS</th></tr></thead>\
         <tbody>",
    );

    for token in doc.tokens() {
        let head = doc
            .head_of(token.id)
            .map(|h| h.text.as_str())
            .unwrap_or_default();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&token.text),
            escape_html(&token.dep),
            escape_html(head),
            escape_html(&token.pos),
        );
    }

    html.push_str("</tbody></table>");
    html
}

/// Standalone page holding both visualizations
pub fn render_page(doc: &ParsedDocument, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title>\n\
         <style>\
         mark.entity {{ background: #ddd6fe; padding: 0.2em 0.35em; border-radius: 0.3em; }}\
         span.entity-label {{ font-size: 0.75em; font-weight: bold; margin-left: 0.4em; }}\
         table.dependencies td, table.dependencies th {{ padding: 0.2em 0.8em; text-align: left; }}\
         </style></head>\n<body>\n<h2>Entity Visualization</h2>\n{}\n\
         <h2>Dependencies</h2>\n{}\n</body>\n</html>\n",
        render_entities(doc),
        render_dependencies(doc),
        title = escape_html(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rufeers_core::DocumentBuilder;

    fn sample() -> ParsedDocument {
        DocumentBuilder::new()
            .word("Khan", 1, "nsubj")
            .word("left", 1, "ROOT")
            .word("<Lahore>", 1, "dobj")
            .entity(0..1, "PERSON")
            .entity(2..3, "LOC")
            .build()
            .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_entities() {
        let html = render_entities(&sample());

        assert_eq!(
            html,
            "<div class=\"entities\">\
             <mark class=\"entity\" data-label=\"PERSON\">Khan <span class=\"entity-label\">PERSON</span></mark>\
             \u{20}left \
             <mark class=\"entity\" data-label=\"LOC\">&lt;Lahore&gt; <span class=\"entity-label\">LOC</span></mark>\
             </div>"
        );
    }

    #[test]
    fn test_render_entities_without_entities() {
        let doc = DocumentBuilder::new()
            .word("line\none", 0, "ROOT")
            .build()
            .unwrap();
        assert_eq!(
            render_entities(&doc),
            "<div class=\"entities\">line<br>one</div>"
        );
    }

    #[test]
    fn test_render_entities_large_document() {
        const WORDS: usize = 20_000;

        let mut builder = DocumentBuilder::new();
        for i in 0..WORDS {
            builder = builder.word(&format!("ö{i}"), 0, "dep");
        }
        for i in (0..WORDS).step_by(2) {
            builder = builder.entity(i..i + 1, "LOC");
        }
        let doc = builder.build().unwrap();

        let html = render_entities(&doc);
        assert_eq!(html.matches("<mark ").count(), WORDS / 2);
        assert!(html.ends_with(&format!(" ö{}</div>", WORDS - 1)));
    }

    #[test]
    fn test_render_dependencies() {
        let html = render_dependencies(&sample());
        assert!(html.contains("<tr><td>Khan</td><td>nsubj</td><td>left</td><td></td></tr>"));
        assert!(html.contains("<td>&lt;Lahore&gt;</td>"));
        assert!(html.ends_with("</tbody></table>"));
    }

    #[test]
    fn test_render_page() {
        let page = render_page(&sample(), "RUFEERS <report>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>RUFEERS &lt;report&gt;</title>"));
        assert!(page.contains("<h2>Entity Visualization</h2>"));
        assert!(page.contains("class=\"dependencies\""));
    }
}
