//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";
const THINK_OPEN_HTML: &str = "<div id=\"think\">";
const THINK_CLOSE_HTML: &str = "</div>";

/// Replace the first `<think>` and the first `</think>` with a wrapping div.
///
/// Later occurrences are left untouched.
pub fn substitute_think_markers(text: &str) -> String {
    text.replacen(THINK_OPEN, THINK_OPEN_HTML, 1)
        .replacen(THINK_CLOSE, THINK_CLOSE_HTML, 1)
}

/// Convert accumulated Markdown to HTML.
///
/// Incomplete Markdown (an unclosed code fence mid-stream, say) renders
/// without error; the next render picks up the completed text.
pub fn render_html(markdown: &str) -> String {
    let text = substitute_think_markers(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&text, options);
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_first_markers_only() {
        let text = "<think>a</think> b <think>c</think>";
        assert_eq!(
            substitute_think_markers(text),
            "<div id=\"think\">a</div> b <think>c</think>"
        );
    }

    #[test]
    fn test_substitute_without_markers() {
        assert_eq!(substitute_think_markers("plain"), "plain");
    }

    #[test]
    fn test_substitute_unclosed_think() {
        assert_eq!(
            substitute_think_markers("<think>still going"),
            "<div id=\"think\">still going"
        );
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = render_html("**Model:** llava\n\nA cat on a mat.");
        assert!(html.contains("<strong>Model:</strong> llava"));
        assert!(html.contains("<p>A cat on a mat.</p>"));
    }

    #[test]
    fn test_render_heading_and_emphasis() {
        let html = render_html("### cat.png\n\n_Waiting…_");
        assert!(html.contains("<h3>cat.png</h3>"));
        assert!(html.contains("<em>Waiting…</em>"));
    }

    #[test]
    fn test_render_table() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_render_think_block() {
        let html = render_html("<think>\nreasoning\n</think>\n\nAnswer");
        assert!(html.contains("<div id=\"think\">"));
        assert!(html.contains("Answer"));
    }

    #[test]
    fn test_render_incomplete_code_fence() {
        let html = render_html("```rust\nfn main() {");
        assert!(html.contains("<code"));
        assert!(html.contains("fn main() {"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_html(""), "");
    }
}
