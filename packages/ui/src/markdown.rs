use pulldown_cmark::{html, Parser};

/// Render note content as CommonMark HTML for the preview pane.
pub fn render_preview(content: &str) -> String {
    let parser = Parser::new(content);
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_commonmark() {
        assert_eq!(render_preview("# Title"), "<h1>Title</h1>\n");
        assert_eq!(
            render_preview("some **bold** text"),
            "<p>some <strong>bold</strong> text</p>\n"
        );
        assert_eq!(render_preview("- a\n- b"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(render_preview(""), "");
    }
}
