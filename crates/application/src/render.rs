//! 消息正文渲染
//!
//! 富文本渲染器可以替换，默认实现只做 HTML 转义和换行处理。

pub trait TextRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// 转义 HTML 并把换行变成 `<br>`
#[derive(Debug, Default)]
pub struct EscapingRenderer;

impl TextRenderer for EscapingRenderer {
    fn render(&self, text: &str) -> String {
        html_escape(text.trim()).replace('\n', "<br>")
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_neutralised() {
        let out = EscapingRenderer.render("<script>alert('x')</script>");
        assert_eq!(out, "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
    }

    #[test]
    fn newlines_become_breaks() {
        assert_eq!(EscapingRenderer.render("  a\nb & c \n"), "a<br>b &amp; c");
    }
}
