use std::collections::{HashMap, HashSet};

pub fn http_protocol_str() -> &'static str {
    if cfg!(debug_assertions) {
        "http"
    } else {
        "https"
    }
}

pub fn generate_slug(title: &str) -> String {
    slug::slugify(title)
}

/// Reduces user-submitted post content to a small allowlist of formatting
/// tags before it is stored.
pub fn sanitize_html(content: &str) -> String {
    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", HashSet::from(["href", "name", "target"]));
    tag_attributes.insert("img", HashSet::from(["src"]));
    ammonia::Builder::default()
        .tags(HashSet::from([
            "b", "i", "em", "strong", "a", "p", "ul", "li", "br", "img",
        ]))
        .tag_attributes(tag_attributes)
        .clean(content)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_slug() {
        assert_eq!("my-first-post", generate_slug("My First Post"));
        assert_eq!("rusts-borrow-checker", generate_slug("Rust's Borrow Checker!"));
    }

    #[test]
    fn test_sanitize_html() {
        assert_eq!(
            "<p>hello <strong>world</strong></p>",
            sanitize_html("<p>hello <strong>world</strong></p>")
        );
        assert_eq!("hi", sanitize_html("<script>alert(1)</script>hi"));
        assert_eq!(
            r#"<a href="https://example.com" rel="noopener noreferrer">x</a>"#,
            sanitize_html(r#"<a href="https://example.com" onclick="evil()">x</a>"#)
        );
    }
}
