use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("readability pattern should compile")
}

pub static BLACKLIST: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)popupbody"));

pub static MAYBE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)and|article|body|column|main|shadow|post"));

pub static UNLIKELY_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)combx|comment|community|hidden|disqus|modal|extra|foot|header|menu|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup",
    )
});

pub static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)combx|comment|com-|foot|footer|footnote|masthead|media|meta|outbrain|promo|related|scroll|shoutbox|sidebar|sponsor|shopping|tags|tool|widget",
    )
});

pub static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)article|body|content|entry|hentry|main|page|pagination|post|text|blog|story")
});

/// A period followed by a space or the end of the text
pub static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| compile(r"\.( |$)"));

/// Tags that may appear inside a `<div>` and keep it from being read as a paragraph
pub const DIV_BLOCK_TAGS: &[&str] = &[
    "a", "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "select",
];

/// Rendered without a closing tag
pub const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "embed", "input", "link", "meta", "param", "source", "track", "hr", "img",
    "br",
];

/// The only attributes carried into the extracted fragment, in output order
pub const ALLOWED_ATTRIBUTES: &[&str] = &["src", "href", "width", "height", "frameborder"];

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "h7"];

pub const INTERACTIVE_TAGS: &[&str] = &[
    "input", "select", "textarea", "button", "object", "iframe", "embed",
];

/// Separators between an article title and the site name
pub const TITLE_SEPARATORS: &[&str] = &[" | ", " _ ", " - ", "«", "»", "—"];

/// Class attached to paragraphs the extractor synthesizes around loose text
pub const STYLED_MARKER: &str = "readability-styled";
