//! Rich-formatted text values
//!
//! The editor hands over formatted text as plain text plus inline format
//! spans. [`RichText::to_html`] serializes that into canonical markup, closing
//! and reopening tags where spans overlap so the output is always well nested.

use serde_json::Value;

/// Inline format applied to a span of text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    /// `<strong>`
    Bold,
    /// `<em>`
    Italic,
    /// `<code>`
    Code,
    /// `<a href="...">`
    Link {
        /// Link target
        href: String,
    },
    /// `<s>`
    Strikethrough,
    /// `<sub>`
    Subscript,
    /// `<sup>`
    Superscript,
    /// `<mark>`
    Highlight,
    /// `<kbd>`
    Keyboard,
}

impl InlineFormat {
    /// HTML tag name
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Code => "code",
            Self::Link { .. } => "a",
            Self::Strikethrough => "s",
            Self::Subscript => "sub",
            Self::Superscript => "sup",
            Self::Highlight => "mark",
            Self::Keyboard => "kbd",
        }
    }

    /// Parse a format from its editor name and attributes
    ///
    /// Accepts both tag names (`strong`) and editor format names
    /// (`core/bold`). Links need a `url` or `href` attribute.
    #[must_use]
    pub fn from_name(name: &str, attributes: Option<&Value>) -> Option<Self> {
        let format = match name {
            "strong" | "b" | "core/bold" => Self::Bold,
            "em" | "i" | "core/italic" => Self::Italic,
            "code" | "core/code" => Self::Code,
            "s" | "core/strikethrough" => Self::Strikethrough,
            "sub" | "core/subscript" => Self::Subscript,
            "sup" | "core/superscript" => Self::Superscript,
            "mark" | "core/text-color" | "core/highlight" => Self::Highlight,
            "kbd" | "core/keyboard" => Self::Keyboard,
            "a" | "core/link" => {
                let attributes = attributes?;
                let href = attributes
                    .get("url")
                    .or_else(|| attributes.get("href"))
                    .and_then(Value::as_str)?;
                Self::Link {
                    href: href.to_owned(),
                }
            }
            _ => return None,
        };
        Some(format)
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag());
        if let Self::Link { href } = self {
            out.push_str(" href=\"");
            escape_into(href, true, out);
            out.push('"');
        }
        out.push('>');
    }

    fn write_close(&self, out: &mut String) {
        out.push_str("</");
        out.push_str(self.tag());
        out.push('>');
    }
}

/// Format applied to the character range `start..end`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatSpan {
    /// First character offset (inclusive)
    pub start: usize,
    /// Last character offset (exclusive)
    pub end: usize,
    /// Applied format
    pub format: InlineFormat,
}

/// Text with inline formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    text: String,
    spans: Vec<FormatSpan>,
}

impl RichText {
    /// Unformatted rich text
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Apply `format` to characters `start..end`
    #[must_use]
    pub fn with_format(mut self, start: usize, end: usize, format: InlineFormat) -> Self {
        self.spans.push(FormatSpan { start, end, format });
        self
    }

    /// Plain text without markup
    #[inline]
    #[must_use]
    pub fn plain_text(&self) -> &str {
        &self.text
    }

    /// Format spans as given
    #[inline]
    #[must_use]
    pub fn spans(&self) -> &[FormatSpan] {
        &self.spans
    }

    /// Parse `{ "text": ..., "formats": [{ "start", "end", "type", "attributes"? }] }`
    ///
    /// Returns `None` unless `text` is a string and `formats` an array.
    /// Individual spans that are malformed or use unknown formats are dropped.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let text = value.get("text")?.as_str()?;
        let formats = value.get("formats")?.as_array()?;

        let spans = formats
            .iter()
            .filter_map(|span| {
                let start = usize::try_from(span.get("start")?.as_u64()?).ok()?;
                let end = usize::try_from(span.get("end")?.as_u64()?).ok()?;
                let name = span.get("type")?.as_str()?;
                let format = InlineFormat::from_name(name, span.get("attributes"))?;
                Some(FormatSpan { start, end, format })
            })
            .collect();

        Some(Self {
            text: text.to_owned(),
            spans,
        })
    }

    /// Serialize to HTML markup
    #[must_use]
    pub fn to_html(&self) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        let len = chars.len();

        // Outer spans (earlier start, later end) open first.
        let mut spans: Vec<&FormatSpan> = self
            .spans
            .iter()
            .filter(|s| s.start < s.end.min(len))
            .collect();
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut out = String::with_capacity(self.text.len());
        let mut open: Vec<&FormatSpan> = Vec::new();

        for (pos, ch) in chars.iter().enumerate() {
            let active = |s: &FormatSpan| s.start <= pos && pos < s.end;

            // Close down to the outermost span that ended, then reopen the
            // still-active spans that were nested inside it.
            if let Some(depth) = open.iter().position(|s| !active(*s)) {
                let closed = open.split_off(depth);
                for span in closed.iter().rev() {
                    span.format.write_close(&mut out);
                }
                for span in closed.into_iter().filter(|s| active(*s)) {
                    span.format.write_open(&mut out);
                    open.push(span);
                }
            }

            for &span in &spans {
                if active(span) && !open.iter().any(|o| std::ptr::eq(*o, span)) {
                    span.format.write_open(&mut out);
                    open.push(span);
                }
            }

            push_escaped(*ch, false, &mut out);
        }

        for span in open.iter().rev() {
            span.format.write_close(&mut out);
        }

        out
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        push_escaped(ch, attribute, out);
    }
}

fn push_escaped(ch: char, attribute: bool, out: &mut String) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' if attribute => out.push_str("&quot;"),
        _ => out.push(ch),
    }
}
