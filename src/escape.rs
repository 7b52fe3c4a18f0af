use std::borrow::Cow;

/// Escapes `&`, `<`, `>`, `"` and `'` so the text is safe inside HTML
/// element content and quoted attribute values.
///
/// Input without any of those characters is returned borrowed.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len().saturating_add(16));
    push_escaped(&mut escaped, input);
    Cow::Owned(escaped)
}

pub(crate) fn push_escaped(output: &mut String, input: &str) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(ch),
        }
    }
}
