/// Block nesting allowed before openers stop being treated as blocks.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parse behaviour shared by every template rendered with these options.
///
/// # Examples
///
/// ```
/// use minibars::{Context, Options, render_with};
///
/// let strict = Options::new().strict(true);
/// assert!(render_with("{{#if open}}never closed", &Context::new(), &strict).is_err());
///
/// let lenient = Options::default();
/// assert_eq!(
///     render_with("{{#if open}}never closed", &Context::new(), &lenient).unwrap(),
///     "{{#if open}}never closed"
/// );
///
/// let padded = Options::new().allow_padding(true);
/// let context = Context::new().insert("name", "Ada").to_owned();
/// assert_eq!(render_with("{{ name }}", &context, &padded).unwrap(), "Ada");
/// assert_eq!(render_with("{{ name }}", &context, &lenient).unwrap(), "{{ name }}");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Options {
    /// Report malformed syntax as an error instead of emitting it verbatim.
    pub strict: bool,
    /// Blocks nested deeper than this keep their tags as literal text, or fail
    /// to parse in strict mode. The
    /// parsed template is never deeper than this, which bounds recursion
    /// while rendering.
    pub max_depth: usize,
    /// Accept ASCII whitespace just inside tag delimiters, as in `{{ name }}`
    /// or `{{#if  flag }}`. Off by default, so padded tags are literal text.
    pub allow_padding: bool,
}

impl Options {
    pub const fn new() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_padding: false,
        }
    }

    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn allow_padding(mut self, allow_padding: bool) -> Self {
        self.allow_padding = allow_padding;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
