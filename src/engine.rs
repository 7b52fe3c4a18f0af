use crate::context::Context;
use crate::error::MinibarsResult;
use crate::loader::{TemplateLoader, TemplateSource};
use crate::options::Options;
use crate::template::Template;

/// `MinibarsEngine` renders named templates fetched through a cached
/// [`TemplateLoader`], parsing each one with the engine's [`Options`].
///
/// # Examples
///
/// ```
/// use minibars::{Context, MemorySource, MinibarsEngine};
///
/// // Register templates with a source
/// let mut source = MemorySource::new();
/// source.add_template("greeting", "Hello, {{name}}!").unwrap();
///
/// // Create an engine over it
/// let engine = MinibarsEngine::new(source);
///
/// // Setup context
/// let context = Context::new().insert("name", "World").to_owned();
///
/// // Render template
/// let output = engine.render("greeting", &context).unwrap();
/// assert_eq!(output, "Hello, World!");
/// ```
#[derive(Debug)]
pub struct MinibarsEngine<S> {
    loader: TemplateLoader<S>,
    options: Options,
}

impl<S: TemplateSource> MinibarsEngine<S> {
    /// Creates an engine with default (lenient) options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, Options::default())
    }

    pub fn with_options(source: S, options: Options) -> Self {
        Self {
            loader: TemplateLoader::new(source),
            options,
        }
    }

    pub const fn loader(&self) -> &TemplateLoader<S> {
        &self.loader
    }

    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Loads the named template (from cache when possible) and renders it.
    ///
    /// # Errors
    ///
    /// * `MinibarsError::MissingTemplate` or `MinibarsError::TemplateLoad` if
    ///   the template cannot be fetched
    /// * `MinibarsError::Parse` if strict options reject the template
    ///
    /// # Examples
    ///
    /// ```
    /// use minibars::{Context, MemorySource, MinibarsEngine, MinibarsError};
    ///
    /// let engine = MinibarsEngine::new(MemorySource::new());
    /// let result = engine.render("missing", &Context::new());
    /// assert!(matches!(result, Err(MinibarsError::MissingTemplate { .. })));
    /// ```
    pub fn render<N: AsRef<str>>(&self, template_name: N, context: &Context) -> MinibarsResult<String> {
        let text = self.loader.load(template_name.as_ref())?;
        self.render_str(&text, context)
    }

    /// Renders inline template text with the engine's options.
    ///
    /// # Errors
    ///
    /// * `MinibarsError::Parse` if strict options reject the template
    pub fn render_str(&self, template: &str, context: &Context) -> MinibarsResult<String> {
        let template = Template::parse_with(template, &self.options)?;
        Ok(template.render(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MinibarsError, ParseErrorKind};
    use crate::loader::MemorySource;

    fn engine_with(options: Options) -> MinibarsEngine<MemorySource> {
        let mut source = MemorySource::new();
        source
            .add_template("list", "{{#each items}}{{this}};{{/each}}")
            .unwrap();
        source.add_template("broken", "{{#if a}}open").unwrap();
        MinibarsEngine::with_options(source, options)
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_render_named_template() {
        let engine = engine_with(Options::default());
        let context = Context::new().insert("items", vec![1, 2]).to_owned();
        assert_eq!(engine.render("list", &context).unwrap(), "1;2;");
        assert!(engine.loader().is_cached("list"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_lenient_engine_keeps_broken_syntax() {
        let engine = engine_with(Options::default());
        assert_eq!(
            engine.render("broken", &Context::new()).unwrap(),
            "{{#if a}}open"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_strict_engine_reports_broken_syntax() {
        let engine = engine_with(Options::new().strict(true));
        assert!(engine.options().strict);
        assert!(matches!(
            engine.render("broken", &Context::new()),
            Err(MinibarsError::Parse(ref error))
                if matches!(error.kind, ParseErrorKind::UnclosedBlock { .. })
        ));
        // Load succeeded, so the text stays cached even though parsing failed.
        assert!(engine.loader().is_cached("broken"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_missing_template() {
        let engine = engine_with(Options::default());
        assert_eq!(
            engine.render("nope", &Context::new()),
            Err(MinibarsError::MissingTemplate {
                template_name: "nope".to_string()
            })
        );
        assert!(!engine.loader().is_cached("nope"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_render_str_uses_engine_options() {
        let engine = engine_with(Options::new().strict(true));
        assert!(engine.render_str("{{/each}}", &Context::new()).is_err());
        assert_eq!(
            engine
                .render_str("{{#unless a}}none{{/unless}}", &Context::new())
                .unwrap(),
            "none"
        );
    }
}
