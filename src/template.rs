use crate::ast::AstNode;
use crate::context::{Context, Scope};
use crate::error::MinibarsResult;
use crate::escape::push_escaped;
use crate::options::Options;
use crate::parser::parse;
use crate::value::is_truthy;

/// How a template reads a root-context path.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathUsage {
    /// Emitted by a `{{path}}` or `{{{path}}}` placeholder.
    Output,
    /// Tested by `{{#if}}` or `{{#unless}}`.
    Condition,
    /// Iterated by `{{#each}}`.
    Sequence,
}

/// A parsed template that can be rendered any number of times.
///
/// Parsing happens once, in [`Template::parse`] or [`Template::parse_with`];
/// rendering walks the parsed nodes against a context and cannot fail.
///
/// # Example
///
/// ```rust
/// use minibars::{Context, Template, Value};
///
/// let template = Template::parse("{{#each items}}{{@index}}:{{name}};{{/each}}");
///
/// let items = vec![
///     [("name", "a")].into_iter().collect::<Value>(),
///     [("name", "b")].into_iter().collect::<Value>(),
/// ];
/// let context = Context::new().insert("items", items).to_owned();
///
/// assert_eq!(template.render(&context), "0:a;1:b;");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    source: &'a str,
    nodes: Vec<AstNode<'a>>,
}

impl<'a> Template<'a> {
    /// Parses a template leniently: syntax that does not form a complete
    /// directive is kept as literal text.
    pub fn parse(source: &'a str) -> Self {
        match parse(source, &Options::default()) {
            Ok(nodes) => Self { source, nodes },
            Err(error) => {
                // Lenient parsing reports nothing, so this arm is unreachable.
                tracing::error!(%error, "Lenient parse failed, rendering source verbatim");
                Self {
                    source,
                    nodes: vec![AstNode::Text(source)],
                }
            }
        }
    }

    /// Parses a template with explicit options.
    ///
    /// # Errors
    ///
    /// Returns `MinibarsError::Parse` only when `options.strict` is set and
    /// the source contains malformed or unbalanced tags.
    pub fn parse_with(source: &'a str, options: &Options) -> MinibarsResult<Self> {
        let nodes = parse(source, options)?;
        Ok(Self { source, nodes })
    }

    pub const fn source(&self) -> &'a str {
        self.source
    }

    pub fn render(&self, context: &Context) -> String {
        let mut output = String::with_capacity(self.source.len());
        render_nodes(&self.nodes, &Scope::Root(context), &mut output);
        output
    }

    /// Lists the distinct root-context paths this template reads, in order
    /// of first appearance.
    ///
    /// Paths inside `{{#each}}` bodies resolve against each element first and
    /// are left out, as are `this` and `@`-prefixed paths.
    ///
    /// ```
    /// use minibars::{PathUsage, Template};
    ///
    /// let template = Template::parse("{{#if user.admin}}{{user.name}}{{/if}}");
    /// assert_eq!(
    ///     template.variables(),
    ///     vec![("user.admin", PathUsage::Condition), ("user.name", PathUsage::Output)]
    /// );
    /// ```
    pub fn variables(&self) -> Vec<(&'a str, PathUsage)> {
        let mut variables = Vec::new();
        collect_variables(&self.nodes, &mut variables);
        variables
    }
}

/// Renders `template` against `context`, keeping malformed syntax as text.
///
/// ```
/// use minibars::{Context, render};
///
/// let context = Context::new().insert("x", "<b>").to_owned();
/// assert_eq!(render("{{x}} {{{x}}}", &context), "&lt;b&gt; <b>");
/// ```
pub fn render(template: &str, context: &Context) -> String {
    Template::parse(template).render(context)
}

/// Renders `template` against `context` with explicit parse options.
///
/// # Errors
///
/// Returns `MinibarsError::Parse` when `options.strict` is set and the
/// template is malformed.
pub fn render_with(template: &str, context: &Context, options: &Options) -> MinibarsResult<String> {
    Ok(Template::parse_with(template, options)?.render(context))
}

fn render_nodes(nodes: &[AstNode<'_>], scope: &Scope<'_>, output: &mut String) {
    for node in nodes {
        render_node(node, scope, output);
    }
}

fn render_node(node: &AstNode<'_>, scope: &Scope<'_>, output: &mut String) {
    match node {
        AstNode::Text(text) => output.push_str(text),
        AstNode::Placeholder { path, escaped } => {
            if let Some(value) = scope.resolve(path) {
                let text = value.to_text();
                if *escaped {
                    push_escaped(output, &text);
                } else {
                    output.push_str(&text);
                }
            }
        }
        AstNode::Conditional {
            path,
            then_body,
            else_body,
        } => {
            if is_truthy(scope.resolve(path).as_deref()) {
                render_nodes(then_body, scope, output);
            } else if let Some(else_body) = else_body {
                render_nodes(else_body, scope, output);
            }
        }
        AstNode::NegatedConditional { path, body } => {
            if !is_truthy(scope.resolve(path).as_deref()) {
                render_nodes(body, scope, output);
            }
        }
        AstNode::Loop { path, body } => {
            let resolved = scope.resolve(path);
            let Some(items) = resolved.as_deref().and_then(|value| value.as_sequence()) else {
                return;
            };
            let count = items.len();
            for (index, element) in items.iter().enumerate() {
                let item_scope = Scope::item(scope, element, index, count);
                render_nodes(body, &item_scope, output);
            }
        }
    }
}

fn collect_variables<'a>(nodes: &[AstNode<'a>], variables: &mut Vec<(&'a str, PathUsage)>) {
    for node in nodes {
        match node {
            AstNode::Text(_) => {}
            AstNode::Placeholder { path, .. } => record(*path, PathUsage::Output, variables),
            AstNode::Conditional {
                path,
                then_body,
                else_body,
            } => {
                record(*path, PathUsage::Condition, variables);
                collect_variables(then_body, variables);
                if let Some(else_body) = else_body {
                    collect_variables(else_body, variables);
                }
            }
            AstNode::NegatedConditional { path, body } => {
                record(*path, PathUsage::Condition, variables);
                collect_variables(body, variables);
            }
            AstNode::Loop { path, .. } => record(*path, PathUsage::Sequence, variables),
        }
    }
}

fn record<'a>(path: &'a str, usage: PathUsage, variables: &mut Vec<(&'a str, PathUsage)>) {
    let root = path.split('.').next().unwrap_or(path);
    if root == "this" || root.starts_with('@') {
        return;
    }
    if !variables.iter().any(|(known, _)| *known == path) {
        variables.push((path, usage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MinibarsError, ParseErrorKind};
    use crate::value::Value;

    fn item(name: &str) -> Value {
        [("name", name)].into_iter().collect()
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_template_is_reusable() {
        let template = Template::parse("Hello, {{name}}!");
        let first = Context::new().insert("name", "Ada").to_owned();
        let second = Context::new().insert("name", "Grace").to_owned();
        assert_eq!(template.render(&first), "Hello, Ada!");
        assert_eq!(template.render(&second), "Hello, Grace!");
        assert_eq!(template.source(), "Hello, {{name}}!");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_placeholder_stringification() {
        let context = Context::new()
            .insert("count", 3)
            .insert("ratio", 0.5)
            .insert("flag", false)
            .insert("nothing", Value::Null)
            .to_owned();
        assert_eq!(
            render("{{count}}|{{ratio}}|{{flag}}|{{nothing}}|{{absent}}", &context),
            "3|0.5|false||"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_escaping_applies_to_escaped_placeholders_only() {
        let context = Context::new().insert("html", "<i>\"Q&A\"</i>").to_owned();
        assert_eq!(
            render("{{html}}", &context),
            "&lt;i&gt;&quot;Q&amp;A&quot;&lt;/i&gt;"
        );
        assert_eq!(render("{{{html}}}", &context), "<i>\"Q&A\"</i>");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_literal_text_is_never_escaped() {
        let context = Context::new();
        assert_eq!(render("<p>&amp;</p>", &context), "<p>&amp;</p>");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_values_are_not_reparsed() {
        let context = Context::new()
            .insert("payload", "{{secret}}")
            .insert("secret", "leaked")
            .to_owned();
        assert_eq!(render("{{{payload}}}", &context), "{{secret}}");
        assert_eq!(render("{{payload}}", &context), "{{secret}}");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_each_over_scalars() {
        let context = Context::new().insert("tags", vec!["a", "b", "c"]).to_owned();
        assert_eq!(
            render(
                "{{#each tags}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}",
                &context
            ),
            "a, b, c"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_each_first_marker() {
        let context = Context::new()
            .insert("items", vec![item("a"), item("b")])
            .to_owned();
        assert_eq!(
            render("{{#each items}}{{#if @first}}[{{/if}}{{name}}{{/each}}]", &context),
            "[ab]"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_each_over_non_sequence_is_empty() {
        let context = Context::new()
            .insert("text", "abc")
            .insert("mapping", item("x"))
            .insert("empty", Vec::<Value>::new())
            .to_owned();
        for path in ["text", "mapping", "empty", "absent"] {
            let template = format!("<{{{{#each {path}}}}}x{{{{/each}}}}>");
            assert_eq!(render(&template, &context), "<>", "path {path}");
        }
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_each_falls_back_to_parent_scope() {
        let context = Context::new()
            .insert("currency", "NZD")
            .insert("name", "outer")
            .insert("items", vec![item("a")])
            .to_owned();
        assert_eq!(
            render("{{#each items}}{{name}} {{currency}}{{/each}} {{name}}", &context),
            "a NZD outer"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_nested_each_markers_are_innermost() {
        let rows: Vec<Value> = vec![
            [("cells", vec!["a", "b"])].into_iter().collect(),
            [("cells", vec!["c"])].into_iter().collect(),
        ];
        let context = Context::new().insert("rows", rows).to_owned();
        assert_eq!(
            render(
                "{{#each rows}}{{@index}}:{{#each cells}}{{@index}}{{this}}{{/each}};{{/each}}",
                &context
            ),
            "0:0a1b;1:0c;"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_caller_context_is_untouched() {
        let context = Context::new()
            .insert("items", vec![item("a"), item("b")])
            .to_owned();
        let before = context.clone();
        let _ = render("{{#each items}}{{@index}}{{name}}{{/each}}", &context);
        assert_eq!(context, before);
        assert!(!context.contains("@index"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_render_with_strict_options() {
        let options = Options::new().strict(true);
        let context = Context::new().insert("a", true).to_owned();
        assert_eq!(
            render_with("{{#if a}}yes{{/if}}", &context, &options).unwrap(),
            "yes"
        );
        let result = render_with("{{#if a}}yes", &context, &options);
        assert!(matches!(
            result,
            Err(MinibarsError::Parse(ref error))
                if error.kind == ParseErrorKind::UnclosedBlock { keyword: "if".to_string() }
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_variables() {
        let template = Template::parse(concat!(
            "{{title}}{{#unless hidden}}{{{body}}}{{/unless}}",
            "{{#each items}}{{name}}{{/each}}",
            "{{#if user.admin}}{{title}}{{else}}{{this}}{{@index}}{{/if}}"
        ));
        assert_eq!(
            template.variables(),
            vec![
                ("title", PathUsage::Output),
                ("hidden", PathUsage::Condition),
                ("body", PathUsage::Output),
                ("items", PathUsage::Sequence),
                ("user.admin", PathUsage::Condition),
            ]
        );
    }
}
