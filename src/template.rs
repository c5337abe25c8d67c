//! Render expected output from a template file

/// Render the [Handlebars] template at `path` with `data`
///
/// Output is not HTML-escaped.  Referencing a field missing from `data` is an error.
///
/// ```text
/// Version: {{Version}}
/// Authors:
/// {{#each Authors}}
///   - {{this}}
/// {{/each}}
/// ```
///
/// [Handlebars]: https://handlebarsjs.com/
pub fn render_file<T>(path: impl AsRef<std::path::Path>, data: &T) -> crate::Result<String>
where
    T: serde::Serialize,
{
    let path = path.as_ref();
    let template = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    render(&template, data).map_err(|e| format!("Failed to render {}: {}", path.display(), e).into())
}

pub(crate) fn render<T>(template: &str, data: &T) -> Result<String, handlebars::RenderError>
where
    T: serde::Serialize,
{
    let mut registry = handlebars::Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry.render_template(template, data)
}
