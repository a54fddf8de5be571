//! Template rendering for tag templates and manifest files

use serde::Serialize;
use tera::{Context, Tera};

use crate::errors::DeployError;

/// Render `template` against the fields of `vars`.
///
/// Fails with [`DeployError::TemplateError`] on malformed syntax or when the template
/// references a variable that `vars` does not define.
///
/// `{{`, `{%` and `{#` all open a tag, so literal text containing them (shell such as
/// `${#ARGS[@]}`) must be wrapped in `{% raw %}...{% endraw %}`.
pub fn render<T: Serialize>(template: &str, vars: &T) -> Result<String, DeployError> {
    let context = Context::from_serialize(vars)?;
    let rendered = Tera::one_off(template, &context, false)?;
    Ok(rendered)
}
