//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use corag_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the system template (if any) and the user template with
/// Handlebars. Strict mode is on: a template that references a variable the
/// caller did not supply is an error, which catches broken overrides early.
///
/// # Example
/// ```no_run
/// use corag_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "grade.answer")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Why was Socrates executed?".to_string());
/// vars.insert("generation".to_string(), "For impiety.".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt { system, user })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptOutputSpec;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
            temperature: None,
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{question}}", &vars(&[("question", "Hi")]));
        assert_eq!(result.unwrap(), "Question: Hi");
    }

    #[test]
    fn test_no_html_escaping() {
        let result = render_template("{{document}}", &vars(&[("document", "a < b & \"c\"")]));
        assert_eq!(result.unwrap(), "a < b & \"c\"");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_build_prompt_renders_system_and_user() {
        let def = definition(Some("Context:\n{{context}}"), "Q: {{question}}");
        let built = build_prompt(
            &def,
            vars(&[("context", "Socrates drank hemlock."), ("question", "How?")]),
        )
        .unwrap();

        assert_eq!(built.system.as_deref(), Some("Context:\nSocrates drank hemlock."));
        assert_eq!(built.user, "Q: How?");
    }

    #[test]
    fn test_build_prompt_without_system() {
        let def = definition(None, "{{question}}");
        let built = build_prompt(&def, vars(&[("question", "x")])).unwrap();
        assert!(built.system.is_none());
    }
}
