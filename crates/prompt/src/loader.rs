//! Prompt loader: workspace overrides first, built-ins second.

use crate::builtin::{builtin_prompt, BUILTIN_IDS};
use crate::types::{PromptDefinition, PromptOrigin};
use corag_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".corag/prompts")
}

/// Load a prompt definition by ID.
///
/// `.corag/prompts/<id>.yml` wins when present; otherwise the built-in
/// definition is returned. An override that exists but fails to parse is an
/// error rather than a silent fallback.
///
/// # Example
/// ```no_run
/// use corag_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "grade.document")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        tracing::debug!("Using built-in prompt: {}", prompt_id);
        return builtin_prompt(prompt_id);
    }

    tracing::debug!("Loading prompt override from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}'",
            prompt_file, definition.id
        )));
    }

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs with their origin.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<(String, PromptOrigin)>> {
    let mut prompts: BTreeMap<String, PromptOrigin> = BUILTIN_IDS
        .iter()
        .map(|id| (id.to_string(), PromptOrigin::Builtin))
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompts.insert(stem.to_string(), PromptOrigin::Workspace);
                }
            }
        }
    }

    Ok(prompts.into_iter().collect())
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::GRADE_DOCUMENT;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, file_id: &str, declared_id: &str) -> PathBuf {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();

        let content = format!(
            r#"
id: {}
title: "Strict relevance"
apiVersion: "1.0"
system: "Only exact matches count."
template: "{{{{question}}}} / {{{{document}}}}"
output:
  format: json
"#,
            declared_id
        );

        let file_path = prompts.join(format!("{}.yml", file_id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_when_no_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), GRADE_DOCUMENT).unwrap();
        assert_eq!(prompt.id, GRADE_DOCUMENT);
        assert!(prompt.system.unwrap().contains("Be lenient"));
    }

    #[test]
    fn test_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), GRADE_DOCUMENT, GRADE_DOCUMENT);

        let prompt = load_prompt(temp_dir.path(), GRADE_DOCUMENT).unwrap();
        assert_eq!(prompt.title, "Strict relevance");
        assert_eq!(prompt.template, "{{question}} / {{document}}");
    }

    #[test]
    fn test_override_with_mismatched_id() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), GRADE_DOCUMENT, "something.else");

        assert!(load_prompt(temp_dir.path(), GRADE_DOCUMENT).is_err());
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let prompts = prompts_dir(temp_dir.path());
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join("grade.answer.yml"), "invalid: yaml: content:").unwrap();

        assert!(load_prompt(temp_dir.path(), "grade.answer").is_err());
    }

    #[test]
    fn test_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), GRADE_DOCUMENT, GRADE_DOCUMENT);
        write_override(temp_dir.path(), "custom.extra", "custom.extra");

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), BUILTIN_IDS.len() + 1);
        assert!(prompts.contains(&(GRADE_DOCUMENT.to_string(), PromptOrigin::Workspace)));
        assert!(prompts.contains(&("custom.extra".to_string(), PromptOrigin::Workspace)));
        assert!(prompts.contains(&("generate.answer".to_string(), PromptOrigin::Builtin)));
    }
}
