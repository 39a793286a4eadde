//! Prompt system for corag.
//!
//! Every model call in the pipeline goes through a prompt definition:
//! - built-in YAML definitions for routing, grading and answering
//! - per-workspace overrides in `.corag/prompts/<id>.yml`
//! - Handlebars rendering of system and user templates

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{
    builtin_prompt, BUILTIN_IDS, GENERATE_ANSWER, GRADE_ANSWER, GRADE_DOCUMENT,
    GRADE_GROUNDEDNESS, NOT_AVAILABLE_MARKER, ROUTE_QUESTION,
};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, PromptDefinition, PromptOrigin, PromptOutputSpec};
