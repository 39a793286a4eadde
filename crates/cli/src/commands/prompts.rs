//! Prompts command handler.

use clap::Args;
use corag_core::{config::AppConfig, AppResult};
use corag_prompt::{list_prompts, PromptOrigin};

/// List available prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let prompts = list_prompts(&config.workspace)?;

        if self.json {
            let entries: Vec<serde_json::Value> = prompts
                .iter()
                .map(|(id, origin)| serde_json::json!({ "id": id, "origin": origin }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        for (id, origin) in &prompts {
            let origin = match origin {
                PromptOrigin::Builtin => "built-in",
                PromptOrigin::Workspace => "workspace override",
            };
            println!("{:<22} {}", id, origin);
        }

        Ok(())
    }
}
