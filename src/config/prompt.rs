use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;
use log::info;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the NeuralForge AI website assistant.
Answer briefly and clearly.
Only answer questions relevant to NeuralForge AI services:
- AI Website Development
- Business Automation
- SEO & Lead Generation
- Chatbot Integration
- Custom Web Apps
- Maintenance & Support
If asked about pricing, timelines, or project scope, invite the user to submit the contact form.";

#[derive(Deserialize, Debug, Clone)]
pub struct PromptFile {
    pub system_prompt: String,
}

/// Reads a `{"system_prompt": "..."}` file. The prompt is trimmed and must not be blank.
pub fn load_system_prompt<P: AsRef<Path>>(path: P) -> Result<String, Box<dyn Error + Send + Sync>> {
    let path = path.as_ref();
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| format!("Failed to read prompt file '{}': {}", path.display(), e))?;
    let parsed: PromptFile = serde_json
        ::from_str(&file_content)
        .map_err(|e| format!("Failed to parse prompt file '{}': {}", path.display(), e))?;

    let prompt = parsed.system_prompt.trim();
    if prompt.is_empty() {
        return Err(format!("Prompt file '{}' has an empty system_prompt", path.display()).into());
    }
    info!("Loaded system prompt from '{}' ({} chars)", path.display(), prompt.chars().count());
    Ok(prompt.to_string())
}
