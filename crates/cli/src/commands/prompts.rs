use anyhow::Result;

use super::services::{load_config, load_prompts};

/// Lists the prompt templates available to traders.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded.
pub fn run_prompts(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let prompts = load_prompts(&config.prompts_dir);
    let templates = prompts.all();

    if templates.is_empty() {
        println!("No prompt templates in {}", config.prompts_dir);
        return Ok(());
    }

    println!("{:<20} {:>6}  Name", "Id", "Lines");
    for template in templates {
        println!(
            "{:<20} {:>6}  {}",
            template.id,
            template.content.lines().count(),
            template.name
        );
    }

    let in_use: Vec<String> = config
        .traders
        .iter()
        .filter_map(|t| t.prompt_template.as_ref().map(|p| format!("{} -> {p}", t.trader_id)))
        .collect();
    if !in_use.is_empty() {
        println!("\nAssigned: {}", in_use.join(", "));
    }
    Ok(())
}
