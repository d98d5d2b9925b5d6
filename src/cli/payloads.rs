use console::style;
use serde_json::json;

use crate::cli::commands::PayloadsArgs;
use vulnagent::errors::VulnAgentError;
use vulnagent::payloads::{self, PayloadCategory};
use vulnagent::utils::formatting::format_size;

pub async fn handle_payloads(args: PayloadsArgs) -> Result<(), VulnAgentError> {
    let category = match &args.category {
        Some(name) => Some(PayloadCategory::parse(name).ok_or_else(|| {
            VulnAgentError::Config(format!("Unknown payload category: {}", name))
        })?),
        None => None,
    };

    let selected: Vec<_> = payloads::corpus()
        .iter()
        .enumerate()
        .filter(|(_, entry)| category.map_or(true, |c| entry.category == c))
        .collect();

    if args.json {
        let rows: Vec<_> = selected
            .iter()
            .map(|(index, entry)| {
                json!({
                    "index": index + 1,
                    "filename": entry.filename,
                    "content_type": entry.content_type,
                    "size": entry.content.len(),
                    "category": entry.category,
                    "description": entry.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (index, entry) in &selected {
        println!(
            "{:>3}  {:<24} {:<40} {:>8}  {}",
            index + 1,
            style(entry.category.as_str()).cyan(),
            entry.filename.escape_debug(),
            format_size(entry.content.len()),
            style(&entry.description).dim(),
        );
    }
    println!("\n{} payloads", style(selected.len()).bold());
    Ok(())
}
