use anyhow::Result;

use crate::naming::{DEFAULT_FORMAT, PLACEHOLDERS};

/// Run the fields command - list available naming placeholders
pub fn run() -> Result<()> {
    println!("Available format placeholders:");
    println!();

    for (name, description) in PLACEHOLDERS {
        println!("  {{{}}}  - {}", name, description);
    }

    println!();
    println!("Default format: \"{}\"", DEFAULT_FORMAT);
    println!("Flat layout:    \"{{title}}\"");
    println!();
    println!("Optional: Use {{year?}} to drop the placeholder (and the text before it) when missing");

    Ok(())
}
