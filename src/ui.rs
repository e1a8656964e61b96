use colored::*;
use terminal_size::{terminal_size, Height, Width};

use crate::tools::ToolDefinition;

pub fn print_header(model: &str, tool_server: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let line = "─".repeat(width.0 as usize);
    println!("{}", line.black().bold());

    let name = "Lounge Agent".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  ✈️  {} {}", name, version);

    let info = format!("  {}  •  {}", model, tool_server).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
}

pub fn print_tools(tools: &[ToolDefinition]) {
    for tool in tools {
        println!("  {} {}", tool.name.cyan().bold(), tool.description);
        let required = tool.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        if !required.is_empty() {
            println!("      {} {}", "requires:".black().bold(), required);
        }
    }
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_error(msg: &str) {
    println!("  {} {}", "❌".red().bold(), msg.red());
}

pub fn print_answer(label: &str, answer: &str) {
    println!("\n{}: {}", label.green().bold(), answer);
}
