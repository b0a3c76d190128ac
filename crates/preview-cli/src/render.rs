use colored::Colorize;

use preview_core::{Message, PipelineResult, Role, VariableBag};

pub fn print_result(result: &PipelineResult) {
    let messages = result.messages();
    println!(
        "{}",
        format!("📝 {} preview: {} messages", result.mode(), messages.len()).cyan()
    );
    println!("{}", "─".repeat(50).dimmed());

    for message in messages {
        print_message(message);
    }

    match result {
        PipelineResult::Message(view) | PipelineResult::Preflight(view) => {
            if !view.variables.r#final.is_empty() {
                println!("{}", "─".repeat(50).dimmed());
                print_variables(&view.variables.r#final);
            }
        }
        PipelineResult::Raw(_) => {}
    }
}

fn print_message(message: &Message) {
    let label = format!("[{}]", message.role);
    let label = match message.role {
        Role::System => label.yellow(),
        Role::User => label.green(),
        Role::Assistant => label.blue(),
    };
    println!("{} {}", label.bold(), message.content);
}

fn print_variables(variables: &VariableBag) {
    println!("{}", "Variables:".cyan());
    for (name, value) in variables {
        println!("  {} = {}", name.bold(), value);
    }
}
