//! Plan command implementation
//!
//! Refreshes tracked state in memory and shows what apply would change.
//! Nothing on disk is modified, including the state file.

use colored::Colorize;
use serde_json::json;

use fsprov_core::{Action, Plan};

use crate::cli::Cli;
use crate::context::Session;
use crate::error::Result;

/// Run the plan command
pub fn run_plan(cli: &Cli, json: bool) -> Result<()> {
    let session = Session::open(cli)?;
    let mut state = session.store.load()?;
    let plan = session.engine.plan(&session.declarations, &mut state)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&plan))?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub(crate) fn plan_json(plan: &Plan) -> serde_json::Value {
    json!({
        "has_changes": plan.has_changes(),
        "summary": plan.summary(),
        "changes": plan.changes,
    })
}

/// Print human-readable plan output
pub(crate) fn print_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!(
            "{} No changes. The filesystem matches the manifest.",
            "OK".green().bold()
        );
        return;
    }

    for change in &plan.changes {
        let symbol = match &change.action {
            Action::Create => "+".green().bold(),
            Action::Update(_) => "~".yellow().bold(),
            Action::Replace(_) => "-/+".magenta().bold(),
            Action::Delete => "-".red().bold(),
            Action::NoOp => continue,
        };
        println!(
            "{} {} ({}) {}",
            symbol,
            change.address,
            change.path.to_string().dimmed(),
            change.action
        );
    }

    let summary = plan.summary();
    println!();
    println!(
        "{} {} to add, {} to change, {} to destroy.",
        "Plan:".bold(),
        summary.add,
        summary.change,
        summary.destroy
    );
}
