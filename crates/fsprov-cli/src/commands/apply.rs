//! Apply and destroy command implementations
//!
//! Both take the state lock for their whole run and save state after every
//! completed step.

use colored::Colorize;
use serde_json::json;

use fsprov_core::{ApplyOptions, ApplyReport};

use super::plan::{plan_json, print_plan};
use crate::cli::Cli;
use crate::context::Session;
use crate::error::Result;

/// Run the apply command
pub fn run_apply(cli: &Cli, dry_run: bool, json: bool) -> Result<()> {
    let session = Session::open(cli)?;
    let _lock = session.store.lock()?;
    let mut state = session.store.load()?;
    let plan = session.engine.plan(&session.declarations, &mut state)?;

    if !json {
        print_plan(&plan);
        if !plan.has_changes() {
            return Ok(());
        }
        println!();
    }

    let report = session.engine.apply(
        &plan,
        &mut state,
        &session.store,
        ApplyOptions { dry_run },
    )?;

    if json {
        let output = json!({
            "plan": plan_json(&plan),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Run the destroy command
pub fn run_destroy(cli: &Cli, dry_run: bool) -> Result<()> {
    let session = Session::open_for_state(cli)?;
    let _lock = session.store.lock()?;
    let mut state = session.store.load()?;

    if state.resources.is_empty() {
        println!("{} Nothing to destroy.", "OK".green().bold());
        return Ok(());
    }

    let report = session
        .engine
        .destroy(&mut state, &session.store, ApplyOptions { dry_run })?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ApplyReport) {
    let prefix = if report.dry_run { "[dry-run] Would " } else { "" };
    for step in &report.applied {
        println!(
            "   {} {}{} {}",
            "=>".blue().bold(),
            prefix,
            step.action,
            step.address
        );
    }

    let summary = report.summary();
    let label = if report.dry_run {
        "Dry run:".yellow().bold()
    } else {
        "Apply complete:".green().bold()
    };
    println!(
        "{} {} added, {} changed, {} destroyed.",
        label, summary.add, summary.change, summary.destroy
    );
}
