//! Refresh and show command implementations

use colored::Colorize;

use fsprov_core::ResourceRecord;

use crate::cli::Cli;
use crate::context::{Session, init_console_logging};
use crate::error::Result;

/// Run the refresh command
///
/// Reads every tracked resource back from disk and saves what it finds.
/// Resources that vanished are dropped from the state.
pub fn run_refresh(cli: &Cli) -> Result<()> {
    let session = Session::open_for_state(cli)?;
    let _lock = session.store.lock()?;
    let mut state = session.store.load()?;
    let tracked = state.resources.len();

    session.engine.refresh(&mut state)?;
    session.store.save(&mut state)?;

    let dropped = tracked - state.resources.len();
    println!(
        "{} Refreshed {} resource(s).",
        "OK".green().bold(),
        state.resources.len()
    );
    if dropped > 0 {
        println!(
            "{} {} resource(s) no longer exist and were dropped from state.",
            "MISSING".yellow().bold(),
            dropped
        );
    }
    Ok(())
}

/// Run the show command
pub fn run_show(cli: &Cli, json: bool) -> Result<()> {
    init_console_logging(cli.verbose);
    let store = fsprov_core::StateStore::new(&cli.state);
    let state = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    if state.resources.is_empty() {
        println!("No resources are tracked in {}.", cli.state.display());
        return Ok(());
    }

    for record in &state.resources {
        println!("{}", record.address().to_string().cyan().bold());
        match record {
            ResourceRecord::Directory { state, .. } => {
                print_field("path", state.path.as_str());
                print_field("mode", &state.mode);
                print_field("user", &state.user);
                print_field("group", &state.group);
                print_field("create_parents", &state.create_parents.to_string());
                print_field("id", state.id.as_str());
            }
            ResourceRecord::File { state, .. } => {
                print_field("path", state.path.as_str());
                print_field("mode", &state.mode);
                print_field("user", &state.user);
                print_field("group", &state.group);
                print_field("content", &state.content);
                print_field("id", state.id.as_str());
            }
        }
        println!();
    }
    println!(
        "{} serial {}, lineage {}",
        "state".dimmed(),
        state.serial,
        state.lineage
    );
    Ok(())
}

fn print_field(name: &str, value: &str) {
    println!("    {:<15} = {}", name, value);
}
