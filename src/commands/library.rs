//! `inox lib`: browse, install, upgrade and remove libraries.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::fmt;

use crate::cache::Origin;
use crate::context::AppContext;
use crate::libraries::{self, Library};
use crate::runner::TerminalSink;
use crate::ui;

#[derive(Subcommand, Clone, Debug)]
pub enum LibOp {
    /// Browse libraries and act on one (default)
    Pick {
        /// Re-fetch the library list from arduino-cli first
        #[arg(long)]
        refresh: bool,
    },
    /// Print libraries
    List {
        #[arg(long)]
        refresh: bool,
        /// Only installed libraries
        #[arg(long)]
        installed: bool,
        /// Only libraries whose name contains this text
        filter: Option<String>,
    },
    /// Install a library
    Install {
        name: String,
        /// Specific version (defaults to latest)
        #[arg(long)]
        version: Option<String>,
    },
    /// Upgrade an installed library
    Upgrade { name: String },
    /// Remove an installed library
    Uninstall { name: String },
}

/// What can be done with a picked library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibAction {
    Install(Option<String>),
    Upgrade(Option<String>),
    Uninstall,
    Cancel,
}

impl fmt::Display for LibAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibAction::Install(Some(v)) => write!(f, "Install {}", v),
            LibAction::Install(None) => write!(f, "Install latest"),
            LibAction::Upgrade(Some(v)) => write!(f, "Upgrade to {}", v),
            LibAction::Upgrade(None) => write!(f, "Upgrade"),
            LibAction::Uninstall => write!(f, "Uninstall"),
            LibAction::Cancel => write!(f, "Cancel"),
        }
    }
}

/// Actions that make sense for a library in its current state.
pub fn actions_for(lib: &Library) -> Vec<LibAction> {
    let mut actions = Vec::new();
    if !lib.installed {
        actions.push(LibAction::Install(lib.latest_version.clone()));
    } else {
        if lib.update_available {
            actions.push(LibAction::Upgrade(lib.latest_version.clone()));
        }
        actions.push(LibAction::Uninstall);
    }
    actions.push(LibAction::Cancel);
    actions
}

pub fn handle(ctx: &AppContext, op: Option<LibOp>) -> Result<()> {
    match op.unwrap_or(LibOp::Pick { refresh: false }) {
        LibOp::Pick { refresh } => pick(ctx, refresh),
        LibOp::List {
            refresh,
            installed,
            filter,
        } => list(ctx, refresh, installed, filter.as_deref()),
        LibOp::Install { name, version } => install(ctx, &name, version.as_deref()),
        LibOp::Upgrade { name } => run_action(ctx, &name, &LibAction::Upgrade(None)),
        LibOp::Uninstall { name } => run_action(ctx, &name, &LibAction::Uninstall),
    }
}

fn load_libraries(ctx: &AppContext, refresh: bool) -> Result<Vec<Library>> {
    let cache = ctx.libraries_cache();
    let pb = ui::spinner("Loading libraries (this can take a while)...");

    if refresh {
        let result = cache.refresh();
        pb.finish_and_clear();
        let libs = result.context("Could not refresh the library list")?;
        println!("{} Refreshed {} libraries.", "✓".green(), libs.len());
        return Ok(libs);
    }

    let listing = cache.get_list();
    pb.finish_and_clear();
    match listing.origin {
        Origin::Stale => println!(
            "{} arduino-cli unavailable, using an expired library list.",
            "!".yellow()
        ),
        Origin::Defaults => println!(
            "{} arduino-cli unavailable and no cached library list.",
            "!".yellow()
        ),
        Origin::Cache | Origin::Live => {}
    }
    Ok(listing.items)
}

fn list(ctx: &AppContext, refresh: bool, installed_only: bool, filter: Option<&str>) -> Result<()> {
    let libs = load_libraries(ctx, refresh)?;
    let needle = filter.map(str::to_lowercase);
    let shown: Vec<&Library> = libs
        .iter()
        .filter(|l| !installed_only || l.installed)
        .filter(|l| {
            needle
                .as_ref()
                .is_none_or(|n| l.name.to_lowercase().contains(n))
        })
        .collect();

    if shown.is_empty() {
        println!("{} No libraries found.", "x".red());
        return Ok(());
    }

    let mut table = ui::Table::new(&["Name", "Installed", "Latest"]);
    for lib in shown {
        let installed = match (&lib.installed_version, lib.installed) {
            (Some(v), true) => v.green().to_string(),
            (None, true) => "yes".green().to_string(),
            _ => "-".dimmed().to_string(),
        };
        let latest = match &lib.latest_version {
            Some(v) if lib.update_available => v.yellow().bold().to_string(),
            Some(v) => v.clone(),
            None => "-".dimmed().to_string(),
        };
        table.add_row(vec![lib.name.clone(), installed, latest]);
    }
    table.print();
    Ok(())
}

fn pick(ctx: &AppContext, refresh: bool) -> Result<()> {
    let libs = load_libraries(ctx, refresh)?;
    if libs.is_empty() {
        println!("{} No libraries available.", "x".red());
        println!(
            "   Try {} first.",
            "arduino-cli lib update-index".yellow()
        );
        return Ok(());
    }

    let Some(lib) = ui::pick("Select a library:", libs, 0)? else {
        return Ok(());
    };
    let Some(action) = ui::pick(&format!("{}:", lib.name), actions_for(&lib), 0)? else {
        return Ok(());
    };
    run_action(ctx, &lib.name, &action)
}

fn install(ctx: &AppContext, name: &str, version: Option<&str>) -> Result<()> {
    run_action(ctx, name, &LibAction::Install(version.map(str::to_string)))
}

fn run_action(ctx: &AppContext, name: &str, action: &LibAction) -> Result<()> {
    let mut sink = TerminalSink;
    let result = match action {
        LibAction::Cancel => return Ok(()),
        LibAction::Install(version) => {
            println!("{} Installing {}...", "📦".blue(), name.bold());
            libraries::install(&ctx.cli, name, version.as_deref(), &mut sink)
        }
        LibAction::Upgrade(_) => {
            println!("{} Upgrading {}...", "📦".blue(), name.bold());
            libraries::upgrade(&ctx.cli, name, &mut sink)
        }
        LibAction::Uninstall => {
            println!("{} Removing {}...", "🗑️".red(), name.bold());
            libraries::uninstall(&ctx.cli, name, &mut sink)
        }
    };
    result.with_context(|| format!("Library operation on '{}' failed", name))?;

    // Installed/outdated flags changed; next listing must refetch.
    ctx.libraries_cache().clear()?;
    println!("{} Done.", "✓".green());
    Ok(())
}
