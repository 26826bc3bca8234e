//! `inox board`: list and select the target board.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::boards::Board;
use crate::cache::Origin;
use crate::context::AppContext;
use crate::ui;

#[derive(Subcommand, Clone, Debug)]
pub enum BoardOp {
    /// Pick a board interactively (default)
    Select {
        /// Re-fetch the board list from arduino-cli first
        #[arg(long)]
        refresh: bool,
    },
    /// Print the available boards
    List {
        /// Re-fetch the board list from arduino-cli first
        #[arg(long)]
        refresh: bool,
        /// Only show boards whose name or FQBN contains this text
        filter: Option<String>,
    },
    /// Set the board FQBN directly (e.g. arduino:avr:uno)
    Set { fqbn: String },
}

pub fn handle(ctx: &mut AppContext, op: Option<BoardOp>) -> Result<()> {
    match op.unwrap_or(BoardOp::Select { refresh: false }) {
        BoardOp::Select { refresh } => select(ctx, refresh),
        BoardOp::List { refresh, filter } => list(ctx, refresh, filter.as_deref()),
        BoardOp::Set { fqbn } => set(ctx, &fqbn),
    }
}

/// Board list through the cache. A manual refresh surfaces fetch errors.
pub fn load_boards(ctx: &AppContext, refresh: bool) -> Result<Vec<Board>> {
    let cache = ctx.boards_cache();
    let pb = ui::spinner("Loading boards...");

    if refresh {
        let result = cache.refresh();
        pb.finish_and_clear();
        let boards = result.context("Could not refresh the board list")?;
        println!("{} Refreshed {} boards.", "✓".green(), boards.len());
        return Ok(boards);
    }

    let listing = cache.get_list();
    pb.finish_and_clear();
    match listing.origin {
        Origin::Stale => println!(
            "{} arduino-cli unavailable, using an expired board list.",
            "!".yellow()
        ),
        Origin::Defaults => println!(
            "{} arduino-cli unavailable, showing common boards only.",
            "!".yellow()
        ),
        Origin::Cache | Origin::Live => {}
    }
    Ok(listing.items)
}

pub fn filter_boards<'a>(boards: &'a [Board], filter: Option<&str>) -> Vec<&'a Board> {
    let needle = filter.map(str::to_lowercase);
    boards
        .iter()
        .filter(|b| match &needle {
            Some(n) => b.name.to_lowercase().contains(n) || b.fqbn.to_lowercase().contains(n),
            None => true,
        })
        .collect()
}

fn list(ctx: &AppContext, refresh: bool, filter: Option<&str>) -> Result<()> {
    let boards = load_boards(ctx, refresh)?;
    let shown = filter_boards(&boards, filter);
    if shown.is_empty() {
        println!("{} No boards match.", "x".red());
        return Ok(());
    }

    let mut table = ui::Table::new(&["", "Name", "FQBN"]);
    for board in shown {
        let current = board.fqbn == ctx.config.board;
        let marker = if current { "*".green().to_string() } else { String::new() };
        let name = if current {
            board.name.green().bold().to_string()
        } else {
            board.name.clone()
        };
        table.add_row(vec![marker, name, board.fqbn.cyan().to_string()]);
    }
    table.print();
    Ok(())
}

fn select(ctx: &mut AppContext, refresh: bool) -> Result<()> {
    let boards = load_boards(ctx, refresh)?;
    if boards.is_empty() {
        println!("{} No boards available.", "x".red());
        return Ok(());
    }

    let current = boards
        .iter()
        .position(|b| b.fqbn == ctx.config.board)
        .unwrap_or(0);
    let Some(board) = ui::pick("Select a board:", boards, current)? else {
        return Ok(());
    };

    ctx.config.set_board(&board.fqbn)?;
    println!("{} Board: {}", "✓".green(), board.label.cyan());
    println!(
        "  Saved to: {}",
        ctx.config.path().display().to_string().dimmed()
    );
    Ok(())
}

fn set(ctx: &mut AppContext, fqbn: &str) -> Result<()> {
    if fqbn.split(':').count() < 3 {
        println!(
            "{} '{}' does not look like an FQBN (vendor:arch:board).",
            "!".yellow(),
            fqbn
        );
    }
    ctx.config.set_board(fqbn)?;
    println!("{} Board: {}", "✓".green(), ctx.config.board.cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::default_boards;

    #[test]
    fn test_filter_matches_name_and_fqbn() {
        let boards = default_boards();
        assert_eq!(filter_boards(&boards, None).len(), 12);

        let esp = filter_boards(&boards, Some("ESP"));
        assert_eq!(esp.len(), 2);

        let by_fqbn = filter_boards(&boards, Some("renesas"));
        assert_eq!(by_fqbn.len(), 2);
    }
}
