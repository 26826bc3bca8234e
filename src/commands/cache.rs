//! `inox cache`: inspect and maintain the listing caches.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::*;

use crate::context::AppContext;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataset {
    Boards,
    Libraries,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheOp {
    /// Print the cache directory
    Path,
    /// Delete cached listings (all when no dataset is given)
    Clear { dataset: Option<Dataset> },
    /// Re-fetch a listing from arduino-cli now
    Refresh { dataset: Dataset },
}

pub fn handle(ctx: &AppContext, op: CacheOp) -> Result<()> {
    match op {
        CacheOp::Path => {
            println!("{}", ctx.cache_dir().display());
            Ok(())
        }
        CacheOp::Clear { dataset } => clear(ctx, dataset),
        CacheOp::Refresh { dataset } => refresh(ctx, dataset),
    }
}

fn clear(ctx: &AppContext, dataset: Option<Dataset>) -> Result<()> {
    if dataset.is_none_or(|d| d == Dataset::Boards) {
        ctx.boards_cache().clear()?;
        println!("{} Cleared board cache.", "✓".green());
    }
    if dataset.is_none_or(|d| d == Dataset::Libraries) {
        ctx.libraries_cache().clear()?;
        println!("{} Cleared library cache.", "✓".green());
    }
    Ok(())
}

fn refresh(ctx: &AppContext, dataset: Dataset) -> Result<()> {
    let name = match dataset {
        Dataset::Boards => "boards",
        Dataset::Libraries => "libraries",
    };
    println!("{} Refreshing {}...", "⚡".yellow(), name);
    let count = match dataset {
        Dataset::Boards => ctx
            .boards_cache()
            .refresh()
            .context("Could not refresh the board list")?
            .len(),
        Dataset::Libraries => ctx
            .libraries_cache()
            .refresh()
            .context("Could not refresh the library list")?
            .len(),
    };
    println!("{} Cached {} entries.", "✓".green(), count);
    Ok(())
}
