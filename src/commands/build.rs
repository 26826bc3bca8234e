//! Compile and upload handlers.
//!
//! Upload always compiles first; a failed compile never reaches the board.

use anyhow::{Context, Result, bail};
use colored::*;
use std::path::PathBuf;

use crate::context::AppContext;
use crate::runner::{OutputSink, TerminalSink};
use crate::sketch;

/// `inox compile`
pub fn compile(ctx: &AppContext, verbose: bool) -> Result<()> {
    println!("{} {}", "🔧".cyan(), "Compiling sketch...".bold());
    println!();

    compile_with(ctx, verbose, &mut TerminalSink)?;

    println!();
    println!("{} Compile successful!", "✓".green());
    Ok(())
}

/// Compile the project sketch, streaming output to `sink`.
///
/// Returns the sketch directory handed to the tool.
pub fn compile_with(
    ctx: &AppContext,
    verbose: bool,
    sink: &mut dyn OutputSink,
) -> Result<PathBuf> {
    let sketch_path = sketch::find_sketch(&ctx.project_dir)?;
    let sketch_dir = sketch::sketch_dir(&sketch_path).to_path_buf();
    let dir_arg = sketch_dir.to_string_lossy();

    println!("{} Sketch: {}", "→".dimmed(), sketch_path.display());
    println!("{} Board: {}", "→".dimmed(), ctx.config.board.cyan());

    let mut args = vec!["compile", "--fqbn", ctx.config.board.as_str()];
    if verbose {
        args.push("-v");
    }
    args.push(&dir_arg);

    ctx.cli
        .run_streaming(&args, sink)
        .context("Compile failed")?;
    Ok(sketch_dir)
}

/// `inox upload`
pub fn upload(ctx: &AppContext, port: Option<&str>, verbose: bool) -> Result<()> {
    println!("{} {}", "📤".cyan(), "Uploading sketch...".bold());
    println!();

    upload_with(ctx, port, verbose, &mut TerminalSink)?;

    println!();
    println!("{} Upload successful!", "✓".green());
    Ok(())
}

/// Compile, then upload to `port` (or the configured port).
pub fn upload_with(
    ctx: &AppContext,
    port: Option<&str>,
    verbose: bool,
    sink: &mut dyn OutputSink,
) -> Result<()> {
    let Some(port) = port
        .map(str::to_string)
        .or_else(|| ctx.config.port.clone())
    else {
        bail!("No port selected. Run `inox port` to pick one or pass --port.");
    };

    let sketch_dir = compile_with(ctx, verbose, sink)?;
    let dir_arg = sketch_dir.to_string_lossy();

    println!("{} Port: {}", "→".dimmed(), port.cyan());

    let mut args = vec![
        "upload",
        "-p",
        port.as_str(),
        "--fqbn",
        ctx.config.board.as_str(),
    ];
    if verbose {
        args.push("-v");
    }
    args.push(&dir_arg);

    ctx.cli
        .run_streaming(&args, sink)
        .context("Upload failed")?;
    Ok(())
}
