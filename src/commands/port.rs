//! `inox port`: detect and select the serial port.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use inquire::Text;

use crate::context::AppContext;
use crate::ports;
use crate::ui;

const MANUAL_ENTRY: &str = "Enter a port manually...";

#[derive(Subcommand, Clone, Debug)]
pub enum PortOp {
    /// Pick from detected ports (default)
    Select,
    /// Print the detected ports
    List,
    /// Set the port directly (e.g. /dev/ttyACM0, COM3)
    Set { port: String },
}

pub fn handle(ctx: &mut AppContext, op: Option<PortOp>) -> Result<()> {
    match op.unwrap_or(PortOp::Select) {
        PortOp::Select => select(ctx),
        PortOp::List => list(ctx),
        PortOp::Set { port } => set(ctx, &port),
    }
}

fn detect(ctx: &AppContext) -> Vec<String> {
    let pb = ui::spinner("Detecting serial ports...");
    let result = ports::list_ports(&ctx.cli);
    pb.finish_and_clear();
    match result {
        Ok(found) => found,
        Err(e) => {
            println!("{} Port detection failed: {:#}", "!".yellow(), e);
            Vec::new()
        }
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let found = detect(ctx);
    if found.is_empty() {
        println!("{} No serial ports detected.", "x".red());
        return Ok(());
    }
    for port in found {
        if ctx.config.port.as_deref() == Some(port.as_str()) {
            println!("  {} {}", "*".green(), port.green().bold());
        } else {
            println!("    {}", port);
        }
    }
    Ok(())
}

fn select(ctx: &mut AppContext) -> Result<()> {
    let found = detect(ctx);
    if found.is_empty() {
        println!("{} No serial ports detected.", "!".yellow());
    }

    let current = ctx
        .config
        .port
        .as_ref()
        .and_then(|p| found.iter().position(|f| f == p))
        .unwrap_or(0);
    let mut options = found;
    options.push(MANUAL_ENTRY.to_string());

    let Some(choice) = ui::pick("Select a port:", options, current)? else {
        return Ok(());
    };

    let port = if choice == MANUAL_ENTRY {
        let mut prompt = Text::new("Port:");
        if let Some(existing) = ctx.config.port.as_deref() {
            prompt = prompt.with_default(existing);
        }
        prompt.prompt()?
    } else {
        choice
    };

    set(ctx, &port)
}

fn set(ctx: &mut AppContext, port: &str) -> Result<()> {
    ctx.config.set_port(port)?;
    if let Some(port) = &ctx.config.port {
        println!("{} Port: {}", "✓".green(), port.cyan());
    }
    Ok(())
}
