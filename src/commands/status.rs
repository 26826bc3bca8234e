//! `inox status`: what the next compile/upload/monitor would use.

use anyhow::Result;
use colored::*;

use crate::context::AppContext;
use crate::sketch;
use crate::ui;

pub fn show(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;
    let mut table = ui::Table::new(&["Setting", "Value"]);

    table.add_row(vec!["Board".to_string(), config.board.cyan().to_string()]);
    table.add_row(vec![
        "Port".to_string(),
        match &config.port {
            Some(port) => port.cyan().to_string(),
            None => "not selected".yellow().to_string(),
        },
    ]);
    table.add_row(vec![
        "Baud rate".to_string(),
        config.baudrate.to_string().cyan().to_string(),
    ]);
    table.add_row(vec![
        "Sketch".to_string(),
        match sketch::find_sketch(&ctx.project_dir) {
            Ok(path) => path.display().to_string(),
            Err(_) => "none found".yellow().to_string(),
        },
    ]);
    table.add_row(vec![
        "Project file".to_string(),
        if config.exists() {
            config.path().display().to_string()
        } else {
            format!("{} (defaults)", config.path().display())
                .dimmed()
                .to_string()
        },
    ]);
    table.add_row(vec![
        "arduino-cli".to_string(),
        match ctx.cli.version() {
            Ok(version) => format!("{} ({})", ctx.cli.path().display(), version),
            Err(_) => format!("{} (not found)", ctx.cli.path().display())
                .red()
                .to_string(),
        },
    ]);
    table.add_row(vec![
        "Boards cache".to_string(),
        ctx.boards_cache().status().to_string(),
    ]);
    table.add_row(vec![
        "Libraries cache".to_string(),
        ctx.libraries_cache().status().to_string(),
    ]);

    table.print();
    Ok(())
}
