//! `inox baud`: serial monitor baud rate.

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::context::AppContext;
use crate::ui;

pub const STANDARD_BAUD_RATES: [u32; 17] = [
    300, 1200, 2400, 4800, 9600, 14400, 19200, 28800, 38400, 57600, 74880, 115200, 230400,
    250000, 500000, 1000000, 2000000,
];

#[derive(Subcommand, Clone, Debug)]
pub enum BaudOp {
    /// Pick from standard rates (default)
    Select,
    /// Set the rate directly
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        rate: u32,
    },
}

pub fn handle(ctx: &mut AppContext, op: Option<BaudOp>) -> Result<()> {
    let rate = match op.unwrap_or(BaudOp::Select) {
        BaudOp::Select => {
            let current = STANDARD_BAUD_RATES
                .iter()
                .position(|r| *r == ctx.config.baudrate)
                .unwrap_or(4);
            match ui::pick("Select a baud rate:", STANDARD_BAUD_RATES.to_vec(), current)? {
                Some(rate) => rate,
                None => return Ok(()),
            }
        }
        BaudOp::Set { rate } => rate,
    };

    ctx.config.set_baudrate(rate)?;
    println!(
        "{} Baud rate: {}",
        "✓".green(),
        ctx.config.baudrate.to_string().cyan()
    );
    Ok(())
}
