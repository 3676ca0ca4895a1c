//! `bankchat emi` - Loan EMI breakdown with an optional schedule.

use anyhow::{Result, bail};
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use bankchat_core::banking::emi::{ScheduleRow, amortization_schedule, calculate_emi};

pub fn print_emi(principal: f64, rate: f64, tenure: u32, schedule: bool, json: bool) -> Result<()> {
    if principal <= 0.0 {
        bail!("principal must be positive");
    }
    if rate < 0.0 {
        bail!("rate must not be negative");
    }
    if tenure == 0 {
        bail!("tenure must be at least one month");
    }

    let breakdown = calculate_emi(principal, rate, tenure);
    let rows = if schedule {
        amortization_schedule(principal, rate, tenure)
    } else {
        Vec::new()
    };

    if json {
        let mut output = serde_json::to_value(&breakdown)?;
        if schedule {
            output["schedule"] = rows.iter().map(row_json).collect();
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} EMI for {} over {} months at {:.2}%",
        style("₹").bold(),
        style(format!("{principal:.2}")).cyan(),
        tenure,
        rate
    );
    println!();
    println!("  Monthly EMI     {}", style(format!("{:.2}", breakdown.emi)).green().bold());
    println!("  Total interest  {:.2}", breakdown.total_interest);
    println!("  Total payable   {:.2}", breakdown.total_amount);
    println!();

    if schedule {
        println!("{}", schedule_table(&rows));
        println!();
    }

    Ok(())
}

fn row_json(row: &ScheduleRow) -> serde_json::Value {
    json!({
        "month": row.month,
        "payment": row.payment,
        "principal": row.principal,
        "interest": row.interest,
        "balance": row.balance,
    })
}

fn schedule_table(rows: &[ScheduleRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Month").fg(Color::White),
        Cell::new("Payment").fg(Color::White),
        Cell::new("Principal").fg(Color::White),
        Cell::new("Interest").fg(Color::White),
        Cell::new("Balance").fg(Color::White),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.month).fg(Color::DarkGrey),
            money(row.payment),
            money(row.principal),
            money(row.interest).fg(Color::Yellow),
            money(row.balance).fg(Color::Cyan),
        ]);
    }
    table
}

fn money(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}
