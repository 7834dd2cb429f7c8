use std::path::PathBuf;

use anyhow::{Context, Result};
use yearplan_core::{MonthPointer, MonthRange};
use yearplan_session::{CalendarController, NoClipboard, ShareOutcome};
use yearplan_store::{FileStore, LocationState, MemoryLocation};

use crate::Commands;

type Session = CalendarController<FileStore, MemoryLocation>;

pub fn run(controller: &mut Session, command: Commands) -> Result<()> {
    let href_before = controller.location().href();

    match command {
        Commands::Show => show(controller),
        Commands::Calendars => list_calendars(controller),
        Commands::Paint { date, tool } => {
            if let Some(code) = tool {
                controller.select_tool_code(&code)?;
            }
            controller.click(date);
            let state = match controller.date_cells().get_date(date) {
                Some(cell) if cell.tool().is_some() => "painted",
                _ => "cleared",
            };
            println!("{} {}", date, state);
            if !controller.month_range().contains(MonthPointer::of_date(date)) {
                println!("(outside the visible months; use `range` to show it)");
            }
        }
        Commands::Note { date, text } => {
            controller.set_custom_text(date, &text);
            println!("{} note {}", date, if text.trim().is_empty() { "cleared" } else { "set" });
        }
        Commands::Range { start, end } => {
            match end {
                Some(end) => controller.set_month_range(MonthRange::new(start, end))?,
                None => controller.set_range_start(start)?,
            }
            let range = controller.month_range();
            println!(
                "Showing {} months from {} to {}",
                range.len(),
                human_month(range.start),
                human_month(range.end)
            );
        }
        Commands::View { name } => {
            controller.select_view_name(&name)?;
            println!("View: {}", controller.selected_view());
        }
        Commands::Tool { code } => {
            controller.select_tool_code(&code)?;
            println!("Tool: {}", controller.selected_color_texture());
        }
        Commands::Switch { id } => {
            if !controller.switch_calendar(&id) {
                anyhow::bail!("No calendar with id '{}'", id);
            }
            println!("Switched to {}", id);
        }
        Commands::Share => match controller.share(&mut NoClipboard) {
            Some(ShareOutcome::Copied(url)) => println!("Copied: {}", url),
            Some(ShareOutcome::ManualCopy(url)) => println!("{}", url),
            None => anyhow::bail!("Cannot build a share link from '{}'", href_before),
        },
        Commands::Export { out } => {
            let document = controller.export_document();
            let path = out.unwrap_or_else(|| PathBuf::from(document.file_name()));
            let json = document
                .to_json_pretty()
                .context("Failed to serialize export")?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            controller.import_document(&json)?;
            println!("Imported {}", file.display());
        }
        Commands::Clean => {
            controller.clean_all();
            println!("Calendar reset");
        }
    }

    let href_after = controller.location().href();
    if href_after != href_before {
        println!("Location: {}", href_after);
    }

    Ok(())
}

/// `2025-03` for March 2025.
fn human_month(pointer: MonthPointer) -> String {
    format!("{}-{:02}", pointer.year, pointer.month + 1)
}

fn show(controller: &Session) {
    let data = controller.snapshot();
    let range = data.month_range;

    println!("Calendar: {}", controller.current_calendar_id());
    println!(
        "Months:   {} .. {} ({} months)",
        human_month(range.start),
        human_month(range.end),
        range.len()
    );
    println!("View:     {}", data.selected_view);
    println!("Tool:     {}", data.selected_color_texture);

    if data.date_cells.is_empty() {
        println!("\nNo days marked.");
        return;
    }

    println!();
    for (key, cell) in data.date_cells.iter() {
        let tool = cell.tool().map(|t| t.to_string()).unwrap_or_default();
        match &cell.custom_text {
            Some(text) => println!("  {:<12} {:<18} {}", key, tool, text),
            None => println!("  {:<12} {}", key, tool),
        }
    }
}

fn list_calendars(controller: &Session) {
    for summary in controller.available_calendars() {
        let marker = if summary.is_current { "*" } else { " " };
        println!(
            "{} {}  {:<20} updated {}",
            marker,
            summary.id,
            summary.label,
            summary.last_updated.format("%Y-%m-%d %H:%M")
        );
    }
}
