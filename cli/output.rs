use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::io::{self, Write};
use xbundle_core::detector::{HeadingOutcome, RejectReason};
use xbundle_core::output_formats::{self, OutputFormat};
use xbundle_core::{FileRecord, ScanListing};

/// Prints a scan either as a table or in one of the structured formats.
pub fn print_listing(listing: &ScanListing, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_listing_table(listing);
            if let Some(headings) = &listing.headings {
                print_heading_outcomes(headings);
            }
            Ok(())
        }
        structured => print_structured(listing, structured, "scan"),
    }
}

pub fn print_structured<T: Serialize>(data: &T, format: OutputFormat, xml_root: &str) -> Result<()> {
    let content = output_formats::serialize_structured(data, format, xml_root)?;
    write_to_stdout(&content)
}

pub fn print_listing_table(listing: &ScanListing) {
    println!();
    println!(
        "{} {} in {}",
        " Detected files ".green().bold().underline(),
        format!("({}, {})", listing.total_files, listing.total_size_readable).cyan(),
        listing.source.blue()
    );

    if listing.files.is_empty() {
        println!("\n{}", "(No code files found in this document)".yellow());
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let explain = listing.headings.is_some();
    let mut header = vec![
        Cell::new("#").fg(Color::Green),
        Cell::new("").fg(Color::Green),
        Cell::new("Path").fg(Color::Green),
        Cell::new("Type").fg(Color::Green),
        Cell::new("Lines").fg(Color::Green),
        Cell::new("Size").fg(Color::Green),
    ];
    if explain {
        header.push(Cell::new("Heading #").fg(Color::Green));
    }
    table.set_header(header);
    for file in &listing.files {
        let mut row = vec![
            Cell::new(file.index).set_alignment(CellAlignment::Right),
            Cell::new(&file.icon),
            Cell::new(&file.path).fg(Color::Cyan),
            Cell::new(&file.mime_type).fg(Color::DarkGrey),
            Cell::new(file.lines).set_alignment(CellAlignment::Right),
            Cell::new(&file.size_readable)
                .set_alignment(CellAlignment::Right)
                .fg(Color::DarkGrey),
        ];
        if explain {
            let heading = file.heading.map(|h| (h + 1).to_string()).unwrap_or_default();
            row.push(Cell::new(heading).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    println!("{table}");
    println!();
}

fn print_heading_outcomes(outcomes: &[HeadingOutcome]) {
    println!("{}", " Headings ".green().bold().underline());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Green),
        Cell::new("Heading").fg(Color::Green),
        Cell::new("Result").fg(Color::Green),
    ]);
    for outcome in outcomes {
        let result = match (outcome.rejected, &outcome.path) {
            (None, Some(path)) => Cell::new(format!("file {}", path)).fg(Color::Green),
            (Some(reason), _) => Cell::new(describe_rejection(reason)).fg(Color::DarkGrey),
            (None, None) => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(outcome.ordinal + 1).set_alignment(CellAlignment::Right),
            Cell::new(&outcome.heading),
            result,
        ]);
    }
    println!("{table}");
    println!();
}

fn describe_rejection(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::InvalidHeading => "not a file name",
        RejectReason::NoCodeBlockFound => "no code block nearby",
        RejectReason::EmptyContent => "code block is empty",
    }
}

/// One file as shown by `preview`: a `path · size · lines` header, then the content.
pub fn print_preview(index: usize, record: &FileRecord) {
    println!(
        "{} {} {}",
        format!("[{}]", index).dimmed(),
        record.icon(),
        record.path().cyan().bold()
    );
    println!(
        "{}",
        format!(
            "{} · {} · {} lines",
            record.mime_type(),
            record.size_readable(),
            record.line_count()
        )
        .dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!("{}", record.content());
    println!();
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
