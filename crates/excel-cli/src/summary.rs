use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use excel_cache::{DatasetSummary, LoadReport};
use excel_map::{ConfidenceOutcome, ConfidenceThresholds};

use crate::commands::{DatasetListing, GenerateLine, GenerateReport, GenerateStatus};

/// One summary line per dataset.
pub fn print_generate_summary(report: &GenerateReport) {
    for line in &report.lines {
        println!("{}", generate_line(line));
    }
}

pub fn generate_line(line: &GenerateLine) -> String {
    match &line.status {
        GenerateStatus::Written {
            path,
            fields,
            required,
        } => format!(
            "written  {}: {} ({fields} fields, {required} required)",
            line.dataset,
            path.display()
        ),
        GenerateStatus::Skipped { path } => format!(
            "skipped  {}: {} exists (use --force to overwrite)",
            line.dataset,
            path.display()
        ),
        GenerateStatus::Failed { message } => format!("failed   {}: {message}", line.dataset),
    }
}

pub fn decode_summaries(report: &LoadReport) -> Vec<DatasetSummary> {
    report.outcomes.iter().map(|o| o.summary()).collect()
}

/// Confidence colours follow the configured cutoffs.
pub fn print_decode_summary(report: &LoadReport, thresholds: &ConfidenceThresholds) {
    let summaries = decode_summaries(report);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Records"),
        header_cell("Confidence"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    let mut total_records = 0usize;
    for summary in &summaries {
        total_records += summary.records.unwrap_or(0);
        table.add_row(vec![
            Cell::new(&summary.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            optional_cell(summary.records.map(|r| r.to_string())),
            confidence_cell(summary.confidence, thresholds),
            status_cell(&summary.status),
            detail_cell(&summary.detail),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(format!("{} loaded", report.loaded())).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for (_, error) in failures {
            eprintln!("- {error}");
        }
    }
}

pub fn print_datasets(listings: &[DatasetListing]) {
    let mut table = Table::new();
    table.set_header(vec!["Dataset", "Fields", "Required", "Strategy"]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for listing in listings {
        table.add_row(vec![
            Cell::new(&listing.dataset),
            optional_cell(listing.fields.map(|n| n.to_string())),
            optional_cell(listing.required.map(|n| n.to_string())),
            Cell::new(&listing.strategy),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Percentage(50)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn confidence_color(value: f64, thresholds: &ConfidenceThresholds) -> Color {
    match thresholds.classify(value, false) {
        ConfidenceOutcome::FullMatch => Color::Green,
        ConfidenceOutcome::PartialMatch | ConfidenceOutcome::LowConfidence => Color::Yellow,
        ConfidenceOutcome::PatternMismatch => Color::Red,
    }
}

fn confidence_cell(confidence: Option<f64>, thresholds: &ConfidenceThresholds) -> Cell {
    match confidence {
        Some(value) => Cell::new(format!("{value:.3}")).fg(confidence_color(value, thresholds)),
        None => dim_cell("-"),
    }
}

fn status_cell(status: &str) -> Cell {
    match status {
        "loaded" => Cell::new(status)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        "failed" => Cell::new(status)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        "loaded (partial)" => Cell::new(status).fg(Color::Yellow),
        _ => dim_cell(status),
    }
}

fn detail_cell(detail: &str) -> Cell {
    if detail.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(detail)
    }
}

fn optional_cell(value: Option<String>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
