//! CLI tool for vgrid - replays a scroll scenario and prints the rendered windows as JSON
//!
//! Usage:
//!   vgrid_cli <scenario.json>              # Output JSON to stdout
//!   vgrid_cli <scenario.json> -o out.json  # Output JSON to file
//!
//! A scenario looks like:
//!
//! ```json
//! {
//!   "config": { "rowHeight": 30, "viewHeight": 600, "columns": [{ "field": "name" }] },
//!   "records": 100000,
//!   "rowHeights": [30, 45, 80],
//!   "offsets": [0, 1500000, 900]
//! }
//! ```
//!
//! `rowHeights` is optional; when present record `i` gets the hint
//! `rowHeights[i % len]`.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use vgrid::columns::ColumnTypeRegistry;
use vgrid::{Grid, GridConfig, Record, RowManagerEvent};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    config: GridConfig,
    records: usize,
    #[serde(default)]
    row_heights: Vec<f64>,
    offsets: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Step {
    requested: f64,
    scroll_top: f64,
    top_index: usize,
    row_count: usize,
    total_height: f64,
    first_row_top: Option<f64>,
    events: Vec<RowManagerEvent>,
}

fn build_records(count: usize, heights: &[f64]) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let record = Record::new(i64::try_from(i).unwrap()).with("name", format!("Record {i}"));
            if heights.is_empty() {
                record
            } else {
                record.with_row_height(heights[i % heights.len()])
            }
        })
        .collect()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: vgrid_cli <scenario.json> [-o output.json]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    let text = match fs::read_to_string(input_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let scenario: Scenario = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error parsing scenario: {}", e);
            std::process::exit(1);
        }
    };

    let records = build_records(scenario.records, &scenario.row_heights);
    let mut grid = match Grid::new(scenario.config, &ColumnTypeRegistry::with_defaults(), records) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error creating grid: {}", e);
            std::process::exit(1);
        }
    };

    // Each offset is a separate scroll gesture that is allowed to settle.
    let mut now = 0.0;
    let steps: Vec<Step> = scenario
        .offsets
        .iter()
        .map(|&y| {
            let mut events = grid.scroll_to(y, now);
            now += 1000.0;
            events.extend(grid.tick(now));
            let rows = grid.row_manager();
            Step {
                requested: y,
                scroll_top: grid.scroller().y,
                top_index: rows.top_index(),
                row_count: rows.row_count(),
                total_height: rows.total_height(),
                first_row_top: rows.top_row().map(|r| r.top()),
                events,
            }
        })
        .collect();

    let json = match serde_json::to_string_pretty(&steps) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
