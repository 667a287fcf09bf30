//! Console summary table

use crate::core::styles::StyleRole;
use crate::report::aggregator::AggregationTree;
use prettytable::{format, Cell, Row, Table};

fn styled(text: &str, role: StyleRole, color: bool, extra: &str) -> Cell {
    let mut spec = extra.to_string();
    if color {
        if let Some(fg) = role.to_prettytable_spec() {
            spec.push_str(&fg);
        }
    }
    Cell::new(text).style_spec(&spec)
}

/// One row per (language, repository, class, tool) with its finding count
pub fn summary_table(tree: &AggregationTree, color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(
        ["Language", "Repository", "Class", "Tool", "Findings"]
            .iter()
            .map(|h| styled(h, StyleRole::Header, color, "b"))
            .collect(),
    ));

    for row in tree.rows() {
        table.add_row(Row::new(vec![
            styled(row.language, StyleRole::Value, color, ""),
            styled(row.repository, StyleRole::Value, color, ""),
            styled(row.class.label(), StyleRole::for_class(row.class), color, ""),
            styled(row.tool, StyleRole::Tool, color, ""),
            styled(&row.findings.len().to_string(), StyleRole::Count, color, "r"),
        ]));
    }

    table.add_row(Row::new(vec![
        styled("Total", StyleRole::Header, color, "b"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        styled(&tree.total_findings().to_string(), StyleRole::Count, color, "br"),
    ]));

    table
}

/// Print the summary table to stdout
pub fn print_summary(tree: &AggregationTree, color: bool) {
    if tree.is_empty() {
        println!("No results to summarise.");
        return;
    }
    let table = summary_table(tree, color);
    if color {
        table.printstd();
    } else {
        print!("{}", table);
    }
}
