use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use skr_core::Node;

pub fn run(file: &Path) -> Result<(), String> {
    let script = super::parse_file(file)?;

    if script.nodes.is_empty() {
        println!("  No declarations found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "Id", "When", "Actions", "Choices", "Line"]);

    let mut rows = 0;
    add_rows(&mut table, &script.nodes, 0, &mut rows);

    println!("{table}");
    println!();
    println!("  {rows} nodes");

    Ok(())
}

fn add_rows(table: &mut Table, nodes: &[Node], depth: usize, rows: &mut usize) {
    for node in nodes {
        let id = if node.id.is_empty() {
            "—".to_string()
        } else {
            format!("{}{}", "  ".repeat(depth), node.id)
        };
        table.add_row(vec![
            node.kind.label().to_string(),
            id,
            node.when.clone().unwrap_or_default(),
            node.actions.len().to_string(),
            node.choices.len().to_string(),
            node.range.start.line.to_string(),
        ]);
        *rows += 1;
        add_rows(table, &node.children, depth + 1, rows);
    }
}
