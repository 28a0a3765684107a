use std::path::Path;

use skr_core::NodeKind;

pub fn run(file: &Path) -> Result<(), String> {
    let script = super::parse_file(file)?;

    let mut counts = [0usize; 3];
    script.walk(&mut |node, _| match node.kind {
        NodeKind::Story => counts[0] += 1,
        NodeKind::Scene => counts[1] += 1,
        NodeKind::Beat => counts[2] += 1,
        _ => {}
    });

    println!("  All checks passed for '{}'.", super::story_name(&script, file));
    println!(
        "  {} stories, {} scenes, {} beats",
        counts[0], counts[1], counts[2]
    );

    Ok(())
}
