use std::fs;
use std::path::Path;

pub fn run(file: &Path, output: Option<&Path>) -> Result<(), String> {
    let script = super::parse_file(file)?;
    let json = script.to_json_pretty().map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            println!(
                "  Built '{}' to {}",
                super::story_name(&script, file),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
