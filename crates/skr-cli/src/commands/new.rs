use std::fs;
use std::path::{Path, PathBuf};

pub fn run(id: &str, output: Option<&Path>) -> Result<(), String> {
    let id = id.trim();
    if id.is_empty() {
        return Err("story id must not be empty".into());
    }

    let target = output.map_or_else(|| PathBuf::from(format!("{id}.skr")), Path::to_path_buf);
    if target.exists() {
        return Err(format!("'{}' already exists", target.display()));
    }

    fs::write(&target, template(id))
        .map_err(|e| format!("cannot write {}: {e}", target.display()))?;

    println!("Created story '{}' in {}", id, target.display());
    println!();
    println!("Get started:");
    println!("  skr check {}   # Report problems", target.display());
    println!("  skr outline {} # Show scenes and beats", target.display());
    println!("  skr play {}    # Play it", target.display());

    Ok(())
}

/// Story identifiers are words: anything else becomes `_`.
fn story_identifier(id: &str) -> String {
    let mut ident: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn template(id: &str) -> String {
    let quoted = id.replace('\\', "\\\\").replace('"', "\\\"");
    let story = story_identifier(id);
    format!(
        r#":::meta
id: "{quoted}"
locale: "en-US"
version: 1
:::

story {story}:
  config:
    starting_scene = opening

  scene opening:
    beat arrival:
      say narrator "Welcome to your new Skroll project."
      stage "Add beats, scenes, and choices to craft your branching narrative."
      choice:
        option "Continue" goto next_step

    beat next_step:
      say narrator "Edit this script to begin your story."
      end
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(story_identifier("new-story"), "new_story");
        assert_eq!(story_identifier("2nd act"), "_2nd_act");
    }

    #[test]
    fn template_parses_clean() {
        let result = skr_dsl::parse(&template("my \"tale\""));
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.script.metadata["id"], "my \"tale\"");
        assert_eq!(result.script.story().unwrap().id, "my__tale_");
    }
}
