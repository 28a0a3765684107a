use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;
use miette::Diagnostic;
use skr_core::Script;
use skr_fiction::{Session, SessionConfig, SessionError, resolve_choice};

pub fn run(file: &Path, scene: Option<&str>, choose: &[String]) -> Result<(), String> {
    let script = load_script(file)?;
    let config = match scene {
        Some(scene) => SessionConfig::default().with_starting_scene(scene),
        None => SessionConfig::default(),
    };
    let session = Session::with_config(&script, &config).map_err(|e| describe(&e))?;

    if choose.is_empty() {
        interactive(session, &script, &config)
    } else {
        transcript(session, choose)
    }
}

/// A `.json` file is a built script; anything else is parsed as source.
fn load_script(file: &Path) -> Result<Script, String> {
    if file.extension().is_some_and(|ext| ext == "json") {
        let json =
            fs::read_to_string(file).map_err(|e| format!("cannot read {}: {e}", file.display()))?;
        Script::from_json(&json).map_err(|e| e.to_string())
    } else {
        super::parse_file(file)
    }
}

/// Play the given choices in order, printing every beat on the way.
fn transcript(mut session: Session, choose: &[String]) -> Result<(), String> {
    print_beat(&session);
    for input in choose {
        let choices = session.choices();
        let choice = resolve_choice(&choices, input)
            .ok_or_else(|| format!("no choice matches \"{input}\""))?;
        println!("{} {}\n", ">".bold(), choice.label);
        session.choose(&choice.id).map_err(|e| describe(&e))?;
        print_beat(&session);
    }
    Ok(())
}

fn interactive(mut session: Session, script: &Script, config: &SessionConfig) -> Result<(), String> {
    println!("  Type a number, id or label to choose.");
    println!("  Commands: 'undo', 'restart', 'quit'.\n");
    print_beat(&session);

    let mut history: Vec<Session> = Vec::new();
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "q" => break,
            "undo" => {
                match history.pop() {
                    Some(previous) => {
                        session = previous;
                        print_beat(&session);
                    }
                    None => println!("{}\n", "Nothing to undo.".yellow()),
                }
                continue;
            }
            "restart" => {
                session = Session::with_config(script, config).map_err(|e| describe(&e))?;
                history.clear();
                print_beat(&session);
                continue;
            }
            _ => {}
        }

        let choices = session.choices();
        let Some(choice) = resolve_choice(&choices, input) else {
            if session.is_ended() {
                println!("{}\n", "The story has ended. Try 'undo' or 'restart'.".yellow());
            } else {
                println!("{}\n", format!("No choice matches \"{input}\".").yellow());
            }
            continue;
        };

        let snapshot = session.clone();
        match session.choose(&choice.id) {
            Ok(()) => {
                history.push(snapshot);
                print_beat(&session);
            }
            Err(e) => println!("{}\n", describe(&e).yellow()),
        }
    }

    Ok(())
}

fn print_beat(session: &Session) {
    println!("{}", format!("[{}]", session.current_beat_id()).dimmed());
    let text = session.text();
    if !text.is_empty() {
        println!("{text}");
    }
    println!();

    if session.is_ended() {
        println!("  {}\n", "The End".bold());
        return;
    }
    for (i, choice) in session.choices().iter().enumerate() {
        match &choice.when {
            Some(when) => println!(
                "  {}. {} {}",
                i + 1,
                choice.label,
                format!("(when {when})").dimmed()
            ),
            None => println!("  {}. {}", i + 1, choice.label),
        }
    }
    println!();
}

/// The error message, followed by its help text when there is one.
fn describe(error: &SessionError) -> String {
    match error.help() {
        Some(help) => format!("{error}\n  help: {help}"),
        None => error.to_string(),
    }
}
