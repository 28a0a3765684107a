use strsim::jaro_winkler;

use crate::session::SessionChoice;

/// Minimum similarity score for fuzzy label matching (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// Pick the choice a player meant.
///
/// Tries, in order: a 1-based number, an exact id, a case-insensitive label,
/// and the closest label by Jaro-Winkler similarity.
pub fn resolve_choice<'a>(choices: &'a [SessionChoice], input: &str) -> Option<&'a SessionChoice> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(number) = input.parse::<usize>() {
        return number.checked_sub(1).and_then(|i| choices.get(i));
    }

    if let Some(choice) = choices.iter().find(|c| c.id == input) {
        return Some(choice);
    }

    let input_lower = input.to_lowercase();
    if let Some(choice) = choices
        .iter()
        .find(|c| c.label.to_lowercase() == input_lower)
    {
        return Some(choice);
    }

    let mut best: Option<(&SessionChoice, f64)> = None;
    for choice in choices {
        let score = jaro_winkler(&input_lower, &choice.label.to_lowercase());
        if score >= FUZZY_THRESHOLD && best.is_none_or(|(_, top)| score > top) {
            best = Some((choice, score));
        }
    }
    best.map(|(choice, _)| choice)
}
