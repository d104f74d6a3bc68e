use crate::error::{Error, Result};

pub const INPUT_FORMAT_HINT: &str =
    "Input error! Please try again.\nFormat: <command> <#s comma delimited>\nExample: s 3,2,1";

/// Shortens `value` to at most `max` characters, ending in `...` when cut.
pub fn cut_string(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return value.chars().take(max).collect();
    }
    let mut cut: String = value.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

/// An action typed at the interactive list prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    Next,
    Back,
    Play(Vec<u32>),
    Save(Vec<u32>),
}

/// Parses `n`, `b`, `p <#>` or `s <#,#,...>`.
///
/// Selection numbers that do not parse are skipped; a selection with no
/// valid number at all is an input error.
pub fn parse_list_action(input: &str) -> Result<ListAction> {
    let input = input.trim().to_lowercase();
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        "n" => return Ok(ListAction::Next),
        "b" => return Ok(ListAction::Back),
        "p" | "s" => {}
        other => {
            return Err(Error::InvalidInput(format!("Command [{other}] not found.")));
        }
    }

    let indices = parse_indices(parts.next().unwrap_or_default());
    if indices.is_empty() {
        return Err(Error::InvalidInput(INPUT_FORMAT_HINT.to_string()));
    }

    Ok(match command {
        "p" => ListAction::Play(indices),
        _ => ListAction::Save(indices),
    })
}

/// Parses a comma separated list of positive numbers, keeping input order and
/// dropping duplicates.
pub fn parse_indices(value: &str) -> Vec<u32> {
    let mut indices = Vec::new();
    for index in value.split(',').filter_map(|i| i.trim().parse::<u32>().ok()) {
        if index > 0 && !indices.contains(&index) {
            indices.push(index);
        }
    }
    indices
}
