/// Largest exact square footage accepted for a residential unit.
pub const MAX_PLAUSIBLE_SQFT: u32 = 5000;

/// Extract a reliable exact square footage from a free-text source field.
///
/// Returns `None` for open-ended values (`+450`), bare ranges (`500-600`),
/// unverified third-party figures, text without a 3-4 digit run, and values
/// above [`MAX_PLAUSIBLE_SQFT`].
pub fn extract_exact_sqft(source: Option<&str>) -> Option<u32> {
    let raw = source?.trim();
    if raw.is_empty() || is_open_ended(raw) || is_bare_range(raw) {
        return None;
    }
    if raw.to_ascii_lowercase().contains("3rd party") {
        return None;
    }

    let value = first_digit_run(&strip_thousands_separators(raw))?;
    (value <= MAX_PLAUSIBLE_SQFT).then_some(value)
}

fn is_open_ended(raw: &str) -> bool {
    raw.strip_prefix('+')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|ch| ch.is_ascii_digit())
}

fn is_bare_range(raw: &str) -> bool {
    match raw.split_once('-') {
        Some((low, high)) => is_number(low.trim()) && is_number(high.trim()),
        None => false,
    }
}

fn is_number(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// Drop commas that group digits in threes (`1,150`); list commas (`3,4` or `850, 900`) stay.
fn strip_thousands_separators(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(index, ch)| {
            if **ch != ',' || *index == 0 || !chars[index - 1].is_ascii_digit() {
                return true;
            }
            let group = &chars[index + 1..];
            let grouped = group.len() >= 3
                && group[..3].iter().all(char::is_ascii_digit)
                && !group.get(3).is_some_and(char::is_ascii_digit);
            !grouped
        })
        .map(|(_, ch)| *ch)
        .collect()
}

fn first_digit_run(text: &str) -> Option<u32> {
    text.split(|ch: char| !ch.is_ascii_digit())
        .find(|run| (3..=4).contains(&run.len()))
        .and_then(|run| run.parse().ok())
}
