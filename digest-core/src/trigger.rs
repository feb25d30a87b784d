//! Detection of summary triggers (`@bot N`) and parsing of the requested count.

use crate::error::UserInputError;
use crate::history::HISTORY_CAPACITY;

/// Count used when the trigger carries no number.
pub const DEFAULT_COUNT: usize = 1;

/// Byte offset just past `@bot_username` in `text` (case-insensitive).
fn mention_end(text: &str, bot_username: &str) -> Option<usize> {
    if bot_username.is_empty() {
        return None;
    }
    let needle = format!("@{}", bot_username.to_lowercase());
    let haystack = text.to_lowercase();
    // Lowercasing may change byte lengths for non-ASCII text; only trust ASCII offsets.
    if haystack.len() != text.len() {
        return text.find(&format!("@{}", bot_username)).map(|i| i + needle.len());
    }
    haystack.find(&needle).map(|i| i + needle.len())
}

/// Validates the count argument: absent means [`DEFAULT_COUNT`], otherwise `1..=500`.
pub fn parse_count(arg: Option<&str>) -> Result<usize, UserInputError> {
    let Some(arg) = arg.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(DEFAULT_COUNT);
    };
    let n: i64 = match arg.parse() {
        Ok(n) => n,
        Err(_) => {
            let digits = arg.strip_prefix(&['+', '-'][..]).unwrap_or(arg);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(UserInputError::InvalidNumber);
            }
            // Integer that does not fit i64.
            return Err(if arg.starts_with('-') {
                UserInputError::NotPositive
            } else {
                UserInputError::TooGreedy
            });
        }
    };
    if n <= 0 {
        return Err(UserInputError::NotPositive);
    }
    if n > HISTORY_CAPACITY as i64 {
        return Err(UserInputError::TooGreedy);
    }
    Ok(n as usize)
}

/// `None` when the message is not a trigger; otherwise the parsed count of the token
/// following the mention.
pub fn parse_trigger(text: &str, bot_username: &str) -> Option<Result<usize, UserInputError>> {
    let end = mention_end(text, bot_username)?;
    let rest = text.get(end..).unwrap_or_default();
    // "@botname2" is a different account.
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    Some(parse_count(rest.split_whitespace().next()))
}
