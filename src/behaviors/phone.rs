use std::sync::OnceLock;

use fancy_regex::Regex;

use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::page::Page;

fn non_digit_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    // [^0-9] rather than \D: the class must not let Unicode digits through,
    // the formatter slices the stripped string bytewise.
    let pattern = Regex::new(r"[^0-9]").map_err(|err| Error::Pattern(err.to_string()))?;
    Ok(PATTERN.get_or_init(|| pattern))
}

/// Rewrites a raw phone string into `(DD) DDDDD-DDDD` form, or the longest
/// prefix of it the available digits allow. Non-digit characters are
/// stripped, never rejected; digits past the eleventh are dropped.
pub fn format_phone(raw: &str) -> Result<String> {
    let digits = non_digit_pattern()?.replace_all(raw, "").into_owned();

    let mut out = String::new();
    if !digits.is_empty() {
        out.push('(');
        out.push_str(&digits[..digits.len().min(2)]);
    }
    if digits.len() > 2 {
        out.push_str(") ");
        out.push_str(&digits[2..digits.len().min(7)]);
    }
    if digits.len() > 7 {
        out.push('-');
        out.push_str(&digits[7..digits.len().min(11)]);
    }
    Ok(out)
}

pub(crate) fn reformat_target(page: &mut Page, target: NodeId) -> Result<()> {
    let raw = page.dom.value(target)?;
    let formatted = format_phone(&raw)?;
    // Writing the value back does not re-fire "input", matching how a value
    // assignment behaves in a handler.
    page.dom.set_value(target, &formatted)
}

#[cfg(test)]
mod tests {
    use super::format_phone;

    #[test]
    fn formats_digit_prefixes_at_every_boundary() -> crate::Result<()> {
        assert_eq!(format_phone("")?, "");
        assert_eq!(format_phone("1")?, "(1");
        assert_eq!(format_phone("11")?, "(11");
        assert_eq!(format_phone("119")?, "(11) 9");
        assert_eq!(format_phone("1198765")?, "(11) 98765");
        assert_eq!(format_phone("11987654")?, "(11) 98765-4");
        assert_eq!(format_phone("11987654321")?, "(11) 98765-4321");
        Ok(())
    }

    #[test]
    fn strips_punctuation_and_letters_before_formatting() -> crate::Result<()> {
        assert_eq!(format_phone("(11) 98765-4321")?, "(11) 98765-4321");
        assert_eq!(format_phone("+55 11 9.8765.4321")?, "(55) 11987-6543");
        assert_eq!(format_phone("abc")?, "");
        Ok(())
    }

    #[test]
    fn extra_digits_are_dropped_after_the_eleventh() -> crate::Result<()> {
        assert_eq!(format_phone("119876543210000")?, "(11) 98765-4321");
        Ok(())
    }
}
