use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width in terminal columns (CJK and emoji count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `max_width` columns, appending "..." when text is cut.
///
/// Borrowed when the string already fits. Widths of 3 or less have no room
/// for an ellipsis and are cut without one.
///
/// ```
/// use catalog_admin::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("相框系列产品", 7), "相框...");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width > ELLIPSIS_WIDTH {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    } else {
        (max_width, "")
    };

    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// Remove control characters (except newline and tab) from server-provided text
/// before it reaches the terminal.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect(),
    )
}
