//! Pure string operations backing the `str` method surface.
//!
//! Everything here works on `&str` and plain Rust types; allocation into the
//! heap and argument unpacking happen at the dispatch layer. Semantics follow
//! Python's: `split` with no separator collapses whitespace runs, `strip`
//! trims by character set, find/index return character (not byte) positions,
//! and case predicates are ASCII-scoped.

use crate::exception_private::{ExcType, RunResult};

/// `s.split()` — whitespace mode: leading/trailing runs produce no empties.
pub(crate) fn split_whitespace(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// `s.split(sep[, maxsplit])`. An empty separator is a `ValueError`.
pub(crate) fn split_sep(s: &str, sep: &str, maxsplit: Option<i64>) -> RunResult<Vec<String>> {
    if sep.is_empty() {
        return Err(ExcType::value_error("empty separator"));
    }
    let result = match maxsplit {
        Some(n) if n >= 0 => s.splitn(n as usize + 1, sep).map(str::to_string).collect(),
        _ => s.split(sep).map(str::to_string).collect(),
    };
    Ok(result)
}

/// `s.rsplit(sep[, maxsplit])`.
pub(crate) fn rsplit_sep(s: &str, sep: &str, maxsplit: Option<i64>) -> RunResult<Vec<String>> {
    if sep.is_empty() {
        return Err(ExcType::value_error("empty separator"));
    }
    let mut parts: Vec<String> = match maxsplit {
        Some(n) if n >= 0 => s.rsplitn(n as usize + 1, sep).map(str::to_string).collect(),
        _ => s.rsplit(sep).map(str::to_string).collect(),
    };
    parts.reverse();
    Ok(parts)
}

/// `s.splitlines()` — split on `\n`, `\r\n`, `\r`, without keeping ends.
pub(crate) fn splitlines(s: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Which sides `strip`/`lstrip`/`rstrip` trim.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum StripMode {
    Both,
    Left,
    Right,
}

/// `s.strip([chars])` family. `chars` of `None` trims whitespace.
pub(crate) fn strip(s: &str, chars: Option<&str>, mode: StripMode) -> String {
    let should_trim = |c: char| match chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };
    let mut start = 0;
    let mut end = s.len();
    if mode != StripMode::Right {
        for (idx, c) in s.char_indices() {
            if should_trim(c) {
                start = idx + c.len_utf8();
            } else {
                start = idx;
                break;
            }
        }
        if s[start..].chars().next().is_none() && s.chars().all(should_trim) {
            return String::new();
        }
    }
    if mode != StripMode::Left {
        for (idx, c) in s[start..].char_indices().rev() {
            if should_trim(c) {
                end = start + idx;
            } else {
                end = start + idx + c.len_utf8();
                break;
            }
        }
    }
    s[start..end.max(start)].to_string()
}

/// `s.find(sub[, start[, end]])` in character positions; -1 when absent.
pub(crate) fn find(s: &str, sub: &str, start: Option<i64>, end: Option<i64>, from_right: bool) -> i64 {
    let chars: Vec<char> = s.chars().collect();
    let (lo, hi) = char_range(chars.len(), start, end);
    let window: String = chars[lo..hi].iter().collect();
    let found = if from_right {
        window.rfind(sub)
    } else {
        window.find(sub)
    };
    match found {
        Some(byte_idx) => {
            let char_offset = window[..byte_idx].chars().count();
            (lo + char_offset) as i64
        }
        None => -1,
    }
}

/// `s.count(sub[, start[, end]])`. An empty needle counts gaps, like Python.
pub(crate) fn count(s: &str, sub: &str, start: Option<i64>, end: Option<i64>) -> i64 {
    let chars: Vec<char> = s.chars().collect();
    let (lo, hi) = char_range(chars.len(), start, end);
    let window: String = chars[lo..hi].iter().collect();
    if sub.is_empty() {
        return window.chars().count() as i64 + 1;
    }
    let mut n = 0i64;
    let mut rest = window.as_str();
    while let Some(idx) = rest.find(sub) {
        n += 1;
        rest = &rest[idx + sub.len()..];
    }
    n
}

/// Normalizes optional start/end slice bounds to a char range.
fn char_range(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let norm = |v: i64| {
        let v = if v < 0 { v + len } else { v };
        v.clamp(0, len) as usize
    };
    let lo = start.map_or(0, norm);
    let hi = end.map_or(len as usize, norm);
    (lo, hi.max(lo))
}

/// `s.replace(old, new[, count])`. An empty `old` inserts between chars.
pub(crate) fn replace(s: &str, old: &str, new: &str, max: Option<i64>) -> String {
    let limit = match max {
        Some(n) if n >= 0 => n as usize,
        _ => usize::MAX,
    };
    if old.is_empty() {
        let mut out = String::new();
        let mut done = 0usize;
        out.push_str(new);
        for c in s.chars() {
            out.push(c);
            done += 1;
            if done < limit {
                out.push_str(new);
            }
        }
        return out;
    }
    let mut out = String::new();
    let mut rest = s;
    let mut done = 0usize;
    while done < limit {
        match rest.find(old) {
            Some(idx) => {
                out.push_str(&rest[..idx]);
                out.push_str(new);
                rest = &rest[idx + old.len()..];
                done += 1;
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// `s.zfill(width)`: left-pad with zeros, keeping a leading sign in place.
pub(crate) fn zfill(s: &str, width: i64) -> String {
    let current = s.chars().count() as i64;
    if width <= current {
        return s.to_string();
    }
    let pad = (width - current) as usize;
    let zeros: String = "0".repeat(pad);
    match s.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{zeros}{}", &s[1..]),
        _ => format!("{zeros}{s}"),
    }
}

/// `s.title()`: uppercase after every non-alphabetic character.
pub(crate) fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.extend(chars.flat_map(char::to_lowercase));
            out
        }
        None => String::new(),
    }
}

// ASCII-scoped case predicates, matching the supported text surface.

pub(crate) fn is_digit(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

pub(crate) fn is_alnum(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphanumeric)
}

pub(crate) fn is_space(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_whitespace)
}

pub(crate) fn is_upper(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

pub(crate) fn is_lower(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            has_cased = true;
        }
    }
    has_cased
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_whitespace_collapses_runs() {
        assert_eq!(split_whitespace("  a  b \t c "), vec!["a", "b", "c"]);
        assert!(split_whitespace("   ").is_empty());
    }

    #[test]
    fn split_sep_keeps_empties() {
        assert_eq!(split_sep("a,,b", ",", None).unwrap(), vec!["a", "", "b"]);
        assert_eq!(split_sep("a,b,c", ",", Some(1)).unwrap(), vec!["a", "b,c"]);
        assert!(split_sep("ab", "", None).is_err());
    }

    #[test]
    fn rsplit_respects_maxsplit_from_the_right() {
        assert_eq!(rsplit_sep("a,b,c", ",", Some(1)).unwrap(), vec!["a,b", "c"]);
    }

    #[test]
    fn strip_modes() {
        assert_eq!(strip("  ab  ", None, StripMode::Both), "ab");
        assert_eq!(strip("  ab  ", None, StripMode::Left), "ab  ");
        assert_eq!(strip("  ab  ", None, StripMode::Right), "  ab");
        assert_eq!(strip("xxabxx", Some("x"), StripMode::Both), "ab");
        assert_eq!(strip("xxx", Some("x"), StripMode::Both), "");
    }

    #[test]
    fn find_uses_char_positions() {
        assert_eq!(find("héllo", "llo", None, None, false), 2);
        assert_eq!(find("abcabc", "bc", Some(2), None, false), 4);
        assert_eq!(find("abc", "z", None, None, false), -1);
        assert_eq!(find("abcabc", "bc", None, None, true), 4);
    }

    #[test]
    fn count_with_bounds() {
        assert_eq!(count("aaaa", "aa", None, None), 2);
        assert_eq!(count("abcabc", "abc", Some(1), None), 1);
        assert_eq!(count("ab", "", None, None), 3);
    }

    #[test]
    fn replace_with_limit() {
        assert_eq!(replace("a-b-c", "-", "+", None), "a+b+c");
        assert_eq!(replace("a-b-c", "-", "+", Some(1)), "a+b-c");
        assert_eq!(replace("ab", "", "-", None), "-a-b-");
    }

    #[test]
    fn zfill_keeps_sign() {
        assert_eq!(zfill("42", 5), "00042");
        assert_eq!(zfill("-42", 5), "-0042");
        assert_eq!(zfill("42", 1), "42");
    }

    #[test]
    fn title_and_capitalize() {
        assert_eq!(title("hello world"), "Hello World");
        assert_eq!(title("it's a test"), "It'S A Test");
        assert_eq!(capitalize("hELLO"), "Hello");
    }

    #[test]
    fn splitlines_handles_crlf() {
        assert_eq!(splitlines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(splitlines("a\n"), vec!["a"]);
    }

    #[test]
    fn case_predicates() {
        assert!(is_digit("123"));
        assert!(!is_digit(""));
        assert!(is_upper("ABC1"));
        assert!(!is_upper("123"));
        assert!(is_lower("abc1"));
    }
}
