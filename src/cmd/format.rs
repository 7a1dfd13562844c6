/*!
format.rs

Human-readable output helpers for the CLI (`list`, `call`).

  - StyleOptions::detect() -> StyleOptions   (NO_COLOR / NO_EMOJI / COLUMNS)
  - color(role, text, &style)
  - emoji(tag, &style)
  - box_header(title, subtitle, &style)
  - table(headers, rows, &style)
  - truncate_ellipsis(s, max_chars)

JSON output paths do not use these; machine output stays plain.
*/

use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        Self {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width,
        }
    }

    /// No color, no emoji, fixed width.
    pub fn plain(term_width: usize) -> Self {
        Self {
            use_color: false,
            use_emoji: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Success => "38;5;82",
        Role::Error => "38;5;196",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        "error" => "✖",
        "info" => "ℹ",
        "tool" => "🛠",
        "list" => "📜",
        "prompt" => "💬",
        _ => "",
    }
}

/// One-line boxed title with an optional dimmed subtitle.
pub fn box_header(title: &str, subtitle: Option<&str>, style: &StyleOptions) -> String {
    let max_inner = style.term_width.saturating_sub(4).max(10);
    let plain = match subtitle {
        Some(sub) => format!("{title}  {sub}"),
        None => title.to_string(),
    };
    let plain = truncate_ellipsis(&plain, max_inner);
    let width = display_width(&plain);

    // Color only the title part that survived truncation.
    let styled = match subtitle {
        Some(_) if plain.starts_with(title) => {
            let (head, rest) = plain.split_at(title.len());
            format!(
                "{}{}",
                color(Role::Primary, head, style),
                color(Role::Secondary, rest, style)
            )
        }
        _ => color(Role::Primary, &plain, style),
    };

    let rule = "─".repeat(width + 2);
    format!("┌{rule}┐\n│ {styled} │\n└{rule}┘")
}

/// Column separator width.
const GAP: usize = 2;

/// Left-aligned table; the widest columns shrink until it fits
/// `style.term_width`.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    const MIN_COL: usize = 3;
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell));
        }
    }

    let gaps = GAP * (widths.len() - 1);
    while widths.iter().sum::<usize>() + gaps > style.term_width {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if widest <= MIN_COL {
            break;
        }
        widths[idx] -= 1;
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(color(
        Role::Accent,
        render_row(&widths, headers.iter().copied()),
        style,
    ));
    let sep = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(&" ".repeat(GAP));
    lines.push(color(Role::Dim, sep, style));
    for row in rows {
        lines.push(render_row(&widths, row.iter().map(String::as_str)));
    }
    lines.join("\n")
}

fn render_row<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    widths
        .iter()
        .map(|w| fit(cells.next().unwrap_or(""), *w))
        .collect::<Vec<_>>()
        .join(&" ".repeat(GAP))
        .trim_end()
        .to_string()
}

/// Pad or cut `s` to exactly `width` display columns.
fn fit(s: &str, width: usize) -> String {
    let cut = truncate_ellipsis(s, width);
    let len = display_width(&cut);
    format!("{cut}{}", " ".repeat(width.saturating_sub(len)))
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    match max_chars {
        0 => String::new(),
        1 => "…".to_string(),
        n => {
            let mut out: String = s.chars().take(n - 1).collect();
            out.push('…');
            out
        }
    }
}

/// Drop `ESC [ ... <letter>` sequences.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_boxed() {
        let style = StyleOptions::plain(80);
        let b = box_header("Tools (27)", Some("kali-mcp-server"), &style);
        let lines: Vec<_> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "│ Tools (27)  kali-mcp-server │");
        assert_eq!(
            lines[0].chars().count(),
            lines[1].chars().count()
        );
    }

    #[test]
    fn table_aligns_and_shrinks() {
        let style = StyleOptions::plain(40);
        let rows = vec![
            vec!["1".into(), "url_encode".into(), "URL-encode a string.".into()],
            vec![
                "2".into(),
                "send_http2_request".into(),
                "Send an HTTP/2 request with pseudo-headers and more text".into(),
            ],
        ];
        let t = table(&["#", "NAME", "DESCRIPTION"], &rows, &style);
        let lines: Vec<_> = t.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("#  NAME"));
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
        assert!(lines[3].ends_with('…'));
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_ellipsis("abc", 0), "");
    }

    #[test]
    fn strip_ansi_removes_sequences() {
        assert_eq!(strip_ansi("\x1b[31mRED\x1b[0m"), "RED");
        let style = StyleOptions {
            use_color: true,
            use_emoji: false,
            term_width: 80,
        };
        assert_eq!(display_width(&color(Role::Error, "abc", &style)), 3);
    }
}
