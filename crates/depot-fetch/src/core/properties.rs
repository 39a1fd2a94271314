use std::collections::HashMap;
use std::io;

/// Parse `key=value` properties text.
///
/// Lines starting with `#` or `!` are comments. The key ends at the first
/// unescaped `=`, `:` or whitespace; whitespace around the separator is
/// skipped. `\t`, `\n`, `\r`, `\f` and `\uXXXX` are decoded; any other
/// escaped character stands for itself. Later keys overwrite earlier ones.
pub fn parse_properties(text: &str) -> io::Result<HashMap<String, String>> {
    let mut properties = HashMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = split_entry(line);
        let key = unescape(key).map_err(|e| invalid(index, e))?;
        let value = unescape(value).map_err(|e| invalid(index, e))?;
        properties.insert(key, value);
    }
    Ok(properties)
}

fn invalid(index: usize, reason: String) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line {}: {}", index + 1, reason),
    )
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start();
    let value = match rest.chars().next() {
        Some('=') | Some(':') => rest[1..].trim_start(),
        _ => rest,
    };
    (key, value)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\u escape: \\u{hex}"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
