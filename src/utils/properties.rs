//! Java `.properties` reader: `key=value`, `key: value` or `key value`
//! lines, `#`/`!` comments, backslash line continuations.

use std::collections::BTreeMap;

pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    let mut pending = String::new();

    for raw in content.lines() {
        let line = raw.trim_start();

        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }
        pending.push_str(line);

        let logical = std::mem::take(&mut pending);
        if let Some((key, value)) = split_pair(&logical) {
            values.insert(key, value);
        }
    }

    if !pending.is_empty() {
        if let Some((key, value)) = split_pair(&pending) {
            values.insert(key, value);
        }
    }

    values
}

fn split_pair(line: &str) -> Option<(String, String)> {
    let Some(idx) = line.find(['=', ':', ' ', '\t']) else {
        let key = line.trim();
        return (!key.is_empty()).then(|| (key.to_string(), String::new()));
    };
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    let mut rest = line[idx..].trim_start();
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }
    Some((key.to_string(), rest.trim_end().to_string()))
}
