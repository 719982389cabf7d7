use std::cmp::Ordering;

/// Compare two loosely formatted version strings (`10.2.1`, `2019.3`,
/// `Xcode_11.3.1`). Numeric runs compare numerically, missing trailing
/// components count as zero, and plain string order breaks ties.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let va = numeric_components(a);
    let vb = numeric_components(b);

    if va.is_empty() || vb.is_empty() {
        return a.cmp(b);
    }

    let len = va.len().max(vb.len());
    for idx in 0..len {
        let x = va.get(idx).copied().unwrap_or(0);
        let y = vb.get(idx).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    a.cmp(b)
}

/// Pick the maximum-by-version item.
pub fn max_by_version<'a, T, F>(items: &'a [T], key: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    items
        .iter()
        .max_by(|x, y| compare_versions(key(*x), key(*y)))
}

pub(crate) fn numeric_components(input: &str) -> Vec<u64> {
    input
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse::<u64>().ok())
        .collect()
}
