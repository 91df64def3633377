use super::Facts;

const MEMORY_KEY: &str = "memory";
const CPU_KEY: &str = "cpu";

/// Build a normalized copy of `raw`.
///
/// Keys are lower-cased; a "used / total (percent)" memory report is cut
/// down to the total and a CPU model loses its "@ clock" suffix. Anything
/// else passes through. Later pairs overwrite earlier ones when their keys
/// collide after lower-casing.
pub fn normalize<I, K, V>(raw: I) -> Facts
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    raw.into_iter()
        .map(|(key, value)| {
            let key = key.as_ref().to_lowercase();
            let value = normalize_value(&key, value.as_ref());
            (key, value)
        })
        .collect()
}

/// Normalize one value given its already lower-cased key.
pub fn normalize_value(key: &str, value: &str) -> String {
    match key {
        MEMORY_KEY => memory_total(value),
        CPU_KEY => cpu_model(value),
        _ => None,
    }
    .unwrap_or(value)
    .to_string()
}

/// "7.8GiB / 15.6GiB (50%)" -> "15.6GiB"
fn memory_total(value: &str) -> Option<&str> {
    let slash = value.find('/')?;
    let paren = value.find('(')?;
    // skip the slash and the separator after it, drop the separator before '('
    value.get(slash + 2..paren.checked_sub(1)?)
}

/// "Intel i7-9700K @ 3.60GHz" -> "Intel i7-9700K"
fn cpu_model(value: &str) -> Option<&str> {
    let at = value.find('@')?;
    value.get(..at.saturating_sub(1))
}
