use super::MetadataRecord;
use crate::constants::MAX_NAME_SUFFIX_LENGTH;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

/// Compiled addressing patterns keyed by the unmodified suffix. Suffixes are
/// few per process, so entries are never evicted.
static NAME_PATTERNS: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// The addressing part of a metadata segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    pub metaname: Option<String>,
    /// Name with the full suffix appended, e.g. `name.kst`.
    pub name: String,
    pub recipient: String,
}

fn name_pattern(name_suffix: &str) -> Option<Regex> {
    let mut patterns = NAME_PATTERNS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(pattern) = patterns.get(name_suffix) {
        return Some(pattern.clone());
    }

    let truncated: String = name_suffix.chars().take(MAX_NAME_SUFFIX_LENGTH).collect();
    let source = format!(
        r"^(?:([a-z0-9_-]{{1,32}})@)?([a-z0-9]{{1,64}})\.{}$",
        regex::escape(&truncated)
    );

    match Regex::new(&source) {
        Ok(pattern) => {
            patterns.insert(name_suffix.to_owned(), pattern.clone());
            Some(pattern)
        }
        Err(err) => {
            tracing::warn!("Unusable name suffix {:?}: {}", name_suffix, err);
            None
        }
    }
}

/// Matches a whole segment against `[metaname@]name.<suffix>`.
pub fn parse_name_parts(name_suffix: &str, segment: &str) -> Option<NameParts> {
    if name_suffix.is_empty() || segment.is_empty() {
        return None;
    }

    let captures = name_pattern(name_suffix)?.captures(segment)?;

    let metaname = captures.get(1).map(|m| m.as_str().to_owned());
    let name = format!("{}.{}", captures.get(2)?.as_str(), name_suffix);
    let recipient = match &metaname {
        Some(metaname) => format!("{metaname}@{name}"),
        None => name.clone(),
    };

    Some(NameParts {
        metaname,
        name,
        recipient,
    })
}

/// Parses the `;`-delimited metadata mini-language.
///
/// The first segment is taken as the addressing segment when it matches
/// `[metaname@]name.<suffix>`; every other segment is split once on `=` into
/// the custom map. A `return` custom field is parsed for addressing exactly
/// one level deep and never searched for a nested `return`.
///
/// Total: any input, including the empty string, produces a record.
pub fn parse_metadata(raw: &str, name_suffix: &str) -> MetadataRecord {
    let mut record = MetadataRecord::default();

    if raw.is_empty() {
        return record;
    }

    let segments: Vec<&str> = raw.split(';').collect();
    let address = segments
        .first()
        .and_then(|first| parse_name_parts(name_suffix, first));

    for (index, segment) in segments.iter().enumerate() {
        if index == 0 && address.is_some() {
            continue;
        }

        match segment.split_once('=') {
            Some((key, value)) => {
                record.custom.insert(key.to_owned(), value.to_owned());
            }
            None => {
                record.custom.insert(index.to_string(), (*segment).to_owned());
            }
        }
    }

    if let Some(address) = address {
        record.metaname = address.metaname;
        record.name = Some(address.name);
        record.recipient = Some(address.recipient);
    }

    let return_parts = record
        .return_field()
        .and_then(|value| parse_name_parts(name_suffix, value));

    if let Some(parts) = return_parts {
        record.return_metaname = parts.metaname;
        record.return_name = Some(parts.name);
        record.return_recipient = Some(parts.recipient);
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_truncated_and_escaped() {
        // "a.b+cdefg" truncates to "a.b+cd"; the dot and plus must be literal.
        let parts = parse_name_parts("a.b+cdefg", "shop.a.b+cd");
        assert!(parts.is_some());
        assert!(parse_name_parts("a.b+cdefg", "shop.aXb+cd").is_none());
    }

    #[test]
    fn patterns_are_cached_per_suffix() {
        let _ = parse_name_parts("cache", "x.cache");
        let patterns = NAME_PATTERNS.lock().unwrap();
        assert!(patterns.contains_key("cache"));
    }

    #[test]
    fn uppercase_is_not_an_address() {
        assert!(parse_name_parts("kst", "Shop.kst").is_none());
    }
}
