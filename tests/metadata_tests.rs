use krist_realtime::metadata::{MetadataRecord, parse_metadata, parse_name_parts};
use std::collections::BTreeMap;

fn custom(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn parses_address_with_return_and_custom_fields() {
    let record = parse_metadata("xx@name.kst;return=yy@other.kst;note=hi", "kst");

    assert_eq!(record.metaname.as_deref(), Some("xx"));
    assert_eq!(record.name.as_deref(), Some("name.kst"));
    assert_eq!(record.recipient.as_deref(), Some("xx@name.kst"));
    assert_eq!(
        record.custom,
        custom(&[("return", "yy@other.kst"), ("note", "hi")])
    );
    assert_eq!(record.return_metaname.as_deref(), Some("yy"));
    assert_eq!(record.return_name.as_deref(), Some("other.kst"));
    assert_eq!(record.return_recipient.as_deref(), Some("yy@other.kst"));
}

#[test]
fn bare_value_is_keyed_by_position() {
    let record = parse_metadata("justvalue", "kst");

    assert_eq!(record.custom, custom(&[("0", "justvalue")]));
    assert_eq!(record.name, None);
    assert_eq!(record.recipient, None);
    assert_eq!(record.metaname, None);
}

#[test]
fn positional_keys_count_the_address_segment() {
    let record = parse_metadata("shop.kst;first;k=v;third", "kst");

    assert_eq!(record.name.as_deref(), Some("shop.kst"));
    assert_eq!(record.recipient.as_deref(), Some("shop.kst"));
    assert_eq!(
        record.custom,
        custom(&[("1", "first"), ("k", "v"), ("3", "third")])
    );
}

#[test]
fn value_keeps_everything_after_first_equals() {
    let record = parse_metadata("message=a=b=c", "kst");
    assert_eq!(record.custom, custom(&[("message", "a=b=c")]));
}

#[test]
fn never_fails_on_degenerate_input() {
    assert!(parse_metadata("", "kst").is_empty());

    let only_separators = parse_metadata(";;", "kst");
    assert_eq!(
        only_separators.custom,
        custom(&[("0", ""), ("1", ""), ("2", "")])
    );

    let long = "a".repeat(10_000);
    let record = parse_metadata(&format!("{long}.kst"), "kst");
    assert_eq!(record.name, None);
    assert_eq!(record.custom.len(), 1);

    let long_metaname = format!("{}@name.kst", "m".repeat(33));
    assert_eq!(parse_metadata(&long_metaname, "kst").recipient, None);

    // Without a suffix nothing is an address.
    assert_eq!(parse_metadata("name.kst", "").recipient, None);
}

#[test]
fn parsing_is_deterministic() {
    let input = "xx@name.kst;return=yy@other.kst;note=hi";
    assert_eq!(parse_metadata(input, "kst"), parse_metadata(input, "kst"));
}

#[test]
fn return_is_parsed_one_level_only() {
    let record = parse_metadata("return=a@b.kst;return=c.kst", "kst");

    // The last `return` wins, and its value is parsed once.
    assert_eq!(record.return_field(), Some("c.kst"));
    assert_eq!(record.return_name.as_deref(), Some("c.kst"));
    assert_eq!(record.return_metaname, None);

    let nested = parse_metadata("return=x.kst;return=y@z.kst", "kst");
    assert_eq!(nested.return_recipient.as_deref(), Some("y@z.kst"));

    // A `return` value that is not an address leaves the return fields empty.
    let not_address = parse_metadata("return=nope", "kst");
    assert_eq!(
        not_address,
        MetadataRecord {
            custom: custom(&[("return", "nope")]),
            ..Default::default()
        }
    );
}

#[test]
fn address_must_fill_the_whole_segment() {
    assert!(parse_name_parts("kst", "name.kst").is_some());
    assert!(parse_name_parts("kst", "name.kstx").is_none());
    assert!(parse_name_parts("kst", "xx@name.kst=1").is_none());
    assert!(parse_name_parts("kst", "under_score.kst").is_none());
    assert!(parse_name_parts("kst", "meta_name-1@name.kst").is_some());
}

#[test]
fn long_suffix_keeps_full_suffix_in_name() {
    // The pattern only sees the first six characters of the suffix.
    let parts = parse_name_parts("abcdefgh", "shop.abcdef").expect("truncated suffix matches");
    assert_eq!(parts.name, "shop.abcdefgh");
    assert_eq!(parts.recipient, "shop.abcdefgh");
}
