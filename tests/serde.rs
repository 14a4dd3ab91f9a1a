use std::error::Error;
use std::str::FromStr;

use inetnum::addr::Prefix;
use stride_store::{PrefixRecord, RoutingTable};

#[test]
fn test_table_roundtrip() -> Result<(), Box<dyn Error>> {
    let mut table = RoutingTable::<u32>::new();
    table.insert(&Prefix::from_str("10.0.0.0/8")?, 1);
    table.insert(&Prefix::from_str("10.1.0.0/16")?, 2);
    table.insert(&Prefix::from_str("2001:db8::/32")?, 3);
    table.insert(&Prefix::from_str("0.0.0.0/0")?, 4);

    let json = serde_json::to_string(&table)?;
    // CIDR order, prefixes in canonical textual form
    assert_eq!(
        json,
        r#"[{"prefix":"0.0.0.0/0","value":4},{"prefix":"10.0.0.0/8","value":1},{"prefix":"10.1.0.0/16","value":2},{"prefix":"2001:db8::/32","value":3}]"#
    );

    let back: RoutingTable<u32> = serde_json::from_str(&json)?;
    assert_eq!(back, table);
    Ok(())
}

#[test]
fn test_empty_table() -> Result<(), Box<dyn Error>> {
    let table = RoutingTable::<u32>::new();
    let json = serde_json::to_string(&table)?;
    assert_eq!(json, "[]");
    let back: RoutingTable<u32> = serde_json::from_str(&json)?;
    assert!(back.is_empty());
    Ok(())
}

#[test]
fn test_record_roundtrip() -> Result<(), Box<dyn Error>> {
    let record =
        PrefixRecord::new(Prefix::from_str("192.0.2.0/24")?, "r1".to_string());
    let json = serde_json::to_string(&record)?;
    assert_eq!(json, r#"{"prefix":"192.0.2.0/24","value":"r1"}"#);
    assert_eq!(serde_json::from_str::<PrefixRecord<String>>(&json)?, record);
    Ok(())
}

#[test]
fn test_bad_prefix_is_rejected() {
    let json = r#"[{"prefix":"10.0.0.0","value":1}]"#;
    assert!(serde_json::from_str::<RoutingTable<u32>>(json).is_err());
}
