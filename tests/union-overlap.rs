use std::error::Error;
use std::str::FromStr;

use inetnum::addr::Prefix;
use stride_store::RoutingTable;

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

fn table_of(entries: &[(&str, u32)]) -> RoutingTable<u32> {
    entries
        .iter()
        .map(|(p, v)| (Prefix::from_str(p).unwrap(), *v))
        .collect()
}

#[test]
fn test_union_merges_and_right_biases() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut t1 = table_of(&[
        ("10.0.0.0/8", 1),
        ("192.168.0.0/24", 3),
        ("2001:db8::/32", 5),
    ]);
    let t2 = table_of(&[("10.0.0.0/8", 2), ("10.1.0.0/16", 4)]);

    t1.union_with(&t2);

    // 5 inserts, 1 duplicate
    assert_eq!(t1.len(), 4);
    assert_eq!(t1.len4(), 3);
    assert_eq!(t1.get(&Prefix::from_str("10.0.0.0/8")?), Some(&2));
    assert_eq!(t1.get(&Prefix::from_str("10.1.0.0/16")?), Some(&4));
    assert_eq!(t1.get(&Prefix::from_str("192.168.0.0/24")?), Some(&3));
    assert_eq!(t1.get(&Prefix::from_str("2001:db8::/32")?), Some(&5));
    Ok(())
}

#[test]
fn test_union_equals_inserting_everything() -> Result<(), Box<dyn Error>> {
    common::init();

    // all pairings of compressed entries, subnodes and stride prefixes
    let left = [
        ("0.0.0.0/0", 1),
        ("10.0.0.0/8", 2),
        ("10.1.2.0/24", 3),
        ("172.16.0.0/12", 4),
        ("192.168.0.0/16", 5),
        ("192.168.1.0/30", 6),
    ];
    let right = [
        ("10.0.0.0/8", 10),
        ("10.1.0.0/16", 11),
        ("172.16.5.0/24", 12),
        ("192.168.0.0/16", 13),
        ("198.51.100.0/24", 14),
    ];

    let mut unioned = table_of(&left);
    unioned.union_with(&table_of(&right));

    let mut inserted = table_of(&left);
    for (p, v) in &right {
        inserted.insert(&Prefix::from_str(p)?, *v);
    }

    assert_eq!(unioned, inserted);
    assert_eq!(unioned.len(), left.len() + right.len() - 2);

    let merged: Vec<(Prefix, u32)> =
        unioned.iter_sorted().map(|(p, v)| (p, *v)).collect();
    let expected: Vec<(Prefix, u32)> = [
        ("0.0.0.0/0", 1_u32),
        ("10.0.0.0/8", 10),
        ("10.1.0.0/16", 11),
        ("10.1.2.0/24", 3),
        ("172.16.0.0/12", 4),
        ("172.16.5.0/24", 12),
        ("192.168.0.0/16", 13),
        ("192.168.1.0/30", 6),
        ("198.51.100.0/24", 14),
    ]
    .iter()
    .map(|(p, v)| (Prefix::from_str(p).unwrap(), *v))
    .collect();
    assert_eq!(merged, expected);
    Ok(())
}

#[test]
fn test_union_into_empty() -> Result<(), Box<dyn Error>> {
    common::init();

    let t2 = table_of(&[("10.0.0.0/8", 1), ("10.1.0.0/16", 2)]);
    let mut t1 = RoutingTable::<u32>::new();
    t1.union_with(&t2);

    assert_eq!(t1, t2);
    Ok(())
}

#[test]
fn test_overlaps_prefix() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut table = RoutingTable::<u32>::new();
    table.insert(&Prefix::from_str("192.168.0.0/24")?, 1);

    // covering, covered and exact probes all overlap
    assert!(table.overlaps_prefix(&Prefix::from_str("192.168.0.0/24")?));
    assert!(table.overlaps_prefix(&Prefix::from_str("192.168.0.0/16")?));
    assert!(table.overlaps_prefix(&Prefix::from_str("192.168.0.128/25")?));
    assert!(table.overlaps_prefix(&Prefix::from_str("192.168.0.1/32")?));
    // disjoint probes do not
    assert!(!table.overlaps_prefix(&Prefix::from_str("10.0.0.0/8")?));
    assert!(!table.overlaps_prefix(&Prefix::from_str("192.168.1.0/24")?));
    Ok(())
}

#[test]
fn test_overlaps_tables() -> Result<(), Box<dyn Error>> {
    common::init();

    let t1 = table_of(&[("192.168.0.0/24", 1)]);
    let t2 = table_of(&[("192.168.0.128/25", 2)]);
    let t3 = table_of(&[("10.0.0.0/8", 3)]);

    assert!(t1.overlaps(&t2));
    assert!(t2.overlaps(&t1));
    assert!(!t1.overlaps(&t3));
    assert!(!t3.overlaps(&t1));

    // stride prefixes against deeper child slots
    let wide = table_of(&[("0.0.0.0/2", 4)]);
    let deep = table_of(&[("10.1.2.3/32", 5)]);
    assert!(wide.overlaps(&deep));
    assert!(deep.overlaps(&wide));

    // families do not mix
    let v6 = table_of(&[("::/0", 6)]);
    assert!(!t1.overlaps(&v6));
    assert!(v6.overlaps(&v6));
    assert!(!t1.overlaps_v6(&t2));
    Ok(())
}

#[test]
fn test_overlap_is_symmetric() -> Result<(), Box<dyn Error>> {
    common::init();

    let tables = [
        table_of(&[("10.0.0.0/8", 1), ("192.168.0.0/16", 2)]),
        table_of(&[("10.128.0.0/9", 3)]),
        table_of(&[("11.0.0.0/8", 4), ("192.168.3.0/24", 5)]),
        table_of(&[("0.0.0.0/0", 6)]),
        table_of(&[("203.0.113.0/24", 7)]),
        RoutingTable::new(),
    ];

    for a in &tables {
        for b in &tables {
            assert_eq!(a.overlaps(b), b.overlaps(a));
        }
    }
    Ok(())
}
