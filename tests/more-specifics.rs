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

#[test]
fn test_more_specifics() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut table = RoutingTable::<usize>::new();
    let pfxs = vec![
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 24)?, // 0
        //
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 25)?, // 1
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 128).into(), 25)?, // 2
        //
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 26)?, // 3
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 64).into(), 26)?, // 4
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 128).into(), 26)?, // 5
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 192).into(), 26)?, // 6
        //
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 27)?, // 7
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 32).into(), 27)?, // 8
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 64).into(), 27)?, // 9
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 128).into(), 27)?, // 10
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 160).into(), 27)?, // 11
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 192).into(), 27)?, // 12
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 224).into(), 27)?, // 13
        //
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 32)?, // 14
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 31).into(), 32)?, // 15
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 32).into(), 32)?, // 16
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 63).into(), 32)?, // 17
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 64).into(), 32)?, // 18
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 127).into(), 32)?, // 19
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 128).into(), 32)?, // 20
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 159).into(), 32)?, // 21
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 160).into(), 32)?, // 22
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 191).into(), 32)?, // 23
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 192).into(), 32)?, // 24
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 223).into(), 32)?, // 25
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 224).into(), 32)?, // 26
        Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 255).into(), 32)?, // 27
    ];

    for (i, pfx) in pfxs.iter().enumerate() {
        table.insert(pfx, i);
    }
    println!("------ end of inserts\n");

    // expected results are indexes into the pfxs vec, in CIDR order
    for (search_pfx, expected) in &[
        (
            Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 23)?,
            vec![
                0, 1, 3, 7, 14, 15, 8, 16, 17, 4, 9, 18, 19, 2, 5, 10, 20,
                21, 11, 22, 23, 6, 12, 24, 25, 13, 26, 27,
            ],
        ),
        (
            Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 24)?,
            vec![
                0, 1, 3, 7, 14, 15, 8, 16, 17, 4, 9, 18, 19, 2, 5, 10, 20,
                21, 11, 22, 23, 6, 12, 24, 25, 13, 26, 27,
            ],
        ),
        (
            Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 25)?,
            vec![1, 3, 7, 14, 15, 8, 16, 17, 4, 9, 18, 19],
        ),
        (
            Prefix::new(std::net::Ipv4Addr::new(130, 55, 240, 0).into(), 26)?,
            vec![3, 7, 14, 15, 8, 16, 17],
        ),
        (
            Prefix::new(
                std::net::Ipv4Addr::new(130, 55, 240, 192).into(),
                26,
            )?,
            vec![6, 12, 24, 25, 13, 26, 27],
        ),
        (
            Prefix::new(
                std::net::Ipv4Addr::new(130, 55, 241, 0).into(),
                24,
            )?,
            vec![],
        ),
    ] {
        println!("search for: {}", search_pfx);
        let found: Vec<usize> =
            table.subnets(search_pfx).map(|(_, v)| *v).collect();
        assert_eq!(&found, expected);

        // and the emitted prefixes belong to those values
        for (pfx, value) in table.subnets(search_pfx) {
            assert_eq!(pfx, pfxs[*value]);
        }
    }
    Ok(())
}

#[test]
fn test_subnets_of_default_route() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut table = RoutingTable::<char>::new();
    table.insert(&Prefix::from_str("10.0.0.0/8")?, 'A');
    table.insert(&Prefix::from_str("10.1.0.0/16")?, 'B');
    table.insert(&Prefix::from_str("10.1.2.0/24")?, 'C');
    table.insert(&Prefix::from_str("0.0.0.0/0")?, 'G');
    table.insert(&Prefix::from_str("192.168.0.0/16")?, 'H');

    // everything in the v4 trie, in CIDR order, the default route first
    let all: Vec<(Prefix, char)> = table
        .subnets(&Prefix::from_str("0.0.0.0/0")?)
        .map(|(p, v)| (p, *v))
        .collect();
    assert_eq!(
        all,
        vec![
            (Prefix::from_str("0.0.0.0/0")?, 'G'),
            (Prefix::from_str("10.0.0.0/8")?, 'A'),
            (Prefix::from_str("10.1.0.0/16")?, 'B'),
            (Prefix::from_str("10.1.2.0/24")?, 'C'),
            (Prefix::from_str("192.168.0.0/16")?, 'H'),
        ]
    );

    // subnets of a v4 probe never include v6 entries
    table.insert(&Prefix::from_str("::/0")?, 'Z');
    assert_eq!(
        table.subnets(&Prefix::from_str("0.0.0.0/0")?).count(),
        5
    );
    Ok(())
}

#[test]
fn test_subnets_blocked_by_compressed_entry() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut table = RoutingTable::<u32>::new();
    table.insert(&Prefix::from_str("10.1.2.0/24")?, 1);

    // the probe covers the stored leaf
    let found: Vec<Prefix> = table
        .subnets(&Prefix::from_str("10.1.0.0/16")?)
        .map(|(p, _)| p)
        .collect();
    assert_eq!(found, vec![Prefix::from_str("10.1.2.0/24")?]);

    // the probe is more specific than the stored leaf
    assert_eq!(table.subnets(&Prefix::from_str("10.1.2.0/25")?).count(), 0);

    // the probe is the stored leaf
    let found: Vec<Prefix> = table
        .subnets(&Prefix::from_str("10.1.2.0/24")?)
        .map(|(p, _)| p)
        .collect();
    assert_eq!(found, vec![Prefix::from_str("10.1.2.0/24")?]);
    Ok(())
}

#[test]
fn test_more_specifics_ipv6() -> Result<(), Box<dyn Error>> {
    common::init();

    let mut table = RoutingTable::<u32>::new();
    let pfxs = [
        Prefix::from_str("2001:db8::/32")?,
        Prefix::from_str("2001:db8::/48")?,
        Prefix::from_str("2001:db8:0:1::/64")?,
        Prefix::from_str("2001:db8:8000::/33")?,
    ];
    for (i, pfx) in pfxs.iter().enumerate() {
        table.insert(pfx, i as u32);
    }

    let found: Vec<u32> = table
        .subnets(&Prefix::from_str("2001:db8::/32")?)
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(found, vec![0, 1, 2, 3]);

    let found: Vec<u32> = table
        .subnets(&Prefix::from_str("2001:db8::/48")?)
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(found, vec![1, 2]);
    Ok(())
}
