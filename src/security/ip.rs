use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const BLOCKED_V4_RANGES: &[(Ipv4Addr, u8, &str)] = &[
    (Ipv4Addr::new(10, 0, 0, 0), 8, "10.0.0.0/8"),
    (Ipv4Addr::new(172, 16, 0, 0), 12, "172.16.0.0/12"),
    (Ipv4Addr::new(192, 168, 0, 0), 16, "192.168.0.0/16"),
    (Ipv4Addr::new(127, 0, 0, 0), 8, "127.0.0.0/8"),
    (Ipv4Addr::new(169, 254, 0, 0), 16, "169.254.0.0/16"),
    (Ipv4Addr::new(0, 0, 0, 0), 8, "0.0.0.0/8"),
];

const BLOCKED_V6_RANGES: &[(Ipv6Addr, u8, &str)] = &[
    (Ipv6Addr::LOCALHOST, 128, "::1/128"),
    (Ipv6Addr::UNSPECIFIED, 128, "::/128"),
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7, "fc00::/7"),
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10, "fe80::/10"),
];

/// Returns the blocked range `ip` falls in, if any.
pub fn blocked_range(ip: IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => blocked_v4(v4),
        IpAddr::V6(v6) => {
            // ::ffff:a.b.c.d must be judged by its IPv4 form
            if let Some(v4) = v6.to_ipv4_mapped() {
                return blocked_v4(v4);
            }
            BLOCKED_V6_RANGES
                .iter()
                .find(|(net, prefix, _)| v6_in_range(v6, *net, *prefix))
                .map(|(_, _, label)| *label)
        }
    }
}

/// Classifies a textual address, catching embedded IPv4 literals the parser would not.
pub fn blocked_literal(text: &str) -> Option<&'static str> {
    let text = text.trim_start_matches('[').trim_end_matches(']');
    if text == "127.0.0.1" || text == "::1" {
        return Some("loopback");
    }
    if let Ok(ip) = text.parse::<IpAddr>() {
        return blocked_range(ip);
    }
    // e.g. "::ffff:10.0.0.1" written in a form the std parser rejects
    text.rsplit(':')
        .next()
        .and_then(|tail| tail.parse::<Ipv4Addr>().ok())
        .and_then(blocked_v4)
}

fn blocked_v4(ip: Ipv4Addr) -> Option<&'static str> {
    BLOCKED_V4_RANGES
        .iter()
        .find(|(net, prefix, _)| v4_in_range(ip, *net, *prefix))
        .map(|(_, _, label)| *label)
}

fn v4_in_range(ip: Ipv4Addr, net: Ipv4Addr, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    (u32::from(ip) & mask) == (u32::from(net) & mask)
}

fn v6_in_range(ip: Ipv6Addr, net: Ipv6Addr, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0 } else { u128::MAX << (128 - prefix) };
    (u128::from(ip) & mask) == (u128::from(net) & mask)
}
