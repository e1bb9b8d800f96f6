//! Host address discovery for operator display.

use std::net::Ipv4Addr;

/// Report text used when no private Class-C address is assigned.
pub const NO_ADDRESS: &str = "No IP information.";

/// Check whether an address is in the private 192.168.0.0/16 range.
///
/// Address discovery reports only this range, the one home and small-office
/// LANs assign. Other private ranges and public addresses are skipped.
pub fn is_private_class_c(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    octets[0] == 192 && octets[1] == 168
}

/// All private Class-C IPv4 addresses currently assigned to local
/// interfaces, in enumeration order.
pub fn private_ipv4_addresses() -> Vec<Ipv4Addr> {
    netdev::get_interfaces()
        .into_iter()
        .flat_map(|iface| iface.ipv4.into_iter().map(|net| net.addr()))
        .filter(|addr| is_private_class_c(*addr))
        .collect()
}

/// Format a list of addresses for operator display, one per line.
///
/// An empty list yields the [`NO_ADDRESS`] sentinel so the operator sees an
/// explicit "nothing to connect to" instead of a blank.
pub fn format_report(addrs: &[Ipv4Addr]) -> String {
    if addrs.is_empty() {
        return NO_ADDRESS.to_string();
    }
    addrs
        .iter()
        .map(|addr| addr.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable report of this host's private Class-C addresses.
pub fn host_ip_report() -> String {
    format_report(&private_ipv4_addresses())
}
