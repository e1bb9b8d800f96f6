//! Host network information for operator display.
//!
//! A link server is only useful once the peer knows where to connect, so
//! this module answers "which address do I type in" and "did my network just
//! change". Address discovery reports the private Class-C (192.168.0.0/16)
//! addresses a LAN peer can actually reach, not every address on the box.
//!
//! # Example
//!
//! ```ignore
//! use lanlink::network_info::{self, NetworkMonitor};
//!
//! // Addresses an operator should hand to the peer
//! println!("{}", network_info::host_ip_report());
//!
//! // Refresh the display when interfaces change
//! let monitor = NetworkMonitor::new();
//! monitor.start(|change| {
//!     println!("online: {}, {} added, {} removed",
//!         change.is_online, change.added.len(), change.removed.len());
//! })?;
//! ```

mod addresses;
mod monitor;

pub use addresses::{
    NO_ADDRESS, format_report, host_ip_report, is_private_class_c, private_ipv4_addresses,
};

pub use monitor::{ConnectivityChange, InterfaceChange, NetworkMonitor};
