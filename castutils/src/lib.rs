pub mod ip_utils;

pub use ip_utils::{LocalAddrError, local_ipv4};
