use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::LookupIpStrategy;
use tokio::net;
use tokio::time::timeout;
use tracing::{Level, event};

use crate::core::common::{AddressList, ResolveMethod, ResolveOptions};
use crate::core::konst::APP_NAME;

/// Name-to-address resolution seam.
///
/// Implementations never fail: any lookup error is represented as an empty
/// address list, indistinguishable from a host that has no addresses.
pub trait Lookup {
    fn lookup(&self, hostname: &str) -> impl Future<Output = AddressList> + Send;
}

/// Resolves through the platform resolver (getaddrinfo): both address
/// families, hosts file included, in whatever order the platform returns.
pub struct SystemLookup {
    timeout: Duration,
}

impl SystemLookup {
    pub fn new(timeout_ms: u16) -> SystemLookup {
        SystemLookup {
            timeout: Duration::from_millis(timeout_ms as u64),
        }
    }
}

impl Lookup for SystemLookup {
    async fn lookup(&self, hostname: &str) -> AddressList {
        // Port 0 is only there to satisfy the ToSocketAddrs signature.
        match timeout(self.timeout, net::lookup_host((hostname, 0))).await {
            Ok(Ok(addrs)) => addrs.map(|sa| sa.ip()).collect(),
            Ok(Err(e)) => {
                event!(target: APP_NAME, Level::DEBUG, "lookup for `{hostname}` failed: {e}");
                Vec::new()
            }
            Err(_) => {
                event!(target: APP_NAME, Level::DEBUG, "lookup for `{hostname}` timed out");
                Vec::new()
            }
        }
    }
}

/// Resolves by querying nameservers directly with the system resolver
/// configuration, returning both IPv4 and IPv6 records.
pub struct DnsLookup {
    resolver: TokioResolver,
    timeout: Duration,
}

impl DnsLookup {
    pub fn new(timeout_ms: u16) -> Result<DnsLookup> {
        let mut builder = TokioResolver::builder_tokio()?;
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        Ok(DnsLookup {
            resolver: builder.build(),
            timeout: Duration::from_millis(timeout_ms as u64),
        })
    }
}

impl Lookup for DnsLookup {
    async fn lookup(&self, hostname: &str) -> AddressList {
        // Hickory has no per-lookup timeout knob, so bound the request
        // with a tokio timeout.
        match timeout(self.timeout, self.resolver.lookup_ip(hostname)).await {
            Ok(Ok(response)) => response.iter().collect(),
            Ok(Err(e)) => {
                event!(target: APP_NAME, Level::DEBUG, "dns lookup for `{hostname}` failed: {e}");
                Vec::new()
            }
            Err(_) => {
                event!(target: APP_NAME, Level::DEBUG, "dns lookup for `{hostname}` timed out");
                Vec::new()
            }
        }
    }
}

/// Lookup backend selected from the resolve options.
pub enum HostLookup {
    System(SystemLookup),
    Dns(DnsLookup),
}

impl HostLookup {
    pub fn new(options: &ResolveOptions) -> Result<HostLookup> {
        let lookup = match options.method {
            ResolveMethod::System => HostLookup::System(SystemLookup::new(options.timeout)),
            ResolveMethod::Dns => HostLookup::Dns(DnsLookup::new(options.timeout)?),
        };
        Ok(lookup)
    }
}

impl Lookup for HostLookup {
    async fn lookup(&self, hostname: &str) -> AddressList {
        match self {
            HostLookup::System(lookup) => lookup.lookup(hostname).await,
            HostLookup::Dns(lookup) => lookup.lookup(hostname).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::Lookup;
    use crate::core::common::AddressList;

    /// Fixed-table lookup for deterministic tests. Records every hostname
    /// it is asked to resolve.
    pub struct StaticLookup {
        table: HashMap<String, AddressList>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticLookup {
        pub fn new(entries: &[(&str, &[&str])]) -> StaticLookup {
            let mut table = HashMap::new();
            for (hostname, addrs) in entries {
                let addrs: AddressList = addrs.iter().map(|a| a.parse().unwrap()).collect();
                table.insert((*hostname).to_owned(), addrs);
            }
            StaticLookup {
                table,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Lookup for StaticLookup {
        async fn lookup(&self, hostname: &str) -> AddressList {
            self.calls.lock().unwrap().push(hostname.to_owned());
            self.table.get(hostname).cloned().unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::resolve::lookup::{Lookup, SystemLookup};

    #[tokio::test]
    async fn system_lookup_of_ip_literal_returns_the_literal() {
        let lookup = SystemLookup::new(5000);
        let addrs = lookup.lookup("127.0.0.1").await;
        assert_eq!(addrs, vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))]);
    }

    #[tokio::test]
    async fn system_lookup_of_empty_hostname_returns_no_addresses() {
        let lookup = SystemLookup::new(5000);
        let addrs = lookup.lookup("").await;
        assert!(addrs.is_empty());
    }
}
