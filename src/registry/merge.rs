use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Result, bail};
use tracing::{Level, event};

use crate::core::common::{AddressList, ResolutionMap, ResolveOptions};
use crate::core::konst::APP_NAME;
use crate::registry::client::{Interface, Node, RegistryClient};
use crate::resolve::engine::run_batch;
use crate::resolve::lookup::Lookup;
use crate::util::parser::parse_ipaddr;

/// Join nodes to their registry interface addresses.
///
/// Returns the registry map (every hostname present, possibly with an
/// empty address list) and the hostnames with no usable registry address,
/// which need a live lookup. The two sets partition the hostnames exactly:
/// a hostname with registry addresses is never sent to the resolution
/// engine.
pub fn partition(
    nodes: &HashMap<String, Node>,
    interfaces: &HashMap<u64, Interface>,
) -> Result<(ResolutionMap, Vec<String>)> {
    let mut registry_map = ResolutionMap::new();
    let mut missing = Vec::new();

    for (hostname, node) in nodes {
        let mut addrs = AddressList::new();
        for interface_id in &node.interface_ids {
            let interface = match interfaces.get(interface_id) {
                Some(interface) => interface,
                None => bail!("node `{hostname}` references unknown interface id {interface_id}"),
            };
            let ip = match &interface.ip {
                Some(ip) if !ip.is_empty() => ip,
                _ => continue,
            };
            match parse_ipaddr(ip) {
                Ok(addr) => addrs.push(addr),
                Err(_) => {
                    event!(
                        target: APP_NAME,
                        Level::WARN,
                        "ignoring malformed registry address `{ip}` for `{hostname}`"
                    );
                }
            }
        }

        if addrs.is_empty() {
            missing.push(hostname.clone());
        }
        registry_map.insert(hostname.clone(), addrs);
    }

    Ok((registry_map, missing))
}

/// Merge registry-supplied addresses with live lookup results. Non-empty
/// registry entries win; hostnames the registry had no address for take
/// whatever the engine produced (possibly nothing).
pub fn merge(registry_map: ResolutionMap, resolved: ResolutionMap) -> ResolutionMap {
    let mut merged = ResolutionMap::new();
    for (hostname, addrs) in registry_map {
        if addrs.is_empty() {
            let resolved_addrs = resolved.get(&hostname).cloned().unwrap_or_default();
            merged.insert(hostname, resolved_addrs);
        } else {
            merged.insert(hostname, addrs);
        }
    }
    merged
}

/// Full registry flow: fetch the slice roster and produce one address list
/// per node hostname, resolving live only where the registry has none.
pub async fn collect_slice_addresses<L>(
    client: &RegistryClient,
    slice_name: Option<&str>,
    lookup: Arc<L>,
    options: &ResolveOptions,
    cancel: Arc<AtomicBool>,
) -> Result<ResolutionMap>
where
    L: Lookup + Send + Sync + 'static,
{
    let slice = client.get_slice(slice_name).await?;
    event!(
        target: APP_NAME,
        Level::INFO,
        "using slice `{}` with {} nodes",
        slice.name,
        slice.node_ids.len()
    );

    let nodes = client.get_nodes(&slice.node_ids).await?;
    let interface_ids: Vec<u64> = nodes
        .values()
        .flat_map(|n| n.interface_ids.iter().copied())
        .collect();
    let interfaces = client.get_interfaces(&interface_ids).await?;

    let (registry_map, missing) = partition(&nodes, &interfaces)?;
    if !missing.is_empty() {
        event!(
            target: APP_NAME,
            Level::INFO,
            "{} hostnames have no registry address, resolving live",
            missing.len()
        );
    }
    let resolved = run_batch(missing, lookup, options, cancel).await;

    Ok(merge(registry_map, resolved))
}
