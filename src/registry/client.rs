use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Level, event};

use crate::core::common::RegistryOptions;
use crate::core::konst::APP_NAME;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Slice {
    pub name: String,
    pub slice_id: u64,
    pub node_ids: Vec<u64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Node {
    pub node_id: u64,
    pub hostname: String,
    pub interface_ids: Vec<u64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Interface {
    pub interface_id: u64,
    pub ip: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RegistryAuth {
    pub user: String,
    pub password: String,
}

/// Client for the node registry API. Every call is a POST of
/// `{method, auth, params}` answered with a JSON body.
pub struct RegistryClient {
    client: Client,
    url: String,
    auth: RegistryAuth,
}

impl RegistryClient {
    pub fn new(options: &RegistryOptions, auth: RegistryAuth) -> Result<RegistryClient> {
        let client = Client::builder()
            .timeout(Duration::from_millis(options.timeout as u64))
            .build()?;

        Ok(RegistryClient {
            client,
            url: options.url.clone(),
            auth,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        event!(target: APP_NAME, Level::DEBUG, "registry call `{method}`");
        let body = json!({
            "method": method,
            "auth": { "user": self.auth.user, "password": self.auth.password },
            "params": params,
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("registry call `{method}` failed with status: {status}")
        }
        Ok(response.json().await?)
    }

    /// Fetch the named slice, or an implementation-chosen slice (the first
    /// returned) when no name is given.
    pub async fn get_slice(&self, name: Option<&str>) -> Result<Slice> {
        let params = json!({
            "name": name,
            "return_fields": ["name", "slice_id", "node_ids"],
        });
        let slices: Vec<Slice> = self.call("GetSlices", params).await?;

        match slices.into_iter().next() {
            Some(slice) => Ok(slice),
            None => bail!("no slices found"),
        }
    }

    /// Fetch the given nodes, indexed by hostname. Hostnames must be
    /// unique across the set.
    pub async fn get_nodes(&self, node_ids: &[u64]) -> Result<HashMap<String, Node>> {
        let params = json!({
            "node_ids": node_ids,
            "return_fields": ["node_id", "hostname", "interface_ids"],
        });
        let nodes: Vec<Node> = self.call("GetNodes", params).await?;
        index_nodes(nodes)
    }

    /// Fetch the given interfaces, indexed by interface id.
    pub async fn get_interfaces(&self, interface_ids: &[u64]) -> Result<HashMap<u64, Interface>> {
        let params = json!({ "interface_ids": interface_ids });
        let interfaces: Vec<Interface> = self.call("GetInterfaces", params).await?;
        index_interfaces(interfaces)
    }
}

/// Index nodes by hostname. A duplicate hostname means the registry data
/// is inconsistent and the whole run must abort.
pub fn index_nodes(nodes: Vec<Node>) -> Result<HashMap<String, Node>> {
    let mut by_hostname = HashMap::new();
    for node in nodes {
        let hostname = node.hostname.clone();
        if by_hostname.insert(hostname.clone(), node).is_some() {
            bail!("duplicate hostname in registry data: `{hostname}`")
        }
    }
    Ok(by_hostname)
}

/// Index interfaces by id. A duplicate id is fatal.
pub fn index_interfaces(interfaces: Vec<Interface>) -> Result<HashMap<u64, Interface>> {
    let mut by_id = HashMap::new();
    for interface in interfaces {
        let id = interface.interface_id;
        if by_id.insert(id, interface).is_some() {
            bail!("duplicate interface id in registry data: `{id}`")
        }
    }
    Ok(by_id)
}

#[cfg(test)]
mod tests {
    use crate::registry::client::*;

    fn node(node_id: u64, hostname: &str, interface_ids: &[u64]) -> Node {
        Node {
            node_id,
            hostname: hostname.to_owned(),
            interface_ids: interface_ids.to_vec(),
        }
    }

    #[test]
    fn slice_payload_deserializes() {
        let payload = r#"[{"name": "alpha", "slice_id": 7, "node_ids": [1, 2]}]"#;
        let slices: Vec<Slice> = serde_json::from_str(payload).unwrap();
        assert_eq!(slices[0].name, "alpha");
        assert_eq!(slices[0].node_ids, vec![1, 2]);
    }

    #[test]
    fn interface_payload_with_null_ip_deserializes() {
        let payload = r#"[{"interface_id": 3, "ip": null}, {"interface_id": 4, "ip": "10.0.0.4"}]"#;
        let interfaces: Vec<Interface> = serde_json::from_str(payload).unwrap();
        assert_eq!(interfaces[0].ip, None);
        assert_eq!(interfaces[1].ip, Some("10.0.0.4".to_owned()));
    }

    #[test]
    fn index_nodes_keys_by_hostname() {
        let indexed = index_nodes(vec![
            node(1, "a.example", &[10]),
            node(2, "b.example", &[20]),
        ])
        .unwrap();
        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed["a.example"].node_id, 1);
    }

    #[test]
    fn index_nodes_rejects_duplicate_hostname() {
        let result = index_nodes(vec![
            node(1, "a.example", &[10]),
            node(2, "a.example", &[20]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn index_interfaces_rejects_duplicate_id() {
        let result = index_interfaces(vec![
            Interface {
                interface_id: 3,
                ip: Some("10.0.0.3".to_owned()),
            },
            Interface {
                interface_id: 3,
                ip: None,
            },
        ]);
        assert!(result.is_err());
    }
}
