use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;

use anyhow::{Result, bail};

pub fn parse_ipaddr(s: &str) -> Result<IpAddr> {
    if !s.contains(".") && !s.contains(":") {
        bail!("address: `{s}` is invalid")
    }

    match s.parse::<IpAddr>() {
        Ok(a) => Ok(a),
        Err(_) => bail!("address: `{s}` is invalid"),
    }
}

/// Extract hostnames from input records: one record per line, first
/// whitespace-delimited column, remaining columns ignored.
pub fn parse_hostnames<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut hostnames = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(hostname) = line.split_whitespace().next() {
            hostnames.push(hostname.to_owned());
        }
    }
    Ok(hostnames)
}

/// Read hostnames from a file, or stdin when no file is given.
pub fn read_hostnames(filename: Option<&str>) -> Result<Vec<String>> {
    match filename {
        Some(filename) => parse_hostnames(BufReader::new(File::open(filename)?)),
        None => parse_hostnames(std::io::stdin().lock()),
    }
}
