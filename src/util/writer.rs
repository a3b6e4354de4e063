use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::IpAddr;

use anyhow::Result;

use crate::core::common::ResolutionMap;
use crate::core::konst::{COLUMN_SEP, RECORD_END};

/// Format one output record: the hostname and its addresses, space
/// separated. Unresolved hosts get an empty address field, not a missing
/// record.
pub fn format_record(hostname: &str, addrs: &[IpAddr]) -> String {
    let ips = addrs
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<String>>()
        .join(COLUMN_SEP);
    format!("{hostname}{COLUMN_SEP}{ips}{RECORD_END}")
}

/// Write all records, hostnames in lexicographic order, one per line.
pub fn write_records<W: Write>(mut writer: W, map: &ResolutionMap) -> Result<()> {
    let mut hostnames: Vec<&String> = map.keys().collect();
    hostnames.sort();

    for hostname in hostnames {
        let record = format_record(hostname, &map[hostname]);
        writer.write_all(record.as_bytes())?;
    }
    Ok(())
}

/// Write records to a file, or stdout when no file is given.
pub fn write_output(map: &ResolutionMap, filename: Option<&str>) -> Result<()> {
    match filename {
        Some(filename) => {
            let mut writer = BufWriter::new(File::create(filename)?);
            write_records(&mut writer, map)?;
            writer.flush()?;
        }
        None => {
            write_records(std::io::stdout().lock(), map)?;
        }
    }
    Ok(())
}
