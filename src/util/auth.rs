use std::fs::read_to_string;
use std::io::{BufRead, Write};

use anyhow::Result;

/// Return the file contents when `value` names a readable file, otherwise
/// the value itself.
pub fn literal_or_file(value: &str) -> String {
    match read_to_string(value) {
        Ok(contents) => contents.trim().to_owned(),
        Err(_) => value.to_owned(),
    }
}

/// Prompt for a password on stderr and read one line from stdin.
pub fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_owned())
}
