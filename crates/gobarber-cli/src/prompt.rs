use std::io::{self, Write};

use anyhow::Result;

/// Read a line from stdin. An empty answer falls back to `default`.
pub fn line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(d) if input.is_empty() => d.to_string(),
        _ => input.to_string(),
    })
}

/// Use the given value, or ask for it
pub fn value_or_line(value: Option<String>, label: &str, default: Option<&str>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => line(label, default),
    }
}

/// Read a password without echo
pub fn password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(format!("{}: ", label))?)
}
