//! Parses the `--after DURATION` flag's argument (§6): a plain integer of
//! seconds, or a number followed by a single unit suffix (`s`, `m`, `h`,
//! `d`).

use anyhow::{anyhow, Result};

pub fn parse_duration_secs(input: &str) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("empty duration"));
    }
    let (digits, unit) = match input.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => input.split_at(idx),
        None => (input, "s"),
    };
    let amount: u64 = digits
        .parse()
        .map_err(|_| anyhow!("invalid duration '{input}'"))?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(anyhow!("unknown duration unit '{other}' in '{input}'")),
    };
    Ok(amount * multiplier)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
