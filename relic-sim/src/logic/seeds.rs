use anyhow::{Context, Result, bail};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a de-duplicated seed list.
///
/// Supports decimal integers (negative values use their magnitude), `0x` hex
/// literals, and inclusive `start..end` ranges.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(Vec::new());
    }

    if let Some((start, end)) = token.split_once("..") {
        let start = parse_seed(start)?;
        let end = parse_seed(end)?;
        if end < start {
            bail!("Seed range {token} is descending");
        }
        return Ok((start..=end).collect());
    }

    parse_seed(token).map(|seed| vec![seed])
}

fn parse_seed(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if let Some(hex) = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .with_context(|| format!("Unrecognized hex seed: {raw}"));
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    raw.parse::<u64>()
        .with_context(|| format!("Unrecognized seed token: {raw}"))
}
