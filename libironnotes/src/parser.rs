//! Shorthand set notation parsing
//!
//! Turns the terse text typed between sets into structured set data.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

const SINGLE_ARM_PREFIX: &str = "SA";
const MULTIPLIERS: [char; 3] = ['x', 'X', '×'];

// Longest match first so "kgs" is not left as "s".
const WEIGHT_SUFFIXES: [&str; 4] = ["KGS", "KG", "LBS", "LB"];
const REP_SUFFIXES: [&str; 3] = ["REPS", "REP", "R"];
const SET_SUFFIXES: [&str; 3] = ["SETS", "SET", "S"];

/// Structured result of a successful parse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedSet {
    pub weight: f64,
    pub reps: u32,
    pub set_count: u32,
    pub is_single_arm: bool,
}

/// Parse a shorthand set description
///
/// Supports multiple formats:
/// - Multiplier: "100x10", "100x10x3", "100kg × 10"
/// - Tagged tokens in any order: "100kg 10r 3s", "10reps 3sets 225lbs"
/// - Bare numbers: "100 10 3" (weight, reps, sets)
/// - Single-arm prefix on either of the above: "SA 50kg 8r", "SA 20x12"
///
/// # Errors
///
/// Returns a [`ParseError`] when the input is empty, a weight or rep count is
/// missing, or a multiplier form has the wrong number of parts.
pub fn parse(input: &str) -> Result<ParsedSet, ParseError> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(rest) = strip_single_arm(cleaned) {
        let parsed = parse_body(rest.trim_start())?;
        return Ok(ParsedSet {
            is_single_arm: true,
            ..parsed
        });
    }

    parse_body(cleaned)
}

fn strip_single_arm(input: &str) -> Option<&str> {
    let head = input.get(..SINGLE_ARM_PREFIX.len())?;
    if head.eq_ignore_ascii_case(SINGLE_ARM_PREFIX) {
        Some(&input[SINGLE_ARM_PREFIX.len()..])
    } else {
        None
    }
}

fn parse_body(input: &str) -> Result<ParsedSet, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    if input.contains(MULTIPLIERS) {
        parse_multiplier(input)
    } else {
        parse_tokens(input)
    }
}

/// "WEIGHT x REPS [x SETS]"
fn parse_multiplier(input: &str) -> Result<ParsedSet, ParseError> {
    let parts: Vec<&str> = input.split(MULTIPLIERS).map(str::trim).collect();

    if parts.len() < 2 || parts.len() > 3 {
        return Err(ParseError::BadPartCount(parts.len()));
    }

    let weight =
        extract_weight(parts[0]).ok_or_else(|| ParseError::InvalidWeight(parts[0].to_string()))?;
    let reps = extract_count(parts[1], &[]).ok_or_else(|| ParseError::InvalidReps(parts[1].to_string()))?;
    let set_count = parts
        .get(2)
        .and_then(|part| extract_count(part, &[]))
        .unwrap_or(1);

    Ok(ParsedSet {
        weight,
        reps,
        set_count,
        is_single_arm: false,
    })
}

/// Whitespace separated tokens, classified by shape rather than position
fn parse_tokens(input: &str) -> Result<ParsedSet, ParseError> {
    let mut weight = None;
    let mut reps = None;
    let mut set_count = 1;

    for token in input.split_whitespace() {
        if weight.is_none() {
            if let Some(w) = extract_weight(token) {
                weight = Some(w);
                continue;
            }
        }
        if reps.is_none() {
            if let Some(r) = extract_count(token, &REP_SUFFIXES) {
                reps = Some(r);
                continue;
            }
        }
        if let Some(s) = extract_count(token, &SET_SUFFIXES) {
            set_count = s;
        }
    }

    let weight = weight.ok_or(ParseError::MissingWeight)?;
    let reps = reps.ok_or(ParseError::MissingReps)?;

    Ok(ParsedSet {
        weight,
        reps,
        set_count,
        is_single_arm: false,
    })
}

/// Non-negative decimal with an optional kg/lb suffix
fn extract_weight(token: &str) -> Option<f64> {
    let number = strip_suffix_ignore_case(token.trim(), &WEIGHT_SUFFIXES).trim();
    let value: f64 = number.parse().ok()?;

    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Positive integer with one optional suffix from `suffixes`
fn extract_count(token: &str, suffixes: &[&str]) -> Option<u32> {
    let number = strip_suffix_ignore_case(token.trim(), suffixes).trim();
    match number.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

fn strip_suffix_ignore_case<'a>(token: &'a str, suffixes: &[&str]) -> &'a str {
    for suffix in suffixes {
        if token.len() < suffix.len() {
            continue;
        }
        let split = token.len() - suffix.len();
        if !token.is_char_boundary(split) {
            continue;
        }
        if token[split..].eq_ignore_ascii_case(suffix) {
            return &token[..split];
        }
    }
    token
}
