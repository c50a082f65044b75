//! Two-pass parser for `[stripe.<N>.][node.<M>.]<setting>[.<key>][=<value>]`.
//!
//! The first pass tokenizes on `.`, `:` and `=` to find the target ids and
//! the setting name, stopping at the first token naming a setting. Knowing
//! the family (cluster, stripe or node), the second pass walks the input
//! once more and extracts every part exactly.

use crate::setting::{Setting, SettingRegistry};
use dynconf_core::{DynConfigError, DynConfigResult};

const GRAMMAR: &str = "Expected [stripe.<id>.][node.<id>.]<setting>[.<key>][=<value>]";

/// The parts of a configuration input.
#[derive(Debug)]
pub(super) struct Parsed<'a> {
    pub(super) setting: &'static Setting,
    pub(super) stripe_id: Option<usize>,
    pub(super) node_id: Option<usize>,
    pub(super) key: Option<&'a str>,
    pub(super) value: Option<&'a str>,
}

/// Parses a trimmed input.
pub(super) fn parse(input: &str) -> DynConfigResult<Parsed<'_>> {
    let registry = SettingRegistry::global()?;
    let (stripe_id, node_id, setting) = scan(input, registry)?;
    let parsed = extract(input, stripe_id, node_id, setting)
        .ok_or_else(|| DynConfigError::syntax(input, GRAMMAR))?;
    Ok(parsed)
}

/// First pass: ids and setting.
fn scan(
    input: &str,
    registry: &'static SettingRegistry,
) -> DynConfigResult<(Option<usize>, Option<usize>, &'static Setting)> {
    let mut tokens = input.split(['.', ':', '=']);
    let mut stripe_id = None;
    let mut node_id = None;
    while let Some(token) = tokens.next() {
        match token {
            "stripe" if stripe_id.is_none() => {
                stripe_id = Some(id(input, tokens.next())?);
            }
            "node" if stripe_id.is_some() && node_id.is_none() => {
                node_id = Some(id(input, tokens.next())?);
            }
            "stripe" | "node" => return Err(DynConfigError::syntax(input, GRAMMAR)),
            name => {
                return registry
                    .get(name)
                    .map(|setting| (stripe_id, node_id, setting))
                    .ok_or_else(|| DynConfigError::UnknownSetting {
                        input: input.to_string(),
                        name: name.to_string(),
                    });
            }
        }
    }
    Err(DynConfigError::syntax(input, "valid setting name not found"))
}

fn id(input: &str, token: Option<&str>) -> DynConfigResult<usize> {
    token
        .filter(|t| is_digits(t))
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| DynConfigError::syntax(input, GRAMMAR))
}

/// Second pass: the exact shape of the input for its family.
fn extract<'a>(
    input: &'a str,
    stripe_id: Option<usize>,
    node_id: Option<usize>,
    setting: &'static Setting,
) -> Option<Parsed<'a>> {
    let mut rest = input;
    if stripe_id.is_some() {
        rest = take_digits(rest.strip_prefix("stripe.")?)?;
        if node_id.is_some() {
            rest = take_digits(rest.strip_prefix(".node.")?)?;
        }
        rest = rest.strip_prefix(['.', ':'])?;
    }

    let name_len = rest
        .find(|c: char| !(c.is_ascii_lowercase() || c == '-'))
        .unwrap_or(rest.len());
    if &rest[..name_len] != setting.name() {
        return None;
    }
    rest = &rest[name_len..];

    let mut key = None;
    if let Some(after_dot) = rest.strip_prefix('.') {
        let key_len = after_dot.find(['=', ':']).unwrap_or(after_dot.len());
        if key_len == 0 {
            return None;
        }
        key = Some(&after_dot[..key_len]);
        rest = &after_dot[key_len..];
    }

    let value = match rest {
        "" => None,
        _ => {
            let value = rest.strip_prefix('=')?;
            if value.contains('=') {
                return None;
            }
            Some(value)
        }
    };

    Some(Parsed {
        setting,
        stripe_id,
        node_id,
        key,
        value,
    })
}

fn take_digits(s: &str) -> Option<&str> {
    let len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (len > 0).then(|| &s[len..])
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
