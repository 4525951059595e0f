use cgforge::engine::config::{ChainMergeSpec, ResidueEdit};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Invalid residue edit '{0}'. Expected '[CHAIN-]RESNAME[RESID]:TARGET' (e.g., 'A-PHE45:ALA')."
    )]
    InvalidResidueEdit(String),

    #[error("Invalid residue number in '{0}'.")]
    InvalidResidueNumber(String),

    #[error("Invalid merge group '{0}'. Expected 'all' or comma-separated chain IDs (e.g., 'A,B').")]
    InvalidMergeGroup(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),
}

/// Parses `[CHAIN-]RESNAME[RESID]:TARGET`, or `[CHAIN-]RESID:TARGET` without a name.
///
/// `A-PHE45:ALA`, `PHE:ALA`, `45:ALA` and `B-12:LYS0` are all accepted.
pub fn parse_residue_edit(s: &str) -> Result<ResidueEdit, ParseError> {
    let invalid = || ParseError::InvalidResidueEdit(s.to_string());

    let (selector, target) = s.rsplit_once(':').ok_or_else(invalid)?;
    let target = target.trim();
    if target.is_empty() {
        return Err(invalid());
    }

    let (chain, residue) = match selector.split_once('-') {
        Some((chain, residue)) => {
            let mut chars = chain.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => (Some(c), residue),
                _ => return Err(invalid()),
            }
        }
        None => (None, selector),
    };

    let digits_at = residue
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .unwrap_or(residue.len());
    let (resname, resid) = residue.split_at(digits_at);
    if resname.is_empty() && resid.is_empty() {
        return Err(invalid());
    }
    if !resname.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        return Err(invalid());
    }
    let resid = if resid.is_empty() {
        None
    } else {
        Some(
            resid
                .parse::<isize>()
                .map_err(|_| ParseError::InvalidResidueNumber(s.to_string()))?,
        )
    };

    Ok(ResidueEdit {
        chain,
        resname: (!resname.is_empty()).then(|| resname.to_string()),
        resid,
        target: target.to_string(),
    })
}

/// Folds `--merge` values into one spec. Any `all` wins over explicit groups.
pub fn parse_merge_groups(values: &[String]) -> Result<Option<ChainMergeSpec>, ParseError> {
    if values.is_empty() {
        return Ok(None);
    }
    let mut groups = Vec::with_capacity(values.len());
    for value in values {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Some(ChainMergeSpec::All));
        }
        let mut group = Vec::new();
        for chain in value.split(',').map(str::trim) {
            let mut chars = chain.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => group.push(c),
                _ => return Err(ParseError::InvalidMergeGroup(value.clone())),
            }
        }
        groups.push(group);
    }
    Ok(Some(ChainMergeSpec::Groups(groups)))
}

pub fn split_key_value(s: &str) -> Result<(&str, &str), ParseError> {
    s.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| ParseError::InvalidKeyValue(s.to_string()))
}
