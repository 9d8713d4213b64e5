//! Protein variant identifier parser.
//!
//! Decomposes identifiers such as `p.Met1Leu`, `p.Arg97fs*16`, `p.Lys2_Met4del`
//! and `p.[Met1Leu;Lys2Arg]` into [`ParsedVariant`] values.
//!
//! Segments are classified in priority order:
//!
//! 1. shorter than four characters, or ending in `?` -> `Invalid`
//! 2. containing `_` -> range edit, keyword required on one of the halves
//! 3. containing `del`, `ins` or `dup` without a range -> `Invalid`
//! 4. containing `fs` -> `Frameshift`
//! 5. otherwise residue, position, residue -> `Substitution`, `Synonymous` or `Unknown`

use nom::bytes::complete::take;
use nom::character::complete::{char, digit1};
use nom::combinator::opt;
use nom::{IResult, Parser};
use tracing::error;

use super::record::{ParsedVariant, RangeEdit, VariantBody, VariantRecord};
use crate::error::{ErrorCode, FerroError};
use crate::protein::AminoAcid;

/// Length of the precursor tag (`p.`).
const PREFIX_LEN: usize = 2;

/// Widest position accepted, in digits.
pub const MAX_POSITION_DIGITS: usize = 9;

/// Keywords searched in each half of a range, longest first.
const RANGE_KEYWORDS: [(&str, RangeEdit); 4] = [
    ("delins", RangeEdit::Delins),
    ("del", RangeEdit::Deletion),
    ("ins", RangeEdit::Insertion),
    ("dup", RangeEdit::Duplication),
];

/// Parse an identifier, never failing.
///
/// Text that cannot be decoded is kept verbatim in [`VariantRecord::Invalid`].
/// A range without any edit keyword is reported at `error` level and also
/// degraded to `Invalid`; use [`parse_identifier_strict`] to observe it as an error.
///
/// # Example
///
/// ```
/// use ferro_mave::variant::{parse_identifier, VariantRecord};
///
/// let variant = parse_identifier("p.Met1Leu");
/// assert_eq!(variant.substitution(), Some(("Met", "Leu", 1)));
/// assert_eq!(variant.apply_offset(4), "p.Met5Leu");
/// ```
pub fn parse_identifier(identifier: &str) -> ParsedVariant {
    match parse_identifier_strict(identifier) {
        Ok(variant) => variant,
        Err(e) => {
            error!("{}", e.detailed_message());
            let (accession, rest) = split_accession(identifier);
            let (prefix, body) = split_prefix(rest);
            ParsedVariant {
                accession: accession.map(str::to_string),
                prefix: prefix.to_string(),
                body: VariantBody::Single(VariantRecord::invalid(body)),
            }
        }
    }
}

/// Parse an identifier, failing on range notation that carries no edit keyword
/// and on positions wider than [`MAX_POSITION_DIGITS`].
pub fn parse_identifier_strict(identifier: &str) -> Result<ParsedVariant, FerroError> {
    let (accession, rest) = split_accession(identifier);
    let (prefix, body) = split_prefix(rest);

    let body = match body
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
    {
        Some(inner) if !prefix.is_empty() => {
            let records = inner
                .split(';')
                .map(|segment| parse_segment(segment, identifier))
                .collect::<Result<Vec<_>, _>>()?;
            VariantBody::Compound(records)
        }
        _ if prefix.is_empty() => VariantBody::Single(VariantRecord::invalid(body)),
        _ => VariantBody::Single(parse_segment(body, identifier)?),
    };

    Ok(ParsedVariant {
        accession: accession.map(str::to_string),
        prefix: prefix.to_string(),
        body,
    })
}

/// Split `NP_000509.1:p.Glu6Val` into accession and the remainder.
fn split_accession(identifier: &str) -> (Option<&str>, &str) {
    match identifier.split_once(':') {
        Some((accession, rest)) => (Some(accession), rest),
        None => (None, identifier),
    }
}

/// Split off the fixed-width precursor tag. Inputs too short to carry one get an empty tag.
fn split_prefix(rest: &str) -> (&str, &str) {
    match (rest.get(..PREFIX_LEN), rest.get(PREFIX_LEN..)) {
        (Some(prefix), Some(body)) => (prefix, body),
        _ => ("", rest),
    }
}

/// Classify and decode one segment.
fn parse_segment(segment: &str, identifier: &str) -> Result<VariantRecord, FerroError> {
    if segment.len() < 4 || segment.ends_with('?') {
        return Ok(VariantRecord::invalid(segment));
    }

    if segment.contains('_') {
        return parse_range(segment, identifier);
    }

    if segment.contains("del") || segment.contains("ins") || segment.contains("dup") {
        // Single-position indels are not decoded.
        return Ok(VariantRecord::invalid(segment));
    }

    let record = if segment.contains("fs") {
        parse_frameshift(segment, identifier)?
    } else {
        parse_single(segment, identifier)?
    };
    Ok(record.unwrap_or_else(|| VariantRecord::invalid(segment)))
}

/// Three-character residue followed by an optionally negative run of digits.
fn residue_and_position(input: &str) -> IResult<&str, (&str, Option<char>, &str)> {
    (take(3usize), opt(char('-')), digit1).parse(input)
}

/// Decode the residue and position at the start of `input`, returning the rest.
///
/// Zero-padded positions and `-0` are not decoded so that writing a record back
/// is exact.
fn decode_anchor<'a>(
    input: &'a str,
    identifier: &str,
) -> Result<Option<(&'a str, i64, &'a str)>, FerroError> {
    let Ok((rest, (residue, sign, digits))) = residue_and_position(input) else {
        return Ok(None);
    };
    if digits.starts_with('0') && (digits.len() > 1 || sign.is_some()) {
        return Ok(None);
    }
    if digits.len() > MAX_POSITION_DIGITS {
        let pos = identifier.find(digits).unwrap_or(0);
        return Err(FerroError::parse(
            identifier,
            pos,
            format!(
                "position {} is wider than {} digits",
                digits, MAX_POSITION_DIGITS
            ),
            ErrorCode::InvalidPosition,
        ));
    }
    let Ok(magnitude) = digits.parse::<i64>() else {
        return Ok(None);
    };
    let position = if sign.is_some() { -magnitude } else { magnitude };
    Ok(Some((residue, position, rest)))
}

fn parse_single(segment: &str, identifier: &str) -> Result<Option<VariantRecord>, FerroError> {
    let Some((ref_aa, position, alt)) = decode_anchor(segment, identifier)? else {
        return Ok(None);
    };
    Ok(single_record(ref_aa, position, alt))
}

fn single_record(ref_aa: &str, position: i64, alt: &str) -> Option<VariantRecord> {
    let ref_aa = ref_aa.to_string();

    if alt == "=" {
        return Some(VariantRecord::Synonymous { ref_aa, position });
    }
    if alt.chars().count() != 3 {
        return None;
    }
    if alt == AminoAcid::Xaa.to_three_letter() {
        return Some(VariantRecord::Unknown { ref_aa, position });
    }
    Some(VariantRecord::Substitution {
        ref_aa,
        alt_aa: alt.to_string(),
        position,
    })
}

fn parse_frameshift(segment: &str, identifier: &str) -> Result<Option<VariantRecord>, FerroError> {
    let Some((ref_aa, position, rest)) = decode_anchor(segment, identifier)? else {
        return Ok(None);
    };
    Ok(frameshift_record(ref_aa, position, rest))
}

fn frameshift_record(ref_aa: &str, position: i64, rest: &str) -> Option<VariantRecord> {
    let fs_at = rest.find("fs")?;
    let alt_aa = &rest[..fs_at];
    if !alt_aa.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(VariantRecord::Frameshift {
        ref_aa: ref_aa.to_string(),
        alt_aa: alt_aa.to_string(),
        position,
        shift_tail: rest[fs_at + 2..].to_string(),
    })
}

/// Find the first edit keyword in one half of a range.
///
/// Returns the positional head and, if a keyword was found, the edit with the
/// text from the keyword onwards.
fn split_keyword(half: &str) -> (&str, Option<(RangeEdit, &str)>) {
    let found = RANGE_KEYWORDS
        .iter()
        .filter_map(|(keyword, edit)| half.find(keyword).map(|at| (at, *edit)))
        // earliest match wins; on a tie the longer keyword (listed first) is kept
        .min_by_key(|(at, _)| *at);

    match found {
        Some((at, edit)) => (&half[..at], Some((edit, &half[at..]))),
        None => (half, None),
    }
}

fn parse_range(segment: &str, identifier: &str) -> Result<VariantRecord, FerroError> {
    let Some((left, right)) = segment.split_once('_') else {
        return Ok(VariantRecord::invalid(segment));
    };

    let (left_head, left_edit) = split_keyword(left);
    let (right_head, right_edit) = split_keyword(right);

    let edit = match (left_edit, right_edit) {
        (_, Some((edit, _))) => edit,
        (Some((edit, _)), None) => edit,
        (None, None) => {
            let pos = identifier.find(segment).unwrap_or(0) + segment.len();
            return Err(FerroError::parse(
                identifier,
                pos,
                format!("range '{}' has no del/ins/delins/dup keyword", segment),
                ErrorCode::MissingRangeKeyword,
            ));
        }
    };

    let decode_head = |head: &str| -> Result<Option<(String, i64)>, FerroError> {
        Ok(match decode_anchor(head, identifier)? {
            Some((residue, position, "")) => Some((residue.to_string(), position)),
            _ => None,
        })
    };

    match (decode_head(left_head)?, decode_head(right_head)?) {
        (Some((ref_aa_left, pos_left)), Some((ref_aa_right, pos_right))) => {
            Ok(VariantRecord::IndelRange {
                ref_aa_left,
                pos_left,
                left_tail: left_edit.map(|(_, tail)| tail).unwrap_or("").to_string(),
                ref_aa_right,
                pos_right,
                edit,
                tail: right_edit.map(|(_, tail)| tail).unwrap_or("").to_string(),
            })
        }
        _ => Ok(VariantRecord::invalid(segment)),
    }
}

/// Convert a one-letter amino acid change (`A12G`, `R5*`) to `p.Ala12Gly`.
pub fn aac_to_identifier(aac: &str) -> Option<String> {
    let mut chars = aac.chars();
    let wt = AminoAcid::from_one_letter(chars.next()?)?;
    let mt = AminoAcid::from_one_letter(chars.next_back()?)?;
    let position: u64 = chars.as_str().parse().ok()?;
    Some(format!(
        "p.{}{}{}",
        wt.to_three_letter(),
        position,
        mt.to_three_letter()
    ))
}
