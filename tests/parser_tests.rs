//! Identifier parsing and classification tests
//!
//! Covers the structural parser (`parse_identifier`), exact write-back at a
//! zero offset, and the fast text classifier used for partitioning score tables.

use ferro_mave::variant::{
    get_variant_type, parse_identifier, parse_identifier_strict, RangeEdit, VariantRecord,
    VariantType,
};
use ferro_mave::ErrorCode;
use rstest::rstest;

// =============================================================================
// Zero-offset write-back
// =============================================================================

#[rstest]
#[case("p.Met1Leu")]
#[case("p.Arg5Ter")]
#[case("p.Leu11Pro")]
#[case("p.Met12=")]
#[case("p.Met12Xaa")]
#[case("p.Arg97fs")]
#[case("p.Arg97Glyfs*16")]
#[case("p.Arg97ProfsTer23")]
#[case("p.Lys2_Met4del")]
#[case("p.Lys2_Met4dup")]
#[case("p.Lys2_Leu3insAla")]
#[case("p.Lys2_Met4delinsTrpAla")]
#[case("p.[Met1Leu;Lys2Arg]")]
#[case("NP_000509.1:p.Glu6Val")]
#[case("p.Lys2del")]
#[case("p.Met1?")]
#[case("p.=")]
#[case("_wt")]
#[case("_sy")]
fn test_zero_offset_is_identity(#[case] identifier: &str) {
    assert_eq!(parse_identifier(identifier).apply_offset(0), identifier);
}

// =============================================================================
// Shifting
// =============================================================================

#[rstest]
#[case("p.Met1Leu", 4, "p.Met5Leu")]
#[case("p.Met11Leu", -10, "p.Met1Leu")]
#[case("p.Arg97Glyfs*16", 3, "p.Arg100Glyfs*16")]
#[case("p.Lys2_Met4delinsTrpAla", 10, "p.Lys12_Met14delinsTrpAla")]
#[case("p.Lys2del_Met4", 1, "p.Lys3del_Met5")]
#[case("p.[Leu11Pro;Glu12Gly]", -10, "p.[Leu1Pro;Glu2Gly]")]
#[case("p.Met12=", 1, "p.Met13=")]
#[case("p.Met12Xaa", -2, "p.Met10Xaa")]
#[case("NP_000509.1:p.Glu6Val", -1, "NP_000509.1:p.Glu5Val")]
#[case("p.Lys2del", 5, "p.Lys2del")]
#[case("_wt", 5, "_wt")]
#[case("p.Met2Ter", -3, "p.Met-1Ter")]
#[case("p.Met-1Ter", 3, "p.Met2Ter")]
#[case("p.Lys-2_Met4del", 2, "p.Lys0_Met6del")]
#[case("p.Met1Leu", i64::MAX, "p.Met1Leu")]
fn test_apply_offset(#[case] identifier: &str, #[case] delta: i64, #[case] expected: &str) {
    assert_eq!(parse_identifier(identifier).apply_offset(delta), expected);
}

// =============================================================================
// Record shapes
// =============================================================================

#[rstest]
#[case("p.Met1Leu", Some(1))]
#[case("p.Lys2_Met4del", Some(2))]
#[case("p.Arg97fs", Some(97))]
#[case("p.Met1?", None)]
#[case("p.[Met1Leu;Lys2Arg]", None)]
fn test_position(#[case] identifier: &str, #[case] expected: Option<i64>) {
    assert_eq!(parse_identifier(identifier).position(), expected);
}

#[test]
fn test_every_identifier_has_one_body() {
    for identifier in ["", "p.", "x", "p.Met1Leu", "p.[Met1Leu]", "p.[]", "::", "p.Met99999999999999999999Leu"] {
        let variant = parse_identifier(identifier);
        assert!(!variant.records().is_empty(), "input {:?}", identifier);
        assert_eq!(variant.to_string(), identifier);
    }
}

#[test]
fn test_position_overflow_is_invalid() {
    let variant = parse_identifier("p.Met99999999999999999999Leu");
    assert!(variant.records()[0].is_invalid());
}

#[test]
fn test_shift_across_zero_parses_back() {
    let once = parse_identifier("p.Met2Leu").apply_offset(-3);
    assert_eq!(once, "p.Met-1Leu");
    assert_eq!(parse_identifier(&once).apply_offset(3), "p.Met2Leu");
}

#[test]
fn test_strict_parser_reports_overlong_position() {
    let err = parse_identifier_strict("p.[Met1Leu;Ala1234567890Gly]").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPosition);
    assert!(err.to_string().contains("1234567890"));

    let variant = parse_identifier("p.[Met1Leu;Ala1234567890Gly]");
    assert!(variant.records()[0].is_invalid());
    assert_eq!(variant.apply_offset(5), "p.[Met1Leu;Ala1234567890Gly]");
}

#[test]
fn test_range_edit_longest_keyword() {
    let variant = parse_identifier("p.Lys2_Met4delinsTrp");
    match variant.record() {
        Some(VariantRecord::IndelRange { edit, .. }) => assert_eq!(*edit, RangeEdit::Delins),
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_strict_parser_reports_missing_keyword() {
    let err = parse_identifier_strict("NP_1:p.Lys2_Met4").unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingRangeKeyword);
    assert!(err.to_string().contains("Lys2_Met4"));

    // a keyword on either half is enough
    assert!(parse_identifier_strict("p.Lys2del_Met4").is_ok());
    assert!(parse_identifier_strict("p.Lys2_Met4dup").is_ok());
}

#[test]
fn test_compound_with_bad_segment() {
    let variant = parse_identifier("p.[Met1Leu;junk]");
    let records = variant.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].position(), Some(1));
    assert!(records[1].is_invalid());
    assert_eq!(variant.apply_offset(1), "p.[Met2Leu;junk]");
}

// =============================================================================
// Fast classifier
// =============================================================================

#[rstest]
#[case("p.Met1Leu", VariantType::Sav)]
#[case("NP_000509.1:p.Glu6Val", VariantType::Sav)]
#[case("p.Arg5Ter", VariantType::Nonsense)]
#[case("p.Ter5Arg", VariantType::Nonsense)]
#[case("p.Met1=", VariantType::Synonymous)]
#[case("_wt", VariantType::Synonymous)]
#[case("_sy", VariantType::Synonymous)]
#[case("p.(=)", VariantType::Synonymous)]
#[case("p.Met1?", VariantType::Unknown)]
#[case("p.Arg5*", VariantType::Unknown)]
#[case("p.[Met1Leu;Lys2Arg]", VariantType::Multi)]
#[case("p.Arg97fs", VariantType::Frameshift)]
#[case("p.Arg97Glyfs*16", VariantType::Frameshift)]
#[case("p.Lys2_Met4delinsTrp", VariantType::Indel)]
#[case("p.Lys2_Met4del", VariantType::Deletion)]
#[case("p.Lys2_Leu3insAla", VariantType::Insertion)]
#[case("p.Lys2_Met4dup", VariantType::Duplication)]
fn test_classify(#[case] identifier: &str, #[case] expected: VariantType) {
    assert_eq!(get_variant_type(identifier), expected);
}
