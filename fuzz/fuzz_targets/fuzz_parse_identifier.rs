//! Fuzz target for the total identifier parser
//!
//! This target feeds arbitrary byte strings to the parser to find crashes or
//! panics, and checks that every input is written back unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Don't fuzz extremely long inputs - diminishing returns
        if input.len() > 1000 {
            return;
        }

        let variant = ferro_mave::parse_identifier(input);
        assert_eq!(variant.apply_offset(0), input);
        let _ = variant.apply_offset(17);
        let _ = ferro_mave::get_variant_type(input);
    }
});
