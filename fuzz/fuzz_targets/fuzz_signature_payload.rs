#![no_main]

use libfuzzer_sys::fuzz_target;

use stenotype::voice::RequestValidator;

fuzz_target!(|data: (&str, Vec<(String, String)>, &str)| {
    let (uri, params, signature) = data;
    // Must never panic; a mismatch is Ok(false), an empty URI is an error.
    let validator = RequestValidator::new("ACfuzz", "token");
    if let Ok(expected) = validator.compute_signature(uri, &params) {
        assert_eq!(validator.validate(uri, &params, &expected), Ok(true));
    }
    let _ = validator.validate(uri, &params, signature);
});
