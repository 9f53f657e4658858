#![no_main]

use libfuzzer_sys::fuzz_target;
use sunat_ubl::signature::embed;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // A normalized document accepts a block and strips back to itself.
        if let Ok(unsigned) = embed::normalize(s) {
            if let Ok(signed) = embed::splice(&unsigned, "<ds:Signature/>") {
                assert_eq!(embed::strip(&signed).ok().as_deref(), Some(unsigned.as_str()));
            }
        }
    }
});
