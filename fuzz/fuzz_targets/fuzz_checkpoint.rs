#![no_main]

use animats::evolution::{decode_checkpoint, encode_checkpoint};
use libfuzzer_sys::fuzz_target;

// Decoding arbitrary bytes must fail cleanly, and anything that decodes must
// re-encode to a stable byte string. Bytes are compared rather than values
// since a decoded NaN never equals itself.
fuzz_target!(|data: &[u8]| {
    if let Ok(checkpoint) = decode_checkpoint(data) {
        let bytes = encode_checkpoint(&checkpoint).unwrap();
        let again = decode_checkpoint(&bytes).unwrap();
        assert_eq!(encode_checkpoint(&again).unwrap(), bytes);
    }
});
