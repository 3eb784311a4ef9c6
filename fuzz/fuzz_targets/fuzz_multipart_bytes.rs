#![no_main]

use libfuzzer_sys::fuzz_target;
use streaming_multipart::{Constraints, Multipart};

fuzz_target!(|data: &[u8]| {
    let constraints = Constraints::new().buffer_size(64);
    let mut multipart = match Multipart::with_constraints(data, constraints) {
        Ok(multipart) => multipart,
        Err(_) => return,
    };

    let mut breaks = 0;
    while breaks < 3 {
        match multipart.next_field() {
            Err(_) | Ok(None) => breaks += 1,
            Ok(Some(mut field)) => {
                while let Ok(Some(_)) = field.read_chunk(&mut [0; 7]) {}
            }
        }
    }
});
