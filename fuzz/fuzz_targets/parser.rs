#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    if let Ok(program) = schemer::parse(source) {
        let _ = program.to_string();
    }
    let _ = schemer::is_balanced(source);
});
