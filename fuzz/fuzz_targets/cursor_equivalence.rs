#![no_main]

use libfuzzer_sys::fuzz_target;
use wavl_engine::model::CursorEquivalenceInput;

fuzz_target!(|input: CursorEquivalenceInput| {
    wavl_engine::model::run_cursor_equivalence(input.values, input.ops);
});
