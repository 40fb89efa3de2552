use alloc::{string::String, vec::Vec};

use bstr::ByteSlice;

use crate::{Match, compile, eval_bytes};

#[cfg(feature = "std")]
mod property_partition;

/// Runs `path` over `doc` and returns every match, panicking on errors.
pub(crate) fn run(doc: &[u8], path: &str) -> Vec<Match> {
    let program = compile(path).unwrap();
    eval_bytes(doc, &program).unwrap().into_matches().unwrap()
}

/// Runs `path` over `doc` and returns the values as strings.
pub(crate) fn values(doc: &str, path: &str) -> Vec<String> {
    run(doc.as_bytes(), path)
        .into_iter()
        .map(|m| m.value.to_str_lossy().into_owned())
        .collect()
}

pub(crate) fn quickcheck_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}
