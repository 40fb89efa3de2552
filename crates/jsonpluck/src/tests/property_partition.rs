use alloc::vec::Vec;

use quickcheck::QuickCheck;

use super::{
    arbitrary::{Node, split_at_points},
    quickcheck_tests,
};
use crate::{
    Eval, EvalError, EvalOptions, Match, SliceSource, chunk_utils::ChunkedReader, compile,
    compile_paths, eval_bytes,
};

const PATHS: [&str; 8] = [
    "$+",
    "$.*+",
    "$[*]+",
    "$.*[*]+",
    "$[*].*+",
    "$+.*+[0]+",
    "$[1:]+",
    r#"$[?(@.k0 == "a")]+"#,
];

/// Property: reading a document through a stream, split at arbitrary points
/// and read through an arbitrarily small buffer, yields exactly the matches
/// and the error of reading it from memory. Truncated documents included.
#[test]
fn partition_equivalence_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(node: Node, pads: Vec<u8>, splits: Vec<usize>, path: usize, cut: usize) -> bool {
        let text = node.spaced(&pads);
        let bytes = &text.as_bytes()[..cut % (text.len() + 1)];
        let program = compile(PATHS[path % PATHS.len()]).unwrap();

        let mut from_bytes = eval_bytes(bytes, &program).unwrap();
        let expected: Vec<Match> = from_bytes.by_ref().collect();
        let expected_error: Option<EvalError> = from_bytes.error().cloned();

        let options = EvalOptions {
            read_chunk_size: 1 + splits.len() % 7,
            ..Default::default()
        };
        let reader = ChunkedReader::new(split_at_points(bytes, &splits));
        let mut from_reader = Eval::from_reader(reader, &program, options).unwrap();
        let actual: Vec<Match> = from_reader.by_ref().collect();

        expected == actual && expected_error.as_ref() == from_reader.error()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Node, Vec<u8>, Vec<usize>, usize, usize) -> bool);
}

/// Property: a session running several programs yields the same matches
/// from a stream as from memory, and per program the same matches as a
/// session running that program alone.
#[test]
fn program_set_partition_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(node: Node, pads: Vec<u8>, splits: Vec<usize>, picks: Vec<usize>) -> bool {
        let text = node.spaced(&pads);
        let bytes = text.as_bytes();
        let paths: Vec<&str> = picks.iter().take(4).map(|p| PATHS[p % PATHS.len()]).collect();
        let programs = compile_paths(&paths).unwrap();
        let options = EvalOptions::default();

        let mut from_bytes = Eval::with_programs(SliceSource::new(bytes), &programs, options).unwrap();
        let expected: Vec<Match> = from_bytes.by_ref().collect();

        let reader = ChunkedReader::new(split_at_points(bytes, &splits));
        let mut from_reader = Eval::from_reader_with_programs(reader, &programs, options).unwrap();
        let actual: Vec<Match> = from_reader.by_ref().collect();
        if expected != actual || from_bytes.error() != from_reader.error() {
            return false;
        }

        programs.iter().all(|program| {
            let alone: Vec<Match> = eval_bytes(bytes, program).unwrap().collect();
            let within: Vec<Match> = expected
                .iter()
                .filter(|m| *m.path == *program.source())
                .cloned()
                .collect();
            // A path picked twice contributes each match twice.
            let copies = paths.iter().filter(|p| **p == program.source()).count();
            within.len() == alone.len() * copies
                && alone.iter().all(|m| within.contains(m))
        })
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Node, Vec<u8>, Vec<usize>, Vec<usize>) -> bool);
}
