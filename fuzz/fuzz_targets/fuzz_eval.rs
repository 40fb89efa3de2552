#![no_main]

use arbitrary::Arbitrary;
use jsonpluck::{Eval, EvalOptions, SliceSource, chunk_utils::ChunkedReader, compile_paths};
use libfuzzer_sys::fuzz_target;

const PATHS: [&str; 10] = [
    "$+",
    "$.*+",
    "$[*]+",
    "$.a+",
    "$.a[1:3]+",
    "$+.*+.*+",
    "$[0][0]+",
    r#"$[?(@.k == "v")]+"#,
    r#"$.*[?(@.* == 1)].a+"#,
    "$.a+.b[*]+",
];

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    paths: Vec<u8>,
    custom_path: Option<&'a str>,
    doc: &'a [u8],
    splits: Vec<u8>,
    chunk_size: u8,
    multiple_values: bool,
    unicode_whitespace: bool,
    max_depth: u8,
}

fn chunks<'a>(doc: &'a [u8], splits: &[u8]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = doc;
    for &split in splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(usize::from(split) % (rest.len() + 1));
        out.push(head);
        rest = tail;
    }
    out.push(rest);
    out
}

fuzz_target!(|input: Input<'_>| {
    let mut paths: Vec<&str> = input
        .paths
        .iter()
        .take(4)
        .map(|&i| PATHS[usize::from(i) % PATHS.len()])
        .collect();
    paths.extend(input.custom_path);
    let Ok(programs) = compile_paths(&paths) else {
        return;
    };

    let options = EvalOptions {
        read_chunk_size: usize::from(input.chunk_size).max(1),
        max_depth: usize::from(input.max_depth).max(1),
        allow_multiple_json_values: input.multiple_values,
        allow_unicode_whitespace: input.unicode_whitespace,
    };

    let mut from_bytes =
        Eval::with_programs(SliceSource::new(input.doc), &programs, options).unwrap();
    let expected: Vec<_> = from_bytes.by_ref().collect();
    let expected_error = from_bytes.error().cloned();

    let reader = ChunkedReader::new(chunks(input.doc, &input.splits));
    let mut from_reader = Eval::from_reader_with_programs(reader, &programs, options).unwrap();
    let actual: Vec<_> = from_reader.by_ref().collect();
    assert_eq!(actual, expected);
    assert_eq!(from_reader.error().cloned(), expected_error);
});
