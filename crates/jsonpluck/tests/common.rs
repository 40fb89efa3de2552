#![allow(dead_code)]

use core::fmt::Write;

use jsonpluck::{EvalError, Match, compile, eval_bytes};

pub const CATALOG: &str = r#"
{
    "store": "north",
    "items": [
        {
            "name": "alpha",
            "tags": ["a", "b"],
            "price": 11
        },
        {
            "price": 22,
            "name": "bravo",
            "tags": []
        },
        {
            "name": "charlie",
            "dims": { "w": 3, "h": 4 },
            "price": 33
        }
    ],
    "meta": { "count": 3, "next": null }
}"#;

// The compact form of `CATALOG`, cut mid-token and on structural seams so
// that every kind of lexeme straddles a read boundary at least once.
#[rustfmt::skip]
pub const STREAM: [&str; 11] = [
    r#"{"store":"no"#,                            // string split
    r#"rth","items":[{"#,                         // string end -> key start on next chunk
    r#""name":"alpha","tags":["a""#,
    r#","b"],"price":1"#,                         // number split
    r#"1},{"price":22,"#,
    r#""name":"bra"#,
    r#"vo","tags":[]}"#,
    r#",{"name":"charlie","dims":{"w":3,"#,
    r#""h":4},"price":33}]"#,                     // '}]' object end -> array end
    r#","meta":{"count":3,"next":nu"#,            // literal split
    r#"ll}}"#,
];

/// Runs `path` over `doc` from memory.
pub fn from_bytes(doc: &[u8], path: &str) -> (Vec<Match>, Option<EvalError>) {
    let program = compile(path).unwrap();
    let mut eval = eval_bytes(doc, &program).unwrap();
    let matches = eval.by_ref().collect();
    (matches, eval.error().cloned())
}

/// One line per match: keys, kind and value.
pub fn render(matches: &[Match]) -> String {
    let mut out = String::new();
    for m in matches {
        let keys: Vec<String> = m.keys.iter().map(ToString::to_string).collect();
        writeln!(out, "[{}] {} {}", keys.join(","), m.kind, m.value).unwrap();
    }
    out
}
