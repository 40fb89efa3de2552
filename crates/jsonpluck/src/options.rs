/// Configuration options for an evaluation session.
///
/// These options control how input is read, how deep documents may nest, and
/// which whitespace and multi-document forms are accepted.
///
/// # Examples
///
/// ```rust
/// use jsonpluck::{Eval, EvalOptions, SliceSource, compile};
///
/// let program = compile("$.id+").unwrap();
/// let options = EvalOptions {
///     allow_multiple_json_values: true,
///     ..Default::default()
/// };
/// let doc = b"{\"id\":1}\n{\"id\":2}\n";
/// let eval = Eval::new(SliceSource::new(doc), &program, options).unwrap();
/// let ids: Vec<_> = eval.map(|m| m.value).collect();
/// assert_eq!(ids, ["1", "2"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Number of bytes requested per `read` call by
    /// [`eval_reader`](crate::eval_reader).
    ///
    /// Has no effect on buffer evaluation. Must be non-zero.
    ///
    /// # Default
    ///
    /// `8192`
    pub read_chunk_size: usize,

    /// Maximum nesting depth of objects and arrays.
    ///
    /// Opening a container deeper than this aborts the session with
    /// [`EvalError::DepthLimitExceeded`](crate::EvalError::DepthLimitExceeded).
    /// Must be non-zero.
    ///
    /// # Default
    ///
    /// `512`
    pub max_depth: usize,

    /// Whether to evaluate the program against every value of a
    /// whitespace-delimited sequence of JSON values.
    ///
    /// When `true`, the scanner does not stop after the first root value, but
    /// continues with any additional values. This supports formats such as
    /// JSON Lines (JSONL) and newline-delimited JSON (ND-JSON). Each root value
    /// is matched from `$` again, and keys chains are relative to it. Empty
    /// input is accepted.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_json_values: bool,

    /// Whether to allow Unicode whitespace between JSON tokens.
    ///
    /// By default, only the four whitespace characters defined by the JSON
    /// standard are recognized: space, line feed, carriage return, and
    /// horizontal tab. When enabled, UTF-8 encoded no-break spaces, line and
    /// paragraph separators, the byte order mark, and the other Unicode space
    /// separators are skipped as well.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unicode_whitespace: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            read_chunk_size: 8192,
            max_depth: 512,
            allow_multiple_json_values: false,
            allow_unicode_whitespace: false,
        }
    }
}

impl EvalOptions {
    pub(crate) fn validate(&self) -> Result<(), crate::EvalError> {
        if self.read_chunk_size == 0 {
            return Err(crate::EvalError::InvalidOptions(
                "read_chunk_size must be non-zero",
            ));
        }
        if self.max_depth == 0 {
            return Err(crate::EvalError::InvalidOptions(
                "max_depth must be non-zero",
            ));
        }
        Ok(())
    }
}
