/// Configuration for parsing a compound container.
///
/// # Examples
///
/// ```rust
/// use excelibur::ole::ParseOptions;
///
/// // Create with defaults
/// let options = ParseOptions::default();
///
/// // Or customize
/// let options = ParseOptions::new()
///     .with_max_input_len(Some(64 * 1024 * 1024))
///     .with_verify_byte_order(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject inputs larger than this many bytes before parsing starts.
    ///
    /// Parsing cost is linear in the number of sectors, so this is the knob
    /// for bounding work on untrusted input.
    pub max_input_len: Option<usize>,
    /// Require the header's byte-order marker to be `0xFFFE`
    pub verify_byte_order: bool,
}

impl ParseOptions {
    /// Create a new `ParseOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum accepted input length in bytes.
    ///
    /// `None` disables the limit.
    #[inline]
    pub fn with_max_input_len(mut self, limit: Option<usize>) -> Self {
        self.max_input_len = limit;
        self
    }

    /// Set whether the header's byte-order marker is checked.
    #[inline]
    pub fn with_verify_byte_order(mut self, verify: bool) -> Self {
        self.verify_byte_order = verify;
        self
    }
}
