/// Options controlling how a compound file is opened and read.
///
/// # Examples
///
/// ```
/// use cfbf_reader::OpenOptions;
///
/// let options = OpenOptions::new()
///     .with_strict_stream_size(true)
///     .with_case_sensitive_names(true);
/// assert!(options.allow_empty_streams);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Accept streams declared with size 0 and an end-of-chain start sector
    pub allow_empty_streams: bool,
    /// Reject a nonzero high size word on 512-byte sector files instead of
    /// ignoring it with a warning
    pub strict_stream_size: bool,
    /// Compare entry names exactly during path lookups
    pub case_sensitive_names: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            allow_empty_streams: true,
            strict_stream_size: false,
            case_sensitive_names: false,
        }
    }
}

impl OpenOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_allow_empty_streams(mut self, allow: bool) -> Self {
        self.allow_empty_streams = allow;
        self
    }

    #[inline]
    pub fn with_strict_stream_size(mut self, strict: bool) -> Self {
        self.strict_stream_size = strict;
        self
    }

    #[inline]
    pub fn with_case_sensitive_names(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_names = case_sensitive;
        self
    }
}
