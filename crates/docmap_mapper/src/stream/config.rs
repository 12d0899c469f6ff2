/// Prefix that marks operational members the store adds to a response.
pub const DEFAULT_RESERVED_PREFIX: &str = "$";

/// Top-level operational members that carry no prefix.
pub const DEFAULT_RESERVED_NAMES: [&str; 4] = ["code", "ok", "errmsg", "err"];

// -----------------------------------------------------------------------------
// DecoderConfig

/// Options of a decode pipeline.
///
/// ```
/// use docmap_mapper::stream::DecoderConfig;
///
/// let config = DecoderConfig::default().with_reserved_name("cursor");
///
/// assert!(config.is_reserved("$err"));
/// assert!(config.is_reserved("ok"));
/// assert!(config.is_reserved("cursor"));
/// assert!(!config.is_reserved("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    reserved_prefix: String,
    reserved_names: Vec<String>,
    decode_db_refs: bool,
    deny_unknown_fields: bool,
    fill_absent_members: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_owned(),
            reserved_names: DEFAULT_RESERVED_NAMES.iter().map(|name| (*name).to_owned()).collect(),
            decode_db_refs: true,
            deny_unknown_fields: false,
            fill_absent_members: false,
        }
    }
}

impl DecoderConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reserved prefix. An empty prefix disables prefix matching.
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    pub fn with_reserved_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.reserved_names.contains(&name) {
            self.reserved_names.push(name);
        }
        self
    }

    pub fn without_reserved_names(mut self) -> Self {
        self.reserved_names.clear();
        self
    }

    /// Whether `$ref`/`$id` sub-documents are delivered as one db-ref value.
    pub fn with_decode_db_refs(mut self, decode: bool) -> Self {
        self.decode_db_refs = decode;
        self
    }

    /// Whether members no field claims fail the decode instead of being skipped.
    pub fn with_deny_unknown_fields(mut self, deny: bool) -> Self {
        self.deny_unknown_fields = deny;
        self
    }

    /// Whether absent members are filled with empty values instead of failing the decode.
    ///
    /// Projected lookups decode with this enabled.
    pub fn with_fill_absent_members(mut self, fill: bool) -> Self {
        self.fill_absent_members = fill;
        self
    }

    #[inline]
    pub fn reserved_prefix(&self) -> &str {
        &self.reserved_prefix
    }

    #[inline]
    pub fn reserved_names(&self) -> &[String] {
        &self.reserved_names
    }

    #[inline]
    pub fn decode_db_refs(&self) -> bool {
        self.decode_db_refs
    }

    #[inline]
    pub fn deny_unknown_fields(&self) -> bool {
        self.deny_unknown_fields
    }

    #[inline]
    pub fn fill_absent_members(&self) -> bool {
        self.fill_absent_members
    }

    /// Returns `true` if a top-level member with this name belongs in the side channel.
    pub fn is_reserved(&self, name: &str) -> bool {
        (!self.reserved_prefix.is_empty() && name.starts_with(self.reserved_prefix.as_str()))
            || self.reserved_names.iter().any(|reserved| reserved == name)
    }
}
