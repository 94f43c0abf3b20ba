//! Decoder configuration
//!
//! Limits applied while decoding untrusted SDP data.

/// Default maximum nesting of sequences and alternatives
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default maximum payload length of a single data element: anything a
/// 32-bit length prefix can declare
pub const DEFAULT_MAX_ELEMENT_LEN: usize = u32::MAX as usize;

/// Limits used by the data element decoder and attribute list parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting of sequences/alternatives
    pub max_depth: usize,
    /// Maximum declared payload length of a single element
    pub max_element_len: usize,
    /// Require attribute IDs in attribute lists to be 16-bit unsigned integers
    pub strict_attribute_ids: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_element_len: DEFAULT_MAX_ELEMENT_LEN,
            strict_attribute_ids: true,
        }
    }
}

impl DecoderConfig {
    /// Configuration with the given nesting limit and default length limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}
