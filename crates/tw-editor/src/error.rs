//! Error types for the sample editor.

/// Errors surfaced by editing operations.
///
/// Unmet preconditions (no sample, empty sample, no selection) are not
/// errors; operations report them as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The module allocator had no memory left. The sample is untouched.
    #[error("out of sample memory ({bytes} bytes requested)")]
    OutOfMemory { bytes: usize },
    /// A bit depth other than 8 or 16.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u8),
    #[error("invalid editor config: {0}")]
    Config(#[from] toml::de::Error),
}

/// `Ok(true)` if the operation ran, `Ok(false)` if its preconditions were
/// not met and nothing was touched.
pub type EditResult = Result<bool, EditError>;
