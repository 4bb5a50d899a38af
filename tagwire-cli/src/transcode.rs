use anyhow::{Context, Result};
use tagwire_core::Registry;

use crate::format::FormatKind;

#[derive(Debug, Clone, Copy)]
pub struct TranscodeOptions {
    pub from: FormatKind,
    pub to: FormatKind,
    pub pretty: bool,
    /// Materialize every envelope through the built-in registry first.
    pub validate: bool,
}

/// Re-encode a document at the wire-tree level. Envelopes are carried
/// verbatim, so records of types this binary knows nothing about survive.
pub fn transcode(input: &[u8], options: TranscodeOptions) -> Result<Vec<u8>> {
    let wire = options
        .from
        .read(input)
        .with_context(|| format!("failed to parse input as {:?}", options.from))?;

    if options.validate {
        Registry::new()
            .from_wire(wire.clone())
            .context("input failed validation")?;
    }

    tracing::debug!(
        from = ?options.from,
        to = ?options.to,
        nodes = wire.node_count(),
        "transcoding"
    );
    options
        .to
        .write(&wire, options.pretty)
        .with_context(|| format!("failed to write {:?}", options.to))
}
