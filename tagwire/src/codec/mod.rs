//! # Codecs
//!
//! A codec claims a set of value shapes and a disjoint set of wire tags, and
//! converts between the two.
//!
//! ## Built-in codecs
//!
//! - [`ContainerCodec`] - tuples, sets, complex numbers
//! - [`TemporalCodec`] - dates, times, date-times
//! - [`NumericCodec`] - numeric arrays and fixed-width scalars
//! - [`RecordCodec`] - registered record types

mod containers;
mod numeric;
mod record;
mod temporal;

pub use containers::ContainerCodec;
pub use numeric::NumericCodec;
pub use record::RecordCodec;
pub use temporal::TemporalCodec;

use crate::envelope::Envelope;
use crate::error::CodecError;
use crate::value::Value;

/// Encode-side precedence class. Lower classes are consulted first, so a
/// codec for a concrete shape always wins over an object-like catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// Claims concrete leaf shapes.
    Exact,
    /// Claims shapes by structure (a capability test over several types).
    Structural,
    /// Claims object-like values, e.g. any registered record.
    Generic,
}

pub trait Codec: Send + Sync + 'static {
    /// Name used in logs and registration errors.
    fn name(&self) -> &str;

    /// Tags this codec decodes. Must not overlap any other registered codec.
    fn tags(&self) -> &[&str];

    fn precedence(&self) -> Precedence {
        Precedence::Exact
    }

    /// Capability test used by `find_by_value`.
    fn claims(&self, value: &Value) -> bool;

    /// Convert a claimed value. Returns `Ok(None)` for values this codec does
    /// not handle; the registry turns that into `UnsupportedType`.
    fn encode(&self, value: &Value) -> Result<Option<Envelope>, CodecError>;

    /// Rebuild a value. Only called with envelopes carrying one of
    /// [`tags`](Self::tags); payload values are already decoded.
    fn decode(&self, envelope: Envelope) -> Result<Value, CodecError>;
}

/// Error for an envelope routed to a codec that does not claim its tag.
pub(crate) fn unclaimed(codec: &dyn Codec, envelope: &Envelope) -> CodecError {
    CodecError::malformed(
        envelope.tag(),
        format!("tag not handled by codec `{}`", codec.name()),
    )
}
