//! Tagged primitive grammar, envelope framing and frame assembly.
//!
//! Every top-level message on the wire is an envelope:
//! - A 1-byte `b` tag
//! - A 4-byte little-endian body length
//! - The body: a sequence of tagged primitive records
//!
//! [`EnvelopeReader`] pulls envelopes off a [`rewind_transport::ByteSource`],
//! [`FrameAssembler`] turns bodies into [`Frame`]s for a [`SceneConsumer`],
//! and [`SceneWriter`] is the producer side of the same grammar.

pub mod assembler;
pub mod codec;
pub mod consumer;
pub mod cursor;
pub mod error;
pub mod model;
pub mod reader;
pub mod signal;
pub mod tag;
pub mod writer;

pub use assembler::{BodySummary, FrameAssembler};
pub use codec::{
    encode_envelope, encode_frame_body, BodyEncoder, DecoderConfig, DEFAULT_MAX_BODY,
    ENVELOPE_HEADER_SIZE,
};
pub use consumer::{SceneConsumer, SceneEvent};
pub use cursor::FieldCursor;
pub use error::{FrameError, Result};
pub use model::{
    AreaDesc, AreaType, Circle, Color, Faction, Frame, Geometry, Line, Point, Rectangle, Unit,
    UnitType,
};
pub use reader::{EnvelopeReader, ReadOutcome};
pub use signal::StopSignal;
pub use tag::PrimitiveTag;
pub use writer::{palette, SceneWriter};
