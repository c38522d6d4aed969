use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::model::Frame;
use crate::tag::PrimitiveTag;

/// Envelope header: tag (1) + body length (4) = 5 bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 5;

/// Default maximum body size: 64 MiB.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024 * 1024;

/// Bytes following the tag of each fixed-size record.
pub const CIRCLE_PAYLOAD: usize = 12 + 4;
pub const RECTANGLE_PAYLOAD: usize = 16 + 4;
pub const LINE_PAYLOAD: usize = 16 + 4;
pub const UNIT_PAYLOAD: usize = 12 + 4 + 4 + 2 + 2 + 4;
pub const AREA_PAYLOAD: usize = 4 + 4 + 2;

/// Encode one envelope around an already-built body.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬──────────────────────┐
/// │ Tag (1B) │ Length    │ Body                 │
/// │ 'b'      │ (4B LE)   │ (Length bytes of     │
/// │          │           │  tagged records)     │
/// └──────────┴───────────┴──────────────────────┘
/// ```
pub fn encode_envelope(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| FrameError::LengthOverflow { size: body.len() })?;
    dst.reserve(ENVELOPE_HEADER_SIZE + body.len());
    dst.put_u8(b'b');
    dst.put_u32_le(len);
    dst.put_slice(body);
    Ok(())
}

/// Accumulates tagged records into an envelope body.
#[derive(Debug, Default)]
pub struct BodyEncoder {
    buf: BytesMut,
}

impl BodyEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn tag(&mut self, tag: PrimitiveTag) {
        if let Some(byte) = tag.to_byte() {
            self.buf.put_u8(byte);
        }
    }

    pub fn end(&mut self) -> &mut Self {
        self.tag(PrimitiveTag::End);
        self
    }

    pub fn circle(&mut self, x: f32, y: f32, r: f32, color: u32) -> &mut Self {
        self.tag(PrimitiveTag::Circle);
        self.buf.put_f32_le(x);
        self.buf.put_f32_le(y);
        self.buf.put_f32_le(r);
        self.buf.put_u32_le(color);
        self
    }

    pub fn rect(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32) -> &mut Self {
        self.tag(PrimitiveTag::Rectangle);
        self.corners(x1, y1, x2, y2, color);
        self
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32) -> &mut Self {
        self.tag(PrimitiveTag::Line);
        self.corners(x1, y1, x2, y2, color);
        self
    }

    fn corners(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32) {
        self.buf.put_f32_le(x1);
        self.buf.put_f32_le(y1);
        self.buf.put_f32_le(x2);
        self.buf.put_f32_le(y2);
        self.buf.put_u32_le(color);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn unit(
        &mut self,
        x: f32,
        y: f32,
        r: f32,
        hp: u32,
        max_hp: u32,
        utype: i16,
        is_enemy: i16,
        course: f32,
    ) -> &mut Self {
        self.tag(PrimitiveTag::Unit);
        self.buf.put_f32_le(x);
        self.buf.put_f32_le(y);
        self.buf.put_f32_le(r);
        self.buf.put_u32_le(hp);
        self.buf.put_u32_le(max_hp);
        self.buf.put_i16_le(utype);
        self.buf.put_i16_le(is_enemy);
        self.buf.put_f32_le(course);
        self
    }

    pub fn message(&mut self, text: &str) -> Result<&mut Self> {
        let len = u32::try_from(text.len())
            .map_err(|_| FrameError::LengthOverflow { size: text.len() })?;
        self.tag(PrimitiveTag::Message);
        self.buf.put_u32_le(len);
        self.buf.put_slice(text.as_bytes());
        Ok(self)
    }

    pub fn area(&mut self, x: u32, y: u32, area_type: i16) -> &mut Self {
        self.tag(PrimitiveTag::Area);
        self.buf.put_u32_le(x);
        self.buf.put_u32_le(y);
        self.buf.put_i16_le(area_type);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Encode a whole frame as body records, terminated by `end`.
///
/// Primitives go out grouped by kind in list order, which is the order the
/// decoder rebuilds them in.
pub fn encode_frame_body(frame: &Frame, body: &mut BodyEncoder) -> Result<()> {
    for c in &frame.circles {
        let g = &c.geometry;
        body.circle(g.center.x, g.center.y, g.radius, c.color.to_packed());
    }
    for r in &frame.rectangles {
        let (x1, y1, x2, y2) = r.corners;
        body.rect(x1, y1, x2, y2, r.color.to_packed());
    }
    for l in &frame.lines {
        body.line(l.x1, l.y1, l.x2, l.y2, l.color.to_packed());
    }
    for u in &frame.units {
        let g = &u.geometry;
        body.unit(
            g.center.x,
            g.center.y,
            g.radius,
            u.hp,
            u.max_hp,
            u.utype.to_wire(),
            u.faction.to_wire(),
            u.course,
        );
    }
    if let Some(text) = &frame.message {
        body.message(text)?;
    }
    body.end();
    Ok(())
}

/// Decoder-side limits.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum declared body length in bytes. Default: 64 MiB.
    pub max_body_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
            read_timeout: None,
        }
    }
}
