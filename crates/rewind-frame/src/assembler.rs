use tracing::{debug, trace};

use crate::consumer::SceneConsumer;
use crate::cursor::FieldCursor;
use crate::error::{FrameError, Result};
use crate::model::{AreaDesc, AreaType, Circle, Color, Frame, Line, Rectangle, Unit};
use crate::signal::StopSignal;
use crate::tag::PrimitiveTag;

/// Counters for one decoded body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodySummary {
    /// Records decoded, `begin`/`end` included.
    pub records: usize,
    /// Frames handed to the consumer.
    pub frames: usize,
    /// Areas handed to the consumer.
    pub areas: usize,
    /// Records in frames whose `end` arrived while stop was raised.
    pub dropped_records: usize,
    /// Bytes consumed; always the body length on success.
    pub bytes: usize,
}

/// Turns envelope bodies into frames.
///
/// Holds at most one in-progress frame, created on the first primitive and
/// handed off on `end`. The in-progress frame survives across bodies, so a
/// frame may span several envelopes.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    current: Option<Frame>,
    pending_records: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every record in `body`.
    ///
    /// Stops at the first malformed record; records decoded before it have
    /// already reached the consumer or the in-progress frame. While `stop` is
    /// raised, `end` drops the frame instead of dispatching it.
    pub fn process_body<C>(
        &mut self,
        body: &[u8],
        consumer: &mut C,
        stop: &StopSignal,
    ) -> Result<BodySummary>
    where
        C: SceneConsumer + ?Sized,
    {
        let mut cursor = FieldCursor::new(body);
        let mut summary = BodySummary::default();

        while !cursor.is_empty() {
            let offset = cursor.position();
            let byte = cursor.read_u8()?;
            let tag = PrimitiveTag::from_byte(byte);
            trace!(%tag, offset, "record");

            match tag {
                PrimitiveTag::Begin => {}
                PrimitiveTag::End => {
                    let frame = self.current.take().unwrap_or_default();
                    let records = std::mem::take(&mut self.pending_records);
                    if stop.is_raised() {
                        debug!(records, "stop requested; dropping finished frame");
                        summary.dropped_records += records;
                    } else {
                        debug!(primitives = frame.primitive_count(), "frame complete");
                        consumer.submit_frame(frame);
                        summary.frames += 1;
                    }
                }
                PrimitiveTag::Circle => {
                    let (x, y, r) = read_xyr(&mut cursor)?;
                    let color = Color::from_packed(cursor.read_u32()?);
                    self.frame().circles.push(Circle::new(x, y, r, color));
                }
                PrimitiveTag::Rectangle => {
                    let (x1, y1, x2, y2) = read_corners(&mut cursor)?;
                    let color = Color::from_packed(cursor.read_u32()?);
                    self.frame()
                        .rectangles
                        .push(Rectangle::from_corners(x1, y1, x2, y2, color));
                }
                PrimitiveTag::Line => {
                    let (x1, y1, x2, y2) = read_corners(&mut cursor)?;
                    let color = Color::from_packed(cursor.read_u32()?);
                    self.frame().lines.push(Line::new(x1, y1, x2, y2, color));
                }
                PrimitiveTag::Message => {
                    let len = cursor.read_u32()? as usize;
                    let text = String::from_utf8_lossy(cursor.read_slice(len)?).into_owned();
                    self.frame().message = Some(text);
                }
                PrimitiveTag::Unit => {
                    let (x, y, r) = read_xyr(&mut cursor)?;
                    let hp = cursor.read_u32()?;
                    let max_hp = cursor.read_u32()?;
                    let utype = cursor.read_i16()?;
                    let is_enemy = cursor.read_i16()?;
                    let course = cursor.read_f32()?;
                    self.frame()
                        .units
                        .push(Unit::from_wire(x, y, r, hp, max_hp, utype, is_enemy, course));
                }
                PrimitiveTag::Area => {
                    let x = cursor.read_u32()?;
                    let y = cursor.read_u32()?;
                    let area_type = AreaType::from_wire(cursor.read_i16()?);
                    consumer.submit_area(AreaDesc { x, y, area_type });
                    summary.areas += 1;
                }
                PrimitiveTag::Unknown => {
                    return Err(FrameError::UnknownTag { byte, offset });
                }
            }

            if !matches!(tag, PrimitiveTag::Begin | PrimitiveTag::End | PrimitiveTag::Area) {
                self.pending_records += 1;
            }
            summary.records += 1;
        }

        summary.bytes = cursor.position();
        debug_assert_eq!(summary.bytes, body.len());
        Ok(summary)
    }

    /// The frame being built, if any primitive arrived since the last `end`.
    pub fn pending(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Primitives and messages buffered in the pending frame.
    pub fn pending_records(&self) -> usize {
        self.pending_records
    }

    /// Drop the in-progress frame without dispatching it.
    pub fn discard(&mut self) -> Option<Frame> {
        self.pending_records = 0;
        self.current.take()
    }

    fn frame(&mut self) -> &mut Frame {
        self.current.get_or_insert_with(Frame::default)
    }
}

fn read_xyr(cursor: &mut FieldCursor<'_>) -> Result<(f32, f32, f32)> {
    Ok((cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?))
}

fn read_corners(cursor: &mut FieldCursor<'_>) -> Result<(f32, f32, f32, f32)> {
    Ok((
        cursor.read_f32()?,
        cursor.read_f32()?,
        cursor.read_f32()?,
        cursor.read_f32()?,
    ))
}
