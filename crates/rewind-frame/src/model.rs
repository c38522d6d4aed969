//! Decoded scene primitives.
//!
//! Shapes are composed from [`Color`] and [`Geometry`] values rather than
//! layered on each other; a [`Unit`] carries circle geometry, it is not a
//! circle.

/// Normalized RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);
    pub const OLIVE: Color = Color::new(0.5, 0.5, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Unpack `0xRRGGBB`; the top byte is ignored. Each channel is `byte / 256`.
    pub fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed & 0xFF_0000) >> 16) as f32 / 256.0,
            g: ((packed & 0x00_FF00) >> 8) as f32 / 256.0,
            b: (packed & 0x00_00FF) as f32 / 256.0,
        }
    }

    /// Inverse of [`Color::from_packed`], saturating out-of-range channels.
    pub fn to_packed(self) -> u32 {
        fn channel(v: f32) -> u32 {
            (v * 256.0).round().clamp(0.0, 255.0) as u32
        }
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Center and radius shared by circles and units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Geometry {
    pub center: Point,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Circle {
    pub geometry: Geometry,
    pub color: Color,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32, color: Color) -> Self {
        Self {
            geometry: Geometry {
                center: Point::new(x, y),
                radius,
            },
            color,
        }
    }
}

/// Axis-aligned rectangle stored as center plus signed extents.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rectangle {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub color: Color,
    /// Corners as received, `(x1, y1, x2, y2)`.
    pub corners: (f32, f32, f32, f32),
}

impl Rectangle {
    /// Build from the two corners as sent on the wire.
    ///
    /// `width = x2 - x1` and `height = y1 - y2`, signs preserved, so a
    /// top-left/bottom-right pair in y-up coordinates gives positive extents.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32, color: Color) -> Self {
        let width = x2 - x1;
        let height = y1 - y2;
        Self {
            center: Point::new(x1 + width * 0.5, y2 + height * 0.5),
            width,
            height,
            color,
            corners: (x1, y1, x2, y2),
        }
    }
}

/// Segment between two endpoints.
///
/// The color is stored twice: `highlight` is always a copy of `color`, kept as
/// a separate slot because renderers read per-vertex colors from both.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub color: Color,
    pub highlight: Color,
}

impl Line {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, color: Color) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            color,
            highlight: color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnitType {
    #[default]
    Undefined = -1,
    Arrv = 0,
    Fighter = 1,
    Helicopter = 2,
    Ifv = 3,
    Tank = 4,
}

impl UnitType {
    /// Decode the wire value; anything outside `0..=4` is `Undefined`.
    pub fn from_wire(value: i16) -> Self {
        match value {
            0 => UnitType::Arrv,
            1 => UnitType::Fighter,
            2 => UnitType::Helicopter,
            3 => UnitType::Ifv,
            4 => UnitType::Tank,
            _ => UnitType::Undefined,
        }
    }

    pub fn to_wire(self) -> i16 {
        self as i16
    }
}

/// Which side a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Faction {
    Enemy,
    Own,
    Neutral,
}

impl Faction {
    /// `1` is enemy, `-1` is own, everything else is neutral.
    pub fn from_wire(is_enemy: i16) -> Self {
        match is_enemy {
            1 => Faction::Enemy,
            -1 => Faction::Own,
            _ => Faction::Neutral,
        }
    }

    pub fn to_wire(self) -> i16 {
        match self {
            Faction::Enemy => 1,
            Faction::Own => -1,
            Faction::Neutral => 0,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Faction::Enemy => Color::RED,
            Faction::Own => Color::BLUE,
            Faction::Neutral => Color::OLIVE,
        }
    }
}

/// Living unit: circle geometry plus health bar, type and heading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Unit {
    pub geometry: Geometry,
    pub color: Color,
    pub faction: Faction,
    pub hp: u32,
    pub max_hp: u32,
    pub utype: UnitType,
    pub course: f32,
}

impl Unit {
    #[allow(clippy::too_many_arguments)]
    pub fn from_wire(
        x: f32,
        y: f32,
        radius: f32,
        hp: u32,
        max_hp: u32,
        utype: i16,
        is_enemy: i16,
        course: f32,
    ) -> Self {
        let faction = Faction::from_wire(is_enemy);
        Self {
            geometry: Geometry {
                center: Point::new(x, y),
                radius,
            },
            color: faction.color(),
            faction,
            hp,
            max_hp,
            utype: UnitType::from_wire(utype),
            course,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AreaType {
    #[default]
    Undefined = -1,
    /// Terrain.
    Forest = 0,
    /// Terrain.
    Swamp = 1,
    /// Weather.
    Rain = 2,
    /// Weather.
    Cloud = 3,
}

impl AreaType {
    /// Decode the wire value; anything outside `0..=3` is `Undefined`.
    pub fn from_wire(value: i16) -> Self {
        match value {
            0 => AreaType::Forest,
            1 => AreaType::Swamp,
            2 => AreaType::Rain,
            3 => AreaType::Cloud,
            _ => AreaType::Undefined,
        }
    }

    pub fn to_wire(self) -> i16 {
        self as i16
    }
}

/// Static map cell description. Not part of any frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AreaDesc {
    /// Cell column.
    pub x: u32,
    /// Cell row.
    pub y: u32,
    pub area_type: AreaType,
}

/// One rendering snapshot.
///
/// Primitive order within each list is decode order, which is draw order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    pub circles: Vec<Circle>,
    pub rectangles: Vec<Rectangle>,
    pub lines: Vec<Line>,
    pub units: Vec<Unit>,
    pub message: Option<String>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of drawable primitives, message excluded.
    pub fn primitive_count(&self) -> usize {
        self.circles.len() + self.rectangles.len() + self.lines.len() + self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0 && self.message.is_none()
    }
}
