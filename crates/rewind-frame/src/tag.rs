//! One-byte record tags.
//!
//! The wire byte and the variant are declared side by side in a single
//! table; both conversion directions are generated from it as exhaustive
//! matches.

macro_rules! primitive_tags {
    ($($(#[$doc:meta])* $variant:ident => $byte:literal, $name:literal;)+) => {
        /// Type of the record that follows a tag byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PrimitiveTag {
            $($(#[$doc])* $variant,)+
            /// Any byte outside the table. Never written to the wire.
            Unknown,
        }

        impl PrimitiveTag {
            /// Every valid tag, in table order.
            pub const ALL: &'static [PrimitiveTag] = &[$(PrimitiveTag::$variant,)+];

            /// Decode a wire byte. Unrecognized bytes map to [`PrimitiveTag::Unknown`].
            pub fn from_byte(byte: u8) -> Self {
                match byte {
                    $($byte => PrimitiveTag::$variant,)+
                    _ => PrimitiveTag::Unknown,
                }
            }

            /// The wire byte for this tag, `None` for [`PrimitiveTag::Unknown`].
            pub fn to_byte(self) -> Option<u8> {
                match self {
                    $(PrimitiveTag::$variant => Some($byte),)+
                    PrimitiveTag::Unknown => None,
                }
            }

            /// Lowercase name for diagnostics.
            pub fn name(self) -> &'static str {
                match self {
                    $(PrimitiveTag::$variant => $name,)+
                    PrimitiveTag::Unknown => "unknown",
                }
            }
        }
    };
}

primitive_tags! {
    /// Envelope start; carries no payload inside a body.
    Begin => b'b', "begin";
    /// Finalizes the in-progress frame.
    End => b'e', "end";
    Circle => b'c', "circle";
    Rectangle => b'r', "rectangle";
    Line => b'l', "line";
    /// Length-prefixed user text.
    Message => b'm', "message";
    Unit => b'u', "unit";
    /// Terrain/weather cell, bypasses frame buffering.
    Area => b'a', "area";
}

impl std::fmt::Display for PrimitiveTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
