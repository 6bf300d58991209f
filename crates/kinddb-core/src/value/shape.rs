use std::fmt;

///
/// ValueShape
///
/// Structural tag carried by serialized fallback payloads.
/// Tags are part of the persisted blob layout. DO NOT reorder.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ValueShape {
    /// Accepts any payload shape on decode.
    Any = 0,
    Scalar = 1,
    List = 2,
    Map = 3,
    Record = 4,
}

impl ValueShape {
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Any),
            1 => Some(Self::Scalar),
            2 => Some(Self::List),
            3 => Some(Self::Map),
            4 => Some(Self::Record),
            _ => None,
        }
    }

    /// Whether a payload of shape `actual` satisfies this declared shape.
    #[must_use]
    pub const fn accepts(self, actual: Self) -> bool {
        matches!(self, Self::Any) || self as u8 == actual as u8
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Any => "any",
            Self::Scalar => "scalar",
            Self::List => "list",
            Self::Map => "map",
            Self::Record => "record",
        };
        f.write_str(label)
    }
}
