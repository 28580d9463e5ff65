use core::fmt;
use core::num::NonZeroU32;

/// Defines a compact typed identifier over a 0-based table index.
///
/// The index is stored as `index + 1` in a `NonZeroU32`, so `Option<Id>`
/// costs no extra space. Each id type is distinct, so a `LinkId` can never be
/// used to index the node table.
macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Create an id from a 0-based table index.
            ///
            /// Indices at `u32::MAX` saturate; tables never get that large.
            pub fn from_index(index: usize) -> Self {
                let raw = u32::try_from(index).unwrap_or(u32::MAX - 1);
                Self(NonZeroU32::MIN.saturating_add(raw))
            }

            /// Recover the 0-based table index.
            pub fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "({})"), self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.index())
            }
        }
    };
}

table_id!(
    /// Row of the node table.
    NodeId,
    "N"
);
table_id!(
    /// Row of the link table.
    LinkId,
    "L"
);
table_id!(
    /// Row of the component table.
    CompId,
    "C"
);
