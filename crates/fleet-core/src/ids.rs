//! Strongly typed slot identifiers.
//!
//! Every entity group (vehicles, customers, depots) numbers its members from
//! zero in registration order.  The slot is the index into every column that
//! belongs to the group, so a `VehicleId(3)` addresses `battery[3]`,
//! `v_coord[3]`, `v_free[3]` and so on.  The inner integer is `pub`, but
//! callers should prefer `.index()` when indexing columns.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a column index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Slot of a vehicle (mother or sub) in the vehicle columns.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Slot of a customer node in the customer columns.
    pub struct CustomerId(u32);
}

typed_id! {
    /// Slot of a depot node in the depot columns.
    pub struct DepotId(u32);
}
