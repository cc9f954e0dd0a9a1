//! Containers for the per-round shares of the relinearization key generation
//! protocol.

use std::{fmt, ops::Index};

use crate::{Error, Result};

/// Dimensions of a share grid: one slot per modulus index `i` and
/// decomposition level `w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareShape {
    /// Number of CRT moduli.
    pub moduli: usize,
    /// Number of decomposition levels.
    pub levels: usize,
}

impl ShareShape {
    /// Creates a new shape.
    pub const fn new(moduli: usize, levels: usize) -> Self {
        Self { moduli, levels }
    }

    /// Number of slots of a grid of this shape.
    pub const fn len(&self) -> usize {
        self.moduli * self.levels
    }

    /// Whether a grid of this shape has no slot.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `(i, w)` coordinates of the slot at a flat index.
    pub(crate) const fn coordinates(&self, index: usize) -> (usize, usize) {
        (index / self.levels, index % self.levels)
    }
}

impl fmt::Display for ShareShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} moduli x {} levels", self.moduli, self.levels)
    }
}

/// A dense grid of slots addressed by `(i, w)`, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Grid<T> {
    shape: ShareShape,
    slots: Vec<T>,
}

impl<T> Grid<T> {
    pub(crate) fn from_fn<F: FnMut(usize, usize) -> T>(shape: ShareShape, mut f: F) -> Self {
        let slots = (0..shape.len())
            .map(|index| {
                let (i, w) = shape.coordinates(index);
                f(i, w)
            })
            .collect();
        Self { shape, slots }
    }

    /// The shape of the grid.
    pub fn shape(&self) -> ShareShape {
        self.shape
    }

    /// The slot at `(i, w)`, if it exists.
    pub fn get(&self, i: usize, w: usize) -> Option<&T> {
        if i < self.shape.moduli && w < self.shape.levels {
            self.slots.get(i * self.shape.levels + w)
        } else {
            None
        }
    }

    /// Iterate over the slots and their `(i, w)` coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (self.shape.coordinates(index), slot))
    }

    pub(crate) fn slots(&self) -> &[T] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }

    pub(crate) fn check_shape(&self, expected: ShareShape) -> Result<()> {
        if self.shape == expected {
            Ok(())
        } else {
            Err(Error::ShareShape {
                expected,
                found: self.shape,
            })
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (i, w): (usize, usize)) -> &T {
        match self.get(i, w) {
            Some(slot) => slot,
            None => panic!("slot ({i}, {w}) out of bounds for {}", self.shape),
        }
    }
}

macro_rules! share_container {
    ($(#[$doc:meta])* $name:ident, $slot:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name<E> {
            pub(crate) grid: Grid<$slot>,
        }

        impl<E> $name<E> {
            /// Build a share from elements received from another party;
            /// `f(i, w)` is the slot at modulus index `i` and level `w`.
            ///
            /// The protocol engine rejects the share with
            /// [`Error::ShareShape`] if `shape` is not its own.
            pub fn from_fn<F: FnMut(usize, usize) -> $slot>(shape: ShareShape, f: F) -> Self {
                Self {
                    grid: Grid::from_fn(shape, f),
                }
            }

            /// The shape of the share.
            pub fn shape(&self) -> ShareShape {
                self.grid.shape()
            }

            /// The slot at `(i, w)`, if it exists.
            pub fn get(&self, i: usize, w: usize) -> Option<&$slot> {
                self.grid.get(i, w)
            }

            /// Iterate over the slots and their `(i, w)` coordinates.
            pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &$slot)> {
                self.grid.iter()
            }
        }

        impl<E> Index<(usize, usize)> for $name<E> {
            type Output = $slot;

            fn index(&self, index: (usize, usize)) -> &$slot {
                &self.grid[index]
            }
        }
    };
}

share_container!(
    /// A party's round-1 share: `-u·a[i][w] + s·2^(w·b) + e` at every slot,
    /// where the secret term is only present on the residue modulo the i-th
    /// modulus.
    RoundOneShare,
    E
);

share_container!(
    /// A party's round-2 share: two elements per slot,
    /// `h[i][w]·s + e1` and `s·a[i][w] + e2`, where `h` is the round-1
    /// aggregate.
    RoundTwoShare,
    [E; 2]
);

share_container!(
    /// A party's round-3 share: `(u - s)·h1[i][w] + e` at every slot, where
    /// `h1` is the second component of the round-2 aggregate.
    RoundThreeShare,
    E
);
