use core::{fmt, ops};

use enumflags2::{bitflags, make_bitflags, BitFlags};

/// One orthogonal bit of a [`Status`].
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusFlag {
    Occupied = 1,
    InsertError = 2,
    ArgumentError = 4,
    NoUnwrap = 8,
}

impl StatusFlag {
    fn name(self) -> &'static str {
        match self {
            StatusFlag::Occupied => "OCCUPIED",
            StatusFlag::InsertError => "INSERT_ERROR",
            StatusFlag::ArgumentError => "ARGUMENT_ERROR",
            StatusFlag::NoUnwrap => "NO_UNWRAP",
        }
    }
}

/// The state of an entry or of a search-once mutation.
///
/// `VACANT` and `OCCUPIED` describe what the search found; the remaining bits are orthogonal
/// flags and may be combined with either.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Status(BitFlags<StatusFlag>);

impl Status {
    /// The key was not present.
    pub const VACANT: Status = Status(BitFlags::EMPTY);
    /// The key was present.
    pub const OCCUPIED: Status = Status(make_bitflags!(StatusFlag::{Occupied}));
    /// A new record was required but no storage could be obtained.
    pub const INSERT_ERROR: Status = Status(make_bitflags!(StatusFlag::{InsertError}));
    /// An argument (usually a handle) did not name a live record.
    pub const ARGUMENT_ERROR: Status = Status(make_bitflags!(StatusFlag::{ArgumentError}));
    /// The result carries no payload that may be unwrapped.
    pub const NO_UNWRAP: Status = Status(make_bitflags!(StatusFlag::{NoUnwrap}));

    /// Returns the raw flag bits.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0.bits()
    }

    /// Returns the set flags.
    #[inline]
    pub fn flags(self) -> BitFlags<StatusFlag> {
        self.0
    }

    /// Returns `true` if every flag set in `other` is also set in `self`.
    ///
    /// `VACANT` has no bits, so every status contains it; use [`Status::is_vacant`] instead.
    #[inline]
    pub fn contains(self, other: Status) -> bool {
        self.0.contains(other.0)
    }

    #[inline]
    pub fn is_occupied(self) -> bool {
        self.0.contains(StatusFlag::Occupied)
    }

    #[inline]
    pub fn is_vacant(self) -> bool {
        !self.is_occupied()
    }

    #[inline]
    pub fn is_insert_error(self) -> bool {
        self.0.contains(StatusFlag::InsertError)
    }

    #[inline]
    pub fn is_argument_error(self) -> bool {
        self.0.contains(StatusFlag::ArgumentError)
    }

    /// Returns `true` if the payload of a result with this status must not be accessed.
    #[inline]
    pub fn no_unwrap(self) -> bool {
        self.0.contains(StatusFlag::NoUnwrap)
    }
}

impl From<StatusFlag> for Status {
    fn from(flag: StatusFlag) -> Self {
        Status(flag.into())
    }
}

impl ops::BitOr for Status {
    type Output = Status;

    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_vacant() {
            f.write_str("VACANT")?;
        }

        for (i, flag) in self.0.iter().enumerate() {
            if i > 0 || self.is_vacant() {
                f.write_str(" | ")?;
            }
            f.write_str(flag.name())?;
        }

        Ok(())
    }
}

/// Errors reported by container operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A handle did not name a live record.
    #[error("handle does not name a live record")]
    Argument,

    /// A new record needed a slot and none could be obtained.
    #[error("no slot available for a new record (capacity {capacity})")]
    Insert { capacity: usize },
}

impl Error {
    /// Returns the status flags describing this error.
    pub fn status(&self) -> Status {
        match self {
            Error::Argument => Status(make_bitflags!(StatusFlag::{ArgumentError | NoUnwrap})),
            Error::Insert { .. } => Status(make_bitflags!(StatusFlag::{InsertError | NoUnwrap})),
        }
    }
}

/// A record that could not be inserted, handed back with the reason.
///
/// The caller still owns the record and may retry, e.g. after reserving capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejected<K, V> {
    pub error: Error,
    pub key: K,
    pub value: V,
}

impl<K, V> Rejected<K, V> {
    pub fn into_record(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<Rejected<K, V>> for Error {
    fn from(rejected: Rejected<K, V>) -> Self {
        rejected.error
    }
}

/// The result of a search-once mutation: a status and, unless `NO_UNWRAP` is set, a payload.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Outcome<T> {
    status: Status,
    value: Option<T>,
}

impl<T> Outcome<T> {
    pub(crate) fn occupied(value: T) -> Self {
        Outcome {
            status: Status::OCCUPIED,
            value: Some(value),
        }
    }

    pub(crate) fn vacant(value: T) -> Self {
        Outcome {
            status: Status::VACANT,
            value: Some(value),
        }
    }

    /// A vacant result without a payload, e.g. the key of a removal was absent.
    pub(crate) fn empty() -> Self {
        Outcome {
            status: Status::VACANT | Status::NO_UNWRAP,
            value: None,
        }
    }

    pub(crate) fn error(error: Error) -> Self {
        Outcome {
            status: error.status(),
            value: None,
        }
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.status.is_occupied()
    }

    #[inline]
    pub fn is_vacant(&self) -> bool {
        self.status.is_vacant()
    }

    #[inline]
    pub fn is_insert_error(&self) -> bool {
        self.status.is_insert_error()
    }

    /// Returns the payload, or `None` if `NO_UNWRAP` is set.
    pub fn unwrap(self) -> Option<T> {
        if self.status.no_unwrap() {
            return None;
        }

        self.value
    }

    /// Returns a reference to the payload, or `None` if `NO_UNWRAP` is set.
    pub fn as_ref(&self) -> Option<&T> {
        if self.status.no_unwrap() {
            return None;
        }

        self.value.as_ref()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            status: self.status,
            value: self.value.map(f),
        }
    }
}

impl<T> From<Error> for Outcome<T> {
    fn from(error: Error) -> Self {
        Outcome::error(error)
    }
}

impl<T, K, V> From<Rejected<K, V>> for Outcome<T> {
    fn from(rejected: Rejected<K, V>) -> Self {
        Outcome::error(rejected.error)
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("status", &self.status)
            .field("value", &self.as_ref())
            .finish()
    }
}
