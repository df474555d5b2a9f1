use core::fmt;

/// Error returned when a fixed-capacity container has no free slot left for a
/// new element.
///
/// The rejected element is handed back so that callers do not lose it. Table
/// level operations that never take ownership of a value report
/// `CapacityError<()>`.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use fixed_capacity::FixedHashSet;
///
/// let mut set: FixedHashSet<u32, 2> = FixedHashSet::new();
/// set.insert(1);
/// set.insert(2);
///
/// let err = set.try_insert(3).unwrap_err();
/// assert_eq!(err.capacity(), 2);
/// assert_eq!(err.into_element(), 3);
/// # }
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CapacityError<T = ()> {
    element: T,
    capacity: usize,
}

impl<T> CapacityError<T> {
    pub(crate) const fn new(element: T, capacity: usize) -> Self {
        Self { element, capacity }
    }

    /// Returns a reference to the element that could not be stored.
    pub fn element(&self) -> &T {
        &self.element
    }

    /// Consumes the error, returning the element that could not be stored.
    pub fn into_element(self) -> T {
        self.element
    }

    /// The fixed capacity of the container that rejected the element.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discards the element, keeping only the capacity information.
    pub fn simplify(self) -> CapacityError {
        CapacityError::new((), self.capacity)
    }
}

impl<T> fmt::Debug for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapacityError")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient capacity: all {} slots are occupied",
            self.capacity
        )
    }
}

impl<T> core::error::Error for CapacityError<T> {}
