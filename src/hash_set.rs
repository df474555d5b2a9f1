use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::error::CapacityError;
use crate::hash_table::Entry;
use crate::hash_table::FixedHashTable;

/// A fixed-capacity hash set stored inline in an array of `N` slots.
///
/// `FixedHashSet<T, N, S>` stores values of type `T` where `T` implements
/// `Hash + Eq` and uses a configurable hasher builder `S`. A value's home
/// bucket is its hash modulo `N`. Collisions are resolved with linear probing
/// and removals leave tombstones, as described on [`FixedHashTable`].
///
/// The set never grows or allocates. [`insert`](Self::insert) panics when the
/// value is new and all `N` slots already hold live values;
/// [`try_insert`](Self::try_insert) reports that case as a
/// [`CapacityError`] instead. Probe lengths rise quickly with the load
/// factor, so size `N` comfortably above the expected number of values.
///
/// # Performance Characteristics
///
/// - **Memory**: `N` slots of `T` plus a tag, inline.
/// - **Operations**: expected O(1) at moderate load factors, O(N) worst case.
#[derive(Clone)]
pub struct FixedHashSet<T, const N: usize, S = DefaultHashBuilder> {
    table: FixedHashTable<T, N>,
    hash_builder: S,
}

impl<T, const N: usize, S> PartialEq for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, const N: usize, S> Eq for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, const N: usize, S> Debug for FixedHashSet<T, N, S>
where
    T: Debug + Hash + Eq,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, const N: usize, S> FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty set with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let set: FixedHashSet<i32, 32, _> = FixedHashSet::with_hasher(RandomState::new());
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: FixedHashTable::new(),
            hash_builder,
        }
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 16> = FixedHashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the fixed number of slots, `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the fraction of slots holding live values.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / N as f64
    }

    /// Removes all elements from the set.
    ///
    /// Tombstones are discarded too, so the set behaves exactly like a freshly
    /// created one afterwards.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain this value, `true` is returned.
    /// - If the set already contained this value, `false` is returned and the
    ///   set is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the value is new and all `N` slots hold live values. Use
    /// [`try_insert`](Self::try_insert) to recover the value instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 16> = FixedHashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(inserted) => inserted,
            Err(err) => panic!("{err}"),
        }
    }

    /// Adds a value to the set, handing it back in a [`CapacityError`] if the
    /// value is new and no slot is free.
    ///
    /// On success, returns whether the value was newly inserted, like
    /// [`insert`](Self::insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<&str, 2> = FixedHashSet::new();
    /// assert_eq!(set.try_insert("a"), Ok(true));
    /// assert_eq!(set.try_insert("b"), Ok(true));
    /// assert_eq!(set.try_insert("b"), Ok(false));
    ///
    /// let err = set.try_insert("c").unwrap_err();
    /// assert_eq!(*err.element(), "c");
    /// # }
    /// ```
    pub fn try_insert(&mut self, value: T) -> Result<bool, CapacityError<T>> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.try_entry(hash, |v| v == &value) {
            Ok(Entry::Occupied(_)) => Ok(false),
            Ok(Entry::Vacant(entry)) => {
                entry.insert(value);
                Ok(true)
            }
            Err(err) => Err(CapacityError::new(value, err.capacity())),
        }
    }

    /// Adds a value to the set, replacing the existing value, if any, that is
    /// equal to the given one. Returns the replaced value.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`insert`](Self::insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 8> = FixedHashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.replace(1), Some(1));
    /// assert_eq!(set.replace(2), None);
    /// assert_eq!(set.len(), 2);
    /// # }
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            Entry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 8> = FixedHashSet::new();
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// # }
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Removes a value from the set. Returns whether the value was present.
    ///
    /// Removing a value that is absent, or that was already removed, is a
    /// no-op returning `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 8> = FixedHashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// # }
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value)
    }

    /// Removes every element for which `pred` returns `true` and returns the
    /// number removed.
    ///
    /// Elements are visited once each, in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 16> = (1..=6).collect();
    /// assert_eq!(set.erase_if(|&x| x % 2 == 0), 3);
    /// assert_eq!(set.len(), 3);
    /// assert!(!set.contains(&4));
    /// # }
    /// ```
    pub fn erase_if(&mut self, pred: impl FnMut(&T) -> bool) -> usize {
        self.table.erase_if(pred)
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all elements `e` for which `f(&e)` returns
    /// `false`.
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.table.retain(f);
    }

    /// Returns an iterator over the values of the set in slot order.
    ///
    /// The order depends on the hashes, not on insertion order. A new call
    /// always starts from the first slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let mut set: FixedHashSet<i32, 8> = FixedHashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// for value in set.iter() {
    ///     println!("Value: {}", value);
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields all values from the set.
    ///
    /// After the iterator is dropped the set is empty and free of tombstones.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns `true` if the set contains no elements in common with `other`.
    pub fn is_disjoint<const M: usize>(&self, other: &FixedHashSet<T, M, S>) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if `other` contains at least all the elements in `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let small: FixedHashSet<i32, 4> = [1, 2].into_iter().collect();
    /// let large: FixedHashSet<i32, 16> = [1, 2, 3].into_iter().collect();
    ///
    /// assert!(small.is_subset(&large));
    /// assert!(large.is_superset(&small));
    /// # }
    /// ```
    pub fn is_subset<const M: usize>(&self, other: &FixedHashSet<T, M, S>) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if `self` contains at least all the elements in `other`.
    pub fn is_superset<const M: usize>(&self, other: &FixedHashSet<T, M, S>) -> bool {
        other.is_subset(self)
    }

    /// Returns the probe length distribution of the stored values.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram(|v| self.hash_builder.hash_one(v))
    }

    /// Returns occupancy and probe statistics for debugging.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats(|v| self.hash_builder.hash_one(v))
    }
}

impl<T, const N: usize, S> FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty set using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use fixed_capacity::FixedHashSet;
    ///
    /// let set: FixedHashSet<i32, 64> = FixedHashSet::new();
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), 64);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, const N: usize, S> Default for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the values of a `FixedHashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A draining iterator over the values of a `FixedHashSet`.
pub struct Drain<'a, T> {
    inner: crate::hash_table::Drain<'a, T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

/// A consuming iterator over the values of a `FixedHashSet`.
pub struct IntoIter<T, const N: usize> {
    inner: crate::hash_table::IntoIter<T, N>,
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T, const N: usize> FusedIterator for IntoIter<T, N> {}

impl<T, const N: usize, S> IntoIterator for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = IntoIter<T, N>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, const N: usize, S> IntoIterator for &'a FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collects values into a new set.
///
/// # Panics
///
/// Panics if the iterator yields more than `N` distinct values.
impl<T, const N: usize, S> FromIterator<T> for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = FixedHashSet::new();
        set.extend(iter);
        set
    }
}

/// Inserts every value from the iterator.
///
/// # Panics
///
/// Panics if a new value arrives while all `N` slots hold live values.
impl<T, const N: usize, S> Extend<T> for FixedHashSet<T, N, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
