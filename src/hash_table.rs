//! A fixed-capacity open-addressing hash table.
//!
//! [`FixedHashTable`] stores values inline in an array of `N` slots and
//! resolves collisions with linear probing. Removal leaves a tombstone behind
//! so that probe chains running through the removed slot stay intact. The
//! table never grows: once every slot holds a live value, inserting a new one
//! fails with a [`CapacityError`].
//!
//! Like a raw hashbrown table, callers provide the hash and an equality
//! predicate for each operation. [`FixedHashSet`](crate::FixedHashSet) is the
//! convenient wrapper that owns a hasher.

use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem;

use crate::error::CapacityError;

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied(V),
    Tombstone,
}

/// Outcome of walking a probe chain for a value.
enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

#[inline(always)]
fn home_bucket<const N: usize>(hash: u64) -> usize {
    (hash % N as u64) as usize
}

#[inline(always)]
fn next_index<const N: usize>(index: usize) -> usize {
    if index + 1 == N { 0 } else { index + 1 }
}

/// Debug statistics for hash table analysis.
///
/// Requires the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live values in the table
    pub populated: usize,
    /// Number of slots holding a tombstone
    pub tombstones: usize,
    /// Number of never-used slots
    pub empty: usize,
    /// Total number of slots (`N`)
    pub capacity: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Share of slots that probes must walk past (populated + tombstones) /
    /// capacity
    pub slot_utilization: f64,
    /// Longest distance between a value's home bucket and its slot
    pub max_probe_length: usize,
    /// Average distance between a value's home bucket and its slot
    pub mean_probe_length: f64,
    /// Size of the table in bytes, all of it inline
    pub total_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Fixed Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} live, {} tombstoned, {} empty ({:.2}% utilization)",
            self.populated,
            self.tombstones,
            self.empty,
            self.slot_utilization * 100.0
        );
        println!(
            "Probe length: max {}, mean {:.2}",
            self.max_probe_length, self.mean_probe_length
        );
        println!("Total Size: {} bytes", self.total_bytes);
    }
}

/// Distribution of probe lengths over the live values of a table.
///
/// Index `d` of [`counts`](ProbeHistogram::counts) is the number of values
/// stored `d` slots past their home bucket.
///
/// Requires the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeHistogram {
    counts: alloc::vec::Vec<usize>,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// Per-distance value counts. Empty when the table is empty.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Longest probe length recorded, or `0` for an empty table.
    pub fn max_probe_length(&self) -> usize {
        self.counts.len().saturating_sub(1)
    }

    /// Number of values covered by the histogram.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (distance, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// A fixed-capacity hash table using linear probing and tombstone deletion.
///
/// `FixedHashTable<V, N>` stores up to `N` values of type `V` in an inline
/// array. The capacity is part of the type and never changes; no operation
/// allocates. Each operation takes the value's hash and an equality
/// predicate, and the home bucket of a value is `hash % N`.
///
/// Removal marks the slot as a tombstone. Lookups walk past tombstones and
/// stop at the first never-used slot. Insertion reuses the first tombstone on
/// the probe chain once the whole chain has been checked for an equal value.
/// Every probe is bounded to `N` steps, so operations always terminate even if
/// no never-used slot is left.
///
/// ## Example
///
/// ```rust
/// use fixed_capacity::hash_table::Entry;
/// use fixed_capacity::hash_table::FixedHashTable;
///
/// // Small integers act as their own hash here.
/// let mut table: FixedHashTable<(u64, &str), 8> = FixedHashTable::new();
///
/// match table.entry(3, |&(k, _)| k == 3) {
///     Entry::Vacant(entry) => {
///         entry.insert((3, "three"));
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(3, |&(k, _)| k == 3), Some(&(3, "three")));
/// assert_eq!(table.remove(3, |&(k, _)| k == 3), Some((3, "three")));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct FixedHashTable<V, const N: usize> {
    slots: [Slot<V>; N],
    populated: usize,
}

impl<V, const N: usize> Debug for FixedHashTable<V, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::string::String;

        let slots = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Empty => '.',
                Slot::Occupied(_) => '#',
                Slot::Tombstone => 'x',
            })
            .collect::<String>();

        f.debug_struct("FixedHashTable")
            .field("populated", &self.populated)
            .field("capacity", &N)
            .field("slots", &slots)
            .finish()
    }
}

impl<V, const N: usize> Default for FixedHashTable<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, const N: usize> FixedHashTable<V, N> {
    /// Creates an empty table with every slot unused.
    ///
    /// A zero capacity is rejected at compile time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let table: FixedHashTable<String, 16> = FixedHashTable::new();
    /// assert_eq!(table.capacity(), 16);
    /// assert!(table.is_empty());
    /// ```
    pub fn new() -> Self {
        const { assert!(N > 0, "a fixed hash table needs at least one slot") };
        Self {
            slots: core::array::from_fn(|_| Slot::Empty),
            populated: 0,
        }
    }

    /// Returns the number of slots, which is also the maximum number of values
    /// the table can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of live values in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no live values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Walks the probe chain for `hash`, remembering the first tombstone so
    /// an insert can reuse it once the value is known to be absent.
    fn probe(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Probe {
        let mut index = home_bucket::<N>(hash);
        let mut first_tombstone = None;

        for _ in 0..N {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(index);
                }
                Slot::Occupied(value) if eq(value) => return Probe::Found(index),
                Slot::Occupied(_) => {}
            }
            index = next_index::<N>(index);
        }

        first_tombstone.map_or(Probe::Full, Probe::Vacant)
    }

    fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        let mut index = home_bucket::<N>(hash);

        for _ in 0..N {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(value) if eq(value) => return Some(index),
                _ => {}
            }
            index = next_index::<N>(index);
        }

        None
    }

    /// Finds a value matching `eq` on the probe chain of `hash`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
    /// table.entry(5, |&v| v == 5).or_insert(5);
    ///
    /// assert_eq!(table.find(5, |&v| v == 5), Some(&5));
    /// assert_eq!(table.find(6, |&v| v == 6), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        match &self.slots[index] {
            Slot::Occupied(value) => Some(value),
            _ => unreachable!("probe returned a dead slot"),
        }
    }

    /// Finds a value matching `eq` and returns a mutable reference to it.
    ///
    /// Changing the parts of the value that feed its hash or equality leaves
    /// it stranded on the wrong probe chain.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        match &mut self.slots[index] {
            Slot::Occupied(value) => Some(value),
            _ => unreachable!("probe returned a dead slot"),
        }
    }

    /// Gets the entry for a value, or a [`CapacityError`] if the value is
    /// absent and every slot is live.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::Entry;
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let mut table: FixedHashTable<u64, 2> = FixedHashTable::new();
    /// table.entry(0, |&v| v == 0).or_insert(0);
    /// table.entry(1, |&v| v == 1).or_insert(1);
    ///
    /// // Present values are still reachable on a full table.
    /// assert!(matches!(table.try_entry(1, |&v| v == 1), Ok(Entry::Occupied(_))));
    /// assert!(table.try_entry(2, |&v| v == 2).is_err());
    /// ```
    pub fn try_entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
    ) -> Result<Entry<'_, V>, CapacityError> {
        let probe = self.probe(hash, eq);
        let Self { slots, populated } = self;
        match probe {
            Probe::Found(index) => Ok(Entry::Occupied(OccupiedEntry {
                slot: &mut slots[index],
                populated,
            })),
            Probe::Vacant(index) => Ok(Entry::Vacant(VacantEntry {
                slot: &mut slots[index],
                populated,
            })),
            Probe::Full => Err(CapacityError::new((), N)),
        }
    }

    /// Gets the entry for a value.
    ///
    /// # Panics
    ///
    /// Panics if the value is absent and all `N` slots hold live values. Use
    /// [`try_entry`](Self::try_entry) to handle that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let mut table: FixedHashTable<(u64, u32), 8> = FixedHashTable::new();
    /// table.entry(7, |&(k, _)| k == 7).or_insert((7, 0)).1 += 1;
    /// table.entry(7, |&(k, _)| k == 7).or_insert((7, 0)).1 += 1;
    ///
    /// assert_eq!(table.find(7, |&(k, _)| k == 7), Some(&(7, 2)));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.try_entry(hash, eq) {
            Ok(entry) => entry,
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes a value matching `eq`, leaving a tombstone in its slot.
    ///
    /// Returns the removed value, or `None` if no live value matched.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        match mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied(value) => {
                self.populated -= 1;
                Some(value)
            }
            _ => unreachable!("probe returned a dead slot"),
        }
    }

    /// Removes every value for which `pred` returns `true`, returning how many
    /// were removed.
    ///
    /// Slots are visited once, in index order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
    /// for v in 0..6 {
    ///     table.entry(v, |&x| x == v).or_insert(v);
    /// }
    ///
    /// assert_eq!(table.erase_if(|&v| v % 2 == 0), 3);
    /// assert_eq!(table.len(), 3);
    /// ```
    pub fn erase_if(&mut self, mut pred: impl FnMut(&V) -> bool) -> usize {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if matches!(slot, Slot::Occupied(value) if pred(&*value)) {
                // Count as we go so a panicking predicate leaves `len` exact.
                *slot = Slot::Tombstone;
                self.populated -= 1;
                removed += 1;
            }
        }
        removed
    }

    /// Retains only the values for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&V) -> bool) {
        self.erase_if(|value| !f(value));
    }

    /// Removes all values and tombstones, returning every slot to its unused
    /// state.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.populated = 0;
    }

    /// Returns an iterator over the live values in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fixed_capacity::hash_table::FixedHashTable;
    /// #
    /// let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
    /// for v in [6, 2, 4] {
    ///     table.entry(v, |&x| x == v).or_insert(v);
    /// }
    ///
    /// let values: Vec<u64> = table.iter().copied().collect();
    /// assert_eq!(values, [2, 4, 6]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: &self.slots,
            index: 0,
            remaining: self.populated,
        }
    }

    /// Returns an iterator that removes and yields all values in slot order.
    ///
    /// Once the iterator is dropped, every slot is unused again, tombstones
    /// included, whether or not it was run to completion.
    pub fn drain(&mut self) -> Drain<'_, V> {
        let Self { slots, populated } = self;
        Drain {
            slots: slots.iter_mut(),
            populated,
        }
    }

    /// Returns the probe length distribution of the live values.
    ///
    /// `hasher` must produce the same hashes that were used to insert the
    /// values.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self, hasher: impl Fn(&V) -> u64) -> ProbeHistogram {
        let mut counts = alloc::vec::Vec::new();

        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(value) = slot {
                let home = home_bucket::<N>(hasher(value));
                let distance = if index >= home {
                    index - home
                } else {
                    index + N - home
                };

                if counts.len() <= distance {
                    counts.resize(distance + 1, 0);
                }
                counts[distance] += 1;
            }
        }

        ProbeHistogram { counts }
    }

    /// Returns occupancy and probe statistics for debugging.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self, hasher: impl Fn(&V) -> u64) -> DebugStats {
        let tombstones = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count();
        let histogram = self.probe_histogram(hasher);
        let total_distance = histogram
            .counts()
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum::<usize>();

        DebugStats {
            populated: self.populated,
            tombstones,
            empty: N - self.populated - tombstones,
            capacity: N,
            load_factor: self.populated as f64 / N as f64,
            slot_utilization: (self.populated + tombstones) as f64 / N as f64,
            max_probe_length: histogram.max_probe_length(),
            mean_probe_length: if self.populated == 0 {
                0.0
            } else {
                total_distance as f64 / self.populated as f64
            },
            total_bytes: mem::size_of::<Self>(),
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from [`FixedHashTable::entry`] and
/// [`FixedHashTable::try_entry`].
pub enum Entry<'a, V> {
    /// A vacant entry - the value is not present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - the value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value.
    ///
    /// Returns the modified value, or `None` if the entry was vacant.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant slot. The slot is either unused or a reclaimed
/// tombstone.
pub struct VacantEntry<'a, V> {
    slot: &'a mut Slot<V>,
    populated: &'a mut usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Stores `value` in the slot and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        *self.slot = Slot::Occupied(value);
        *self.populated += 1;
        match self.slot {
            Slot::Occupied(value) => value,
            _ => unreachable!("vacant entry was just filled"),
        }
    }
}

/// A view into a slot holding a live value.
pub struct OccupiedEntry<'a, V> {
    slot: &'a mut Slot<V>,
    populated: &'a mut usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Returns a reference to the value in the entry.
    pub fn get(&self) -> &V {
        match &*self.slot {
            Slot::Occupied(value) => value,
            _ => unreachable!("occupied entry over a dead slot"),
        }
    }

    /// Returns a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        match &mut *self.slot {
            Slot::Occupied(value) => value,
            _ => unreachable!("occupied entry over a dead slot"),
        }
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// lifetime.
    pub fn into_mut(self) -> &'a mut V {
        match self.slot {
            Slot::Occupied(value) => value,
            _ => unreachable!("occupied entry over a dead slot"),
        }
    }

    /// Removes the value, leaving a tombstone, and returns it.
    pub fn remove(self) -> V {
        match mem::replace(self.slot, Slot::Tombstone) {
            Slot::Occupied(value) => {
                *self.populated -= 1;
                value
            }
            _ => unreachable!("occupied entry over a dead slot"),
        }
    }
}

/// An iterator over the live values of a [`FixedHashTable`], in slot order.
///
/// Created by [`FixedHashTable::iter`]. Each call to `iter` starts again from
/// the first slot.
pub struct Iter<'a, V> {
    slots: &'a [Slot<V>],
    index: usize,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let slots = self.slots;
        while self.index < slots.len() {
            let slot = &slots[self.index];
            self.index += 1;
            if let Slot::Occupied(value) = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// A draining iterator over the values of a [`FixedHashTable`].
///
/// Created by [`FixedHashTable::drain`].
pub struct Drain<'a, V> {
    slots: core::slice::IterMut<'a, Slot<V>>,
    populated: &'a mut usize,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(value) = mem::replace(slot, Slot::Empty) {
                *self.populated -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (*self.populated, Some(*self.populated))
    }
}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}

impl<V> FusedIterator for Drain<'_, V> {}

/// A consuming iterator over the values of a [`FixedHashTable`].
pub struct IntoIter<V, const N: usize> {
    inner: core::array::IntoIter<Slot<V>, N>,
    remaining: usize,
}

impl<V, const N: usize> Iterator for IntoIter<V, N> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.inner.by_ref() {
            if let Slot::Occupied(value) = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, const N: usize> ExactSizeIterator for IntoIter<V, N> {}

impl<V, const N: usize> FusedIterator for IntoIter<V, N> {}

impl<V, const N: usize> IntoIterator for FixedHashTable<V, N> {
    type IntoIter = IntoIter<V, N>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        let Self { slots, populated } = self;
        IntoIter {
            inner: slots.into_iter(),
            remaining: populated,
        }
    }
}

impl<'a, V, const N: usize> IntoIterator for &'a FixedHashTable<V, N> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    /// Inserts `key` using the key itself as the hash, so tests control the
    /// home bucket directly.
    fn put<const N: usize>(table: &mut FixedHashTable<u64, N>, key: u64) -> bool {
        match table.entry(key, |&v| v == key) {
            Entry::Vacant(entry) => {
                entry.insert(key);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    fn slot_map<V, const N: usize>(table: &FixedHashTable<V, N>) -> String {
        alloc::format!("{:?}", table)
            .split("slots: \"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string()
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: FixedHashTable<Item, 64> = FixedHashTable::new();
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            match table.entry(hash, |v: &Item| v.key == k) {
                Entry::Vacant(v) => {
                    v.insert(Item {
                        key: k,
                        value: (k as i32) * 2,
                    });
                }
                Entry::Occupied(_) => panic!("unexpected occupied on first insert: {:#?}", table),
            }
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let mut table: FixedHashTable<Item, 8> = FixedHashTable::new();

        match table.entry(42, |v| v.key == 42) {
            Entry::Vacant(v) => {
                v.insert(Item { key: 42, value: 7 });
            }
            Entry::Occupied(_) => panic!("should be vacant first time"),
        }

        match table.entry(42, |v| v.key == 42) {
            Entry::Occupied(mut occ) => {
                assert_eq!(occ.get().value, 7);
                occ.get_mut().value = 11;
            }
            Entry::Vacant(_) => panic!("should be occupied: {:#?}", table),
        }

        assert_eq!(table.len(), 1);
        assert_eq!(table.find(42, |v| v.key == 42).unwrap().value, 11);
    }

    #[test]
    fn find_mut_and_modify() {
        let mut table: FixedHashTable<Item, 8> = FixedHashTable::new();
        for k in 0..5u64 {
            table
                .entry(k, |v| v.key == k)
                .or_insert(Item { key: k, value: 1 });
        }

        for k in 0..5u64 {
            if let Some(v) = table.find_mut(k, |v| v.key == k) {
                v.value += 9;
            }
        }
        for k in 0..5u64 {
            assert_eq!(table.find(k, |v| v.key == k).unwrap().value, 10);
        }
        assert!(table.find_mut(6, |v| v.key == 6).is_none());
    }

    #[test]
    fn colliding_values_probe_linearly() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        assert!(put(&mut table, 1));
        assert!(put(&mut table, 9));
        assert!(put(&mut table, 17));

        assert_eq!(slot_map(&table), ".###....");
        for k in [1, 9, 17] {
            assert_eq!(table.find(k, |&v| v == k), Some(&k));
        }
    }

    #[test]
    fn probe_wraps_around() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        assert!(put(&mut table, 7));
        assert!(put(&mut table, 15));
        assert!(put(&mut table, 23));

        assert_eq!(slot_map(&table), "##.....#");
        assert_eq!(table.find(23, |&v| v == 23), Some(&23));
        assert_eq!(table.remove(15, |&v| v == 15), Some(15));
        assert_eq!(table.find(23, |&v| v == 23), Some(&23));
    }

    #[test]
    fn remove_keeps_chain_intact() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16] {
            assert!(put(&mut table, k));
        }

        assert_eq!(table.remove(8, |&v| v == 8), Some(8));
        assert_eq!(slot_map(&table), "#x#.....");
        assert_eq!(table.len(), 2);

        assert_eq!(table.find(16, |&v| v == 16), Some(&16));
        assert_eq!(table.find(8, |&v| v == 8), None);
        assert_eq!(table.remove(8, |&v| v == 8), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_behind_tombstone_is_found() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16] {
            assert!(put(&mut table, k));
        }
        table.remove(0, |&v| v == 0);

        // 16 lives past the tombstone and must not be inserted a second time.
        assert!(!put(&mut table, 16));
        assert_eq!(table.len(), 2);
        assert_eq!(slot_map(&table), "x##.....");
    }

    #[test]
    fn insert_reclaims_first_tombstone() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16] {
            assert!(put(&mut table, k));
        }
        table.remove(0, |&v| v == 0);
        table.remove(8, |&v| v == 8);
        assert_eq!(slot_map(&table), "xx#.....");

        assert!(put(&mut table, 24));
        assert_eq!(slot_map(&table), "#x#.....");
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), [24, 16]);
    }

    #[test]
    fn full_table_reports_capacity_error() {
        let mut table: FixedHashTable<u64, 4> = FixedHashTable::new();
        for k in 0..4 {
            assert!(put(&mut table, k));
        }
        assert_eq!(table.len(), table.capacity());

        let err = table.try_entry(4, |&v| v == 4).err().unwrap();
        assert_eq!(err.capacity(), 4);

        assert!(matches!(
            table.try_entry(2, |&v| v == 2),
            Ok(Entry::Occupied(_))
        ));
        assert_eq!(table.find(4, |&v| v == 4), None);
        assert_eq!(table.remove(4, |&v| v == 4), None);
    }

    #[test]
    #[should_panic(expected = "insufficient capacity")]
    fn entry_panics_when_full() {
        let mut table: FixedHashTable<u64, 2> = FixedHashTable::new();
        put(&mut table, 0);
        put(&mut table, 1);
        put(&mut table, 2);
    }

    #[test]
    fn lookups_terminate_without_empty_slots() {
        let mut table: FixedHashTable<u64, 4> = FixedHashTable::new();
        for k in 0..4 {
            put(&mut table, k);
        }
        for k in 0..4 {
            table.remove(k, |&v| v == k);
        }
        assert_eq!(slot_map(&table), "xxxx");

        assert_eq!(table.find(3, |&v| v == 3), None);
        assert_eq!(table.remove(3, |&v| v == 3), None);
        assert!(put(&mut table, 6));
        assert_eq!(slot_map(&table), "xx#x");
    }

    #[test]
    fn churn_never_saturates() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for round in 0..1000u64 {
            for k in 0..6 {
                assert!(put(&mut table, round * 6 + k));
            }
            for k in 0..6 {
                let key = round * 6 + k;
                assert_eq!(table.remove(key, |&v| v == key), Some(key));
            }
        }
        assert!(table.is_empty());
    }

    #[test]
    fn erase_if_tombstones_matches() {
        let mut table: FixedHashTable<u64, 16> = FixedHashTable::new();
        for k in 0..10 {
            put(&mut table, k);
        }

        let mut visited = Vec::new();
        let removed = table.erase_if(|&v| {
            visited.push(v);
            v % 3 == 0
        });

        assert_eq!(removed, 4);
        assert_eq!(visited, (0..10).collect::<Vec<_>>());
        assert_eq!(table.len(), 6);
        assert_eq!(slot_map(&table), "x##x##x##x......");
        assert_eq!(table.erase_if(|&v| v % 3 == 0), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn erase_if_panic_keeps_len_consistent() {
        use std::panic::AssertUnwindSafe;
        use std::panic::catch_unwind;

        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in 0..6 {
            put(&mut table, k);
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            table.erase_if(|&v| {
                assert_ne!(v, 4, "predicate failed");
                v < 4
            })
        }));
        assert!(result.is_err());

        assert_eq!(slot_map(&table), "xxxx##..");
        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().len(), table.iter().count());
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), [4, 5]);

        #[cfg(feature = "stats")]
        {
            let stats = table.debug_stats(|&v| v);
            assert_eq!(stats.tombstones, 4);
            assert_eq!(stats.empty, 2);
        }
    }

    #[test]
    fn retain_keeps_matches() {
        let mut table: FixedHashTable<u64, 16> = FixedHashTable::new();
        for k in 0..10 {
            put(&mut table, k);
        }
        table.retain(|&v| v < 4);
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), [0, 1, 2, 3]);
    }

    #[test]
    fn clear_discards_tombstones() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16] {
            put(&mut table, k);
        }
        table.remove(8, |&v| v == 8);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(slot_map(&table), "........");
        for k in [0, 8, 16] {
            assert_eq!(table.find(k, |&v| v == k), None);
        }

        assert!(put(&mut table, 16));
        assert_eq!(slot_map(&table), "#.......");
    }

    #[test]
    fn iter_skips_dead_slots() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [5, 1, 3, 7] {
            put(&mut table, k);
        }
        table.remove(3, |&v| v == 3);

        let iter = table.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.clone().copied().collect::<Vec<_>>(), [1, 5, 7]);
        assert_eq!(iter.copied().collect::<Vec<_>>(), [1, 5, 7]);
        assert_eq!((&table).into_iter().count(), 3);
    }

    #[test]
    fn drain_empties_every_slot() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16, 3] {
            put(&mut table, k);
        }
        table.remove(8, |&v| v == 8);

        let drained: Vec<u64> = table.drain().collect();
        assert_eq!(drained, [0, 16, 3]);
        assert!(table.is_empty());
        assert_eq!(slot_map(&table), "........");
    }

    #[test]
    fn dropped_drain_still_clears() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in 0..5 {
            put(&mut table, k);
        }

        let mut drain = table.drain();
        assert_eq!(drain.len(), 5);
        assert_eq!(drain.next(), Some(0));
        drop(drain);

        assert!(table.is_empty());
        assert_eq!(slot_map(&table), "........");
    }

    #[test]
    fn into_iter_yields_owned_values() {
        let mut table: FixedHashTable<String, 8> = FixedHashTable::new();
        for (hash, s) in [(2, "b"), (0, "a")] {
            table
                .entry(hash, |v| v == s)
                .or_insert_with(|| s.to_string());
        }

        let values: Vec<String> = table.into_iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn clone_copies_tombstones() {
        let mut original: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16] {
            put(&mut original, k);
        }
        original.remove(8, |&v| v == 8);

        let mut cloned = original.clone();
        assert_eq!(slot_map(&cloned), slot_map(&original));
        assert_eq!(cloned.len(), original.len());

        cloned.remove(16, |&v| v == 16);
        put(&mut cloned, 1);
        assert_eq!(original.find(16, |&v| v == 16), Some(&16));
        assert_eq!(original.find(1, |&v| v == 1), None);
        assert_eq!(original.len(), 2);
    }

    #[test]
    fn values_are_dropped_once() {
        let tracker = Rc::new(());
        let mut table: FixedHashTable<(u64, Rc<()>), 8> = FixedHashTable::new();
        for k in 0..6 {
            table
                .entry(k, |(v, _)| *v == k)
                .or_insert((k, Rc::clone(&tracker)));
        }
        assert_eq!(Rc::strong_count(&tracker), 7);

        table.remove(0, |(v, _)| *v == 0);
        assert_eq!(Rc::strong_count(&tracker), 6);

        table.erase_if(|(v, _)| *v < 3);
        assert_eq!(Rc::strong_count(&tracker), 4);

        let cloned = table.clone();
        assert_eq!(Rc::strong_count(&tracker), 7);
        drop(cloned);

        table.clear();
        assert_eq!(Rc::strong_count(&tracker), 1);

        for k in 0..3 {
            table
                .entry(k, |(v, _)| *v == k)
                .or_insert((k, Rc::clone(&tracker)));
        }
        drop(table);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn entry_helpers() {
        let mut table: FixedHashTable<(u64, u32), 8> = FixedHashTable::new();

        assert!(table.entry(1, |&(k, _)| k == 1).and_modify(|_| {}).is_none());
        *table.entry(1, |&(k, _)| k == 1).or_default() = (1, 5);
        let value = table
            .entry(1, |&(k, _)| k == 1)
            .and_modify(|(_, v)| *v *= 2)
            .unwrap();
        assert_eq!(*value, (1, 10));

        match table.entry(1, |&(k, _)| k == 1) {
            Entry::Occupied(entry) => assert_eq!(entry.remove(), (1, 10)),
            Entry::Vacant(_) => panic!("should be occupied: {:#?}", table),
        }
        assert!(table.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_remove_random_keys() {
        let state = HashState::default();
        let mut table: FixedHashTable<Item, 1024> = FixedHashTable::new();

        for k in 0..700u64 {
            let hash = hash_key(&state, k);
            table.entry(hash, |v| v.key == k).or_insert(Item {
                key: k,
                value: k as i32,
            });
        }
        assert_eq!(table.len(), 700);

        for k in (0..700u64).step_by(2) {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.remove(hash, |v| v.key == k).map(|v| v.key),
                Some(k),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 350);

        for k in 0..700u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).is_some(), k % 2 == 1);
        }
    }

    #[cfg(feature = "stats")]
    #[test]
    fn stats_report_probe_lengths() {
        let mut table: FixedHashTable<u64, 8> = FixedHashTable::new();
        for k in [0, 8, 16, 5] {
            put(&mut table, k);
        }
        table.remove(8, |&v| v == 8);

        let histogram = table.probe_histogram(|&v| v);
        assert_eq!(histogram.counts(), [2, 0, 1]);
        assert_eq!(histogram.max_probe_length(), 2);
        assert_eq!(histogram.total(), 3);

        let stats = table.debug_stats(|&v| v);
        assert_eq!(stats.populated, 3);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.empty, 4);
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.max_probe_length, 2);
        assert!((stats.mean_probe_length - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.slot_utilization - 0.5).abs() < 1e-9);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn stats_on_empty_table() {
        let table: FixedHashTable<u64, 8> = FixedHashTable::new();
        assert!(table.probe_histogram(|&v| v).counts().is_empty());
        let stats = table.debug_stats(|&v| v);
        assert_eq!(stats.mean_probe_length, 0.0);
        assert_eq!(stats.empty, 8);
    }
}
