use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem::MaybeUninit;

/// A fixed-capacity FIFO ring buffer that overwrites its oldest element when
/// full.
///
/// `FixedQueue<T, N>` keeps up to `N` elements inline. Pushing onto a full
/// queue evicts the oldest element and returns it, so the queue always holds
/// the `N` most recent pushes. Useful as a history buffer on paths that must
/// not allocate.
///
/// # Examples
///
/// ```rust
/// use fixed_capacity::FixedQueue;
///
/// let mut queue: FixedQueue<u32, 3> = FixedQueue::new();
/// assert_eq!(queue.push(1), None);
/// assert_eq!(queue.push(2), None);
/// assert_eq!(queue.push(3), None);
///
/// // Full: the oldest element makes room.
/// assert_eq!(queue.push(4), Some(1));
///
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.iter().copied().collect::<Vec<_>>(), [3, 4]);
/// ```
pub struct FixedQueue<T, const N: usize> {
    buf: [MaybeUninit<T>; N],
    head: usize,
    len: usize,
}

impl<T, const N: usize> FixedQueue<T, N> {
    /// Creates an empty queue.
    ///
    /// A zero capacity is rejected at compile time.
    pub const fn new() -> Self {
        const { assert!(N > 0, "a fixed queue needs at least one slot") };
        Self {
            buf: [const { MaybeUninit::uninit() }; N],
            head: 0,
            len: 0,
        }
    }

    /// Returns the maximum number of elements the queue holds.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of elements in the queue.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the next push will evict the oldest element.
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    #[inline(always)]
    fn wrap(index: usize) -> usize {
        if index >= N { index - N } else { index }
    }

    /// Appends `value` as the newest element.
    ///
    /// If the queue is full, the oldest element is removed to make room and
    /// returned.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.len == N {
            let slot = &mut self.buf[self.head];
            // SAFETY: The queue is full, so every slot, including `head`,
            // holds an initialized element. We move it out before writing the
            // replacement so it is never dropped in place.
            let evicted = unsafe { slot.assume_init_read() };
            slot.write(value);
            self.head = Self::wrap(self.head + 1);
            Some(evicted)
        } else {
            let tail = Self::wrap(self.head + self.len);
            self.buf[tail].write(value);
            self.len += 1;
            None
        }
    }

    /// Removes and returns the oldest element, or `None` if the queue is
    /// empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        // SAFETY: The queue is non-empty, so `head` holds an initialized
        // element. Advancing `head` and shrinking `len` marks the slot as
        // uninitialized again, so the value is read out exactly once.
        let value = unsafe { self.buf[self.head].assume_init_read() };
        self.head = Self::wrap(self.head + 1);
        self.len -= 1;
        Some(value)
    }

    /// Returns a reference to the oldest element.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the newest element.
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns the element `index` positions after the oldest one.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        // SAFETY: `index < len`, so the wrapped slot lies within the live
        // region and is initialized.
        Some(unsafe { self.buf[Self::wrap(self.head + index)].assume_init_ref() })
    }

    /// Returns the live elements as two slices, oldest first.
    ///
    /// The second slice is non-empty only when the live region wraps around
    /// the end of the buffer.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let first_len = self.len.min(N - self.head);
        let second_len = self.len - first_len;

        // SAFETY: The live region is `head..head + first_len` followed by
        // `0..second_len`, both in bounds and fully initialized.
        // `MaybeUninit<T>` has the same layout as `T`.
        unsafe {
            let base = self.buf.as_ptr().cast::<T>();
            (
                core::slice::from_raw_parts(base.add(self.head), first_len),
                core::slice::from_raw_parts(base, second_len),
            )
        }
    }

    fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let first_len = self.len.min(N - self.head);
        let second_len = self.len - first_len;

        // SAFETY: Same region as `as_slices`. The two ranges never overlap
        // because `first_len + second_len <= N`.
        unsafe {
            let base = self.buf.as_mut_ptr().cast::<T>();
            (
                core::slice::from_raw_parts_mut(base.add(self.head), first_len),
                core::slice::from_raw_parts_mut(base, second_len),
            )
        }
    }

    /// Returns an iterator from the oldest to the newest element.
    pub fn iter(&self) -> Iter<'_, T> {
        let (first, second) = self.as_slices();
        Iter {
            inner: first.iter().chain(second.iter()),
        }
    }

    /// Removes and drops every element.
    pub fn clear(&mut self) {
        let (first, second) = self.as_mut_slices();
        let first: *mut [T] = first;
        let second: *mut [T] = second;

        // Reset first so a panicking destructor cannot cause a double drop.
        self.head = 0;
        self.len = 0;

        // SAFETY: Both slices covered initialized elements that are no longer
        // tracked as live, so each is dropped exactly once.
        unsafe {
            core::ptr::drop_in_place(first);
            core::ptr::drop_in_place(second);
        }
    }
}

impl<T, const N: usize> Drop for FixedQueue<T, N> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<T>() {
            self.clear();
        }
    }
}

impl<T, const N: usize> Default for FixedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize> Clone for FixedQueue<T, N> {
    fn clone(&self) -> Self {
        let mut queue = Self::new();
        for value in self.iter() {
            queue.push(value.clone());
        }
        queue
    }
}

impl<T: Debug, const N: usize> Debug for FixedQueue<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Pushes every value, evicting the oldest elements as needed.
impl<T, const N: usize> Extend<T> for FixedQueue<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

/// Collects the last `N` values of the iterator.
impl<T, const N: usize> FromIterator<T> for FixedQueue<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

/// An iterator over the elements of a `FixedQueue`, oldest first.
#[derive(Clone)]
pub struct Iter<'a, T> {
    inner: core::iter::Chain<core::slice::Iter<'a, T>, core::slice::Iter<'a, T>>,
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

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T, const N: usize> IntoIterator for &'a FixedQueue<T, N> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
