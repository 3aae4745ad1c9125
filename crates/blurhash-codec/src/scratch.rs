//! Growable scratch storage reused across encode/decode calls.

/// A buffer whose logical length is set per call while its allocation only
/// ever grows.
///
/// Shrinking keeps the allocation, so a later request up to the previous
/// high-water mark is served without reallocating. Contents left over from
/// an earlier call are not cleared; callers overwrite what they read.
#[derive(Debug, Clone, Default)]
pub struct ScratchBuf<T> {
    buf: Vec<T>,
}

impl<T: Copy + Default> ScratchBuf<T> {
    /// Create an empty buffer. No allocation happens until the first
    /// [`grow_to`](Self::grow_to).
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Set the logical length to `len` and return the buffer as a slice.
    pub fn grow_to(&mut self, len: usize) -> &mut [T] {
        if len > self.buf.capacity() {
            tracing::trace!(
                from = self.buf.capacity(),
                to = len,
                "growing scratch buffer"
            );
        }
        self.buf.resize(len, T::default());
        &mut self.buf
    }

    /// The current logical contents.
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    /// Logical length set by the last [`grow_to`](Self::grow_to).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of elements the buffer holds without reallocating.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}
