use std::collections::VecDeque;

/// Keeps the last `cap` bytes pushed into it.
pub struct RingBytes {
    inner: VecDeque<u8>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(cap.min(64 * 1024)),
            cap,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = self
            .inner
            .len()
            .saturating_add(data.len())
            .saturating_sub(self.cap);
        if overflow > 0 {
            self.inner.drain(..overflow);
        }
        self.inner.extend(data);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Contents as (lossy) UTF-8. A multi-byte character cut at the start of
    /// the window becomes U+FFFD.
    pub fn to_lossy_string(&self) -> String {
        let (a, b) = self.inner.as_slices();
        let mut bytes = Vec::with_capacity(a.len() + b.len());
        bytes.extend_from_slice(a);
        bytes.extend_from_slice(b);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
