/// Default number of leading bytes examined by every detector.
pub const DEFAULT_SAMPLE_CAP: usize = 10_000;

/// Smallest accepted cap, so that a BOM is never split by truncation.
pub const MIN_SAMPLE_CAP: usize = 4;

/// Upper bound on the number of bytes any detector looks at.
///
/// Every heuristic in this crate runs on at most `SampleCap` bytes, which keeps
/// the cost of detection independent of the size of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleCap(usize);

impl Default for SampleCap {
    fn default() -> Self {
        SampleCap(DEFAULT_SAMPLE_CAP)
    }
}

impl SampleCap {
    /// Create a cap of `bytes` bytes, raised to [`MIN_SAMPLE_CAP`] if smaller.
    pub const fn new(bytes: usize) -> Self {
        if bytes < MIN_SAMPLE_CAP {
            SampleCap(MIN_SAMPLE_CAP)
        } else {
            SampleCap(bytes)
        }
    }

    /// Returns the cap in bytes.
    #[inline]
    pub const fn bytes(&self) -> usize {
        self.0
    }

    /// Returns the leading part of `data` that fits under the cap.
    #[inline]
    pub fn truncate<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[..data.len().min(self.0)]
    }
}

impl From<usize> for SampleCap {
    fn from(bytes: usize) -> Self {
        SampleCap::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        let cap = SampleCap::new(5);
        assert_eq!(cap.truncate(b"abcdefgh"), b"abcde");
        assert_eq!(cap.truncate(b"abc"), b"abc");
        assert_eq!(cap.truncate(b""), b"");
    }

    #[test]
    fn test_minimum_cap() {
        assert_eq!(SampleCap::new(0).bytes(), MIN_SAMPLE_CAP);
        assert_eq!(SampleCap::from(2).bytes(), MIN_SAMPLE_CAP);
        assert_eq!(SampleCap::default().bytes(), DEFAULT_SAMPLE_CAP);
    }
}
