//! Linear memory backing for instances.

use crate::error::{Error, InstantiationError};
use crate::WASM_PAGE_SIZE;
use vessel_module::HeapSpec;

/// An instance's linear memory region.
///
/// Allocated at the image's declared initial size and growable in guest-page
/// increments up to the declared maximum. Each instance's heap is
/// exclusively owned by that instance; no instance may reference another's
/// memory.
pub struct Heap {
    bytes: Vec<u8>,
    max_size: Option<u64>,
}

impl Heap {
    pub fn new(spec: &HeapSpec) -> Result<Self, Error> {
        if spec.initial_size % u64::from(WASM_PAGE_SIZE) != 0 {
            return Err(Error::InvalidArgument(
                "heap initial size must be a multiple of the guest page size",
            ));
        }
        if let Some(max_size) = spec.max_size {
            if spec.initial_size > max_size {
                return Err(InstantiationError::MemoryLimitExceeded(format!(
                    "initial size {} exceeds declared max {}",
                    spec.initial_size, max_size
                ))
                .into());
            }
        }
        Ok(Heap {
            bytes: vec![0; spec.initial_size as usize],
            max_size: spec.max_size,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_pages(&self) -> u32 {
        (self.bytes.len() / WASM_PAGE_SIZE as usize) as u32
    }

    /// Grow the heap by `additional_pages` guest pages, returning the
    /// previous size in pages.
    pub fn grow(&mut self, additional_pages: u32) -> Result<u32, Error> {
        let old_pages = self.size_pages();
        let new_size =
            self.bytes.len() as u64 + u64::from(additional_pages) * u64::from(WASM_PAGE_SIZE);
        if let Some(max_size) = self.max_size {
            if new_size > max_size {
                return Err(InstantiationError::MemoryLimitExceeded(format!(
                    "grow to {} bytes exceeds declared max {}",
                    new_size, max_size
                ))
                .into());
            }
        }
        self.bytes.resize(new_size as usize, 0);
        Ok(old_pages)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub(crate) fn base_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_within_max() {
        let mut heap = Heap::new(&HeapSpec::new(
            u64::from(WASM_PAGE_SIZE),
            Some(u64::from(WASM_PAGE_SIZE) * 3),
        ))
        .expect("heap allocates");
        assert_eq!(heap.size_pages(), 1);
        assert_eq!(heap.grow(2).expect("grow succeeds"), 1);
        assert_eq!(heap.size_pages(), 3);
    }

    #[test]
    fn grow_beyond_max_fails() {
        let mut heap = Heap::new(&HeapSpec::new(
            u64::from(WASM_PAGE_SIZE),
            Some(u64::from(WASM_PAGE_SIZE)),
        ))
        .expect("heap allocates");
        assert!(heap.grow(1).is_err());
        // a failed grow leaves the heap untouched
        assert_eq!(heap.size_pages(), 1);
    }

    #[test]
    fn initial_beyond_max_fails() {
        assert!(Heap::new(&HeapSpec::new(
            u64::from(WASM_PAGE_SIZE) * 2,
            Some(u64::from(WASM_PAGE_SIZE)),
        ))
        .is_err());
    }

    #[test]
    fn unbounded_heap_grows() {
        let mut heap = Heap::new(&HeapSpec::empty()).expect("heap allocates");
        assert_eq!(heap.size(), 0);
        assert_eq!(heap.grow(4).expect("grow succeeds"), 0);
        assert_eq!(heap.size_pages(), 4);
    }
}
