use std::collections::TryReserveError;

use bitvec::{order::Lsb0, slice::BitSlice};

const WORD_BITS: usize = u64::BITS as usize;

/// One rank parity bit per arena slot.
///
/// The words are grown through fallible reservation so a failed allocation reaches the caller as
/// an insert error; bit access goes through a `BitSlice` view of them.
#[derive(Clone, Default)]
pub(crate) struct ParityBits {
    words: Vec<u64>,
    len: usize,
}

impl ParityBits {
    pub(crate) const fn new() -> Self {
        ParityBits {
            words: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of slots covered.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn bits(&self) -> &BitSlice<u64, Lsb0> {
        &BitSlice::from_slice(&self.words)[..self.len]
    }

    #[inline]
    fn bits_mut(&mut self) -> &mut BitSlice<u64, Lsb0> {
        let len = self.len;
        &mut BitSlice::from_slice_mut(&mut self.words)[..len]
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> bool {
        self.bits()[slot]
    }

    #[inline]
    pub(crate) fn set(&mut self, slot: usize, parity: bool) {
        self.bits_mut().set(slot, parity);
    }

    /// Extends the set to cover `len` slots. New slots read as `false`.
    pub(crate) fn resize(&mut self, len: usize) -> Result<(), TryReserveError> {
        debug_assert!(len >= self.len, "parity bits never shrink");

        let words = len.div_ceil(WORD_BITS);
        self.words
            .try_reserve_exact(words.saturating_sub(self.words.len()))?;
        self.words.resize(words, 0);
        self.len = len;

        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.bits_mut().fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_independent() {
        let mut bits = ParityBits::new();
        bits.resize(130).unwrap();
        assert_eq!(bits.len(), 130);

        for slot in (0..130).step_by(3) {
            bits.set(slot, true);
        }

        for slot in 0..130 {
            assert_eq!(bits.get(slot), slot % 3 == 0, "slot {slot}");
        }

        bits.set(63, false);
        bits.set(64, true);
        assert!(!bits.get(63));
        assert!(bits.get(64));
        assert!(!bits.get(65));

        // Bits live in word order, least significant first.
        assert_eq!(bits.words[1] & 1, 1);
        assert_eq!(bits.bits().count_ones(), 44);
    }

    #[test]
    fn resize_keeps_existing_bits() {
        let mut bits = ParityBits::new();
        bits.resize(8).unwrap();
        bits.set(0, true);
        bits.set(7, true);

        bits.resize(200).unwrap();
        assert!(bits.get(0));
        assert!(bits.get(7));
        assert!((8..200).all(|slot| !bits.get(slot)));

        bits.clear();
        assert!(!bits.get(0));
        assert_eq!(bits.len(), 200);
        assert_eq!(bits.bits().count_ones(), 0);
    }
}
