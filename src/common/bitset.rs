/// A fixed-size set of bits, `64 * N_64` wide.
pub struct BitSet<const N_64: usize> {
    blocks: [u64; N_64],
}

impl<const N_64: usize> BitSet<N_64> {
    pub fn new() -> Self {
        BitSet { blocks: [0; N_64] }
    }

    #[inline]
    fn bit_location(bit: usize) -> (usize, u64) {
        (
            bit >> 6,        // divide by 64
            1 << (bit & 63), // modulo 64
        )
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| *b == 0)
    }

    #[inline]
    pub fn contains(&self, bit: usize) -> bool {
        let (index, mask) = Self::bit_location(bit);
        self.blocks[index] & mask != 0
    }

    #[inline]
    pub fn set(&mut self, bit: usize) {
        let (index, mask) = Self::bit_location(bit);
        self.blocks[index] |= mask;
    }

    #[inline]
    pub fn clear(&mut self, bit: usize) {
        let (index, mask) = Self::bit_location(bit);
        self.blocks[index] &= !mask;
    }

    /// Clears every bit.
    #[inline]
    pub fn clear_all(&mut self) {
        self.blocks = [0; N_64];
    }

    #[inline]
    pub fn iter(&self) -> BitSetIter<'_, N_64> {
        BitSetIter::new(&self.blocks)
    }
}

impl<const N_64: usize> Default for BitSet<N_64> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterates over the set bits in ascending order.
pub struct BitSetIter<'a, const N_64: usize> {
    block_index: usize,
    block_val: u64,
    blocks: &'a [u64; N_64],
}

impl<'a, const N_64: usize> BitSetIter<'a, N_64> {
    fn new(blocks: &'a [u64; N_64]) -> BitSetIter<'a, N_64> {
        BitSetIter {
            block_index: 0,
            block_val: blocks.first().copied().unwrap_or(0),
            blocks,
        }
    }
}

impl<'a, const N_64: usize> Iterator for BitSetIter<'a, N_64> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.block_index < N_64 {
            if self.block_val != 0 {
                let next_bit = self.block_val.trailing_zeros();
                self.block_val &= !(1 << next_bit);
                return Some(64 * self.block_index + next_bit as usize);
            }

            self.block_index += 1;
            self.block_val = *self.blocks.get(self.block_index)?;
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut bits: BitSet<2> = BitSet::new();

        for case in [0, 1, 63, 64, 127].iter().copied() {
            bits.set(case);
            assert!(bits.contains(case));
        }
        assert_eq!(bits.count(), 5);

        bits.clear(63);
        assert!(!bits.contains(63));
        assert_eq!(bits.count(), 4);

        bits.clear_all();
        assert!(bits.is_empty());
    }

    #[test]
    fn test_iter_ascending() {
        let mut bits: BitSet<8> = BitSet::new();

        let cases = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377];
        for case in cases.iter().rev().copied() {
            bits.set(case);
        }

        let back = bits.iter().collect::<Vec<_>>();
        assert_eq!(&cases[..], &back[..]);
    }
}
