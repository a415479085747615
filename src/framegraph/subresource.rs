
//! Bitmask over an image's (array-layer x mip-level) space, used to identify the subresources
//! an active resource usage touches.

use ash::vk;

const INLINE_BITS: u32 = 128;

#[derive(Debug, Clone)]
enum MaskBits {
    Inline(u128),
    Heap(Vec<u64>),
}

/// A bit per (layer, level) pair of one texture.
///
/// Small textures (`layer_count * level_count <= 128`) store their bits inline in a `u128`;
/// larger ones fall back to a heap-allocated bit vector.
#[derive(Debug, Clone)]
pub struct SubresourceMask {
    layer_count: u32,
    level_count: u32,
    bits: MaskBits,
}

impl SubresourceMask {

    pub fn empty(layer_count: u32, level_count: u32) -> SubresourceMask {

        let capacity = layer_count * level_count;

        let bits = if capacity <= INLINE_BITS {
            MaskBits::Inline(0)
        } else {
            let words = ((capacity + 63) / 64) as usize;
            MaskBits::Heap(vec![0u64; words])
        };

        SubresourceMask { layer_count, level_count, bits }
    }

    pub fn full(layer_count: u32, level_count: u32) -> SubresourceMask {

        let mut mask = SubresourceMask::empty(layer_count, level_count);
        mask.set_range(0, layer_count, 0, level_count);
        mask
    }

    pub fn single(layer_count: u32, level_count: u32, layer: u32, level: u32) -> SubresourceMask {

        let mut mask = SubresourceMask::empty(layer_count, level_count);
        mask.set_range(layer, 1, level, 1);
        mask
    }

    pub fn from_vk_range(layer_count: u32, level_count: u32, range: vk::ImageSubresourceRange) -> SubresourceMask {

        let mut mask = SubresourceMask::empty(layer_count, level_count);
        mask.set_range(range.base_array_layer, range.layer_count, range.base_mip_level, range.level_count);
        mask
    }

    fn index(&self, layer: u32, level: u32) -> u32 {
        layer * self.level_count + level
    }

    fn get(&self, layer: u32, level: u32) -> bool {

        let idx = self.index(layer, level);
        match &self.bits {
            MaskBits::Inline(bits) => (bits >> idx) & 1 == 1,
            MaskBits::Heap(words)  => (words[(idx / 64) as usize] >> (idx % 64)) & 1 == 1,
        }
    }

    fn set(&mut self, layer: u32, level: u32, value: bool) {

        let idx = self.index(layer, level);
        match &mut self.bits {
            MaskBits::Inline(bits) => {
                if value { *bits |= 1u128 << idx; } else { *bits &= !(1u128 << idx); }
            },
            MaskBits::Heap(words) => {
                let word = &mut words[(idx / 64) as usize];
                if value { *word |= 1u64 << (idx % 64); } else { *word &= !(1u64 << (idx % 64)); }
            },
        }
    }

    fn set_range(&mut self, base_layer: u32, layer_count: u32, base_level: u32, level_count: u32) {

        for layer in base_layer..(base_layer + layer_count) {
            for level in base_level..(base_level + level_count) {
                self.set(layer, level, true);
            }
        }
    }

    pub fn is_empty(&self) -> bool {

        match &self.bits {
            MaskBits::Inline(bits) => *bits == 0,
            MaskBits::Heap(words)  => words.iter().all(|w| *w == 0),
        }
    }

    pub fn union(&self, other: &SubresourceMask) -> SubresourceMask {
        self.combine(other, |a, b| a | b)
    }

    pub fn intersection(&self, other: &SubresourceMask) -> SubresourceMask {
        self.combine(other, |a, b| a & b)
    }

    pub fn subtract(&self, other: &SubresourceMask) -> SubresourceMask {
        self.combine(other, |a, b| a & !b)
    }

    fn combine(&self, other: &SubresourceMask, op: impl Fn(u64, u64) -> u64) -> SubresourceMask {

        debug_assert_eq!(self.layer_count, other.layer_count);
        debug_assert_eq!(self.level_count, other.level_count);

        let mut result = SubresourceMask::empty(self.layer_count, self.level_count);

        match (&self.bits, &other.bits, &mut result.bits) {
            (MaskBits::Inline(a), MaskBits::Inline(b), MaskBits::Inline(r)) => {
                let lo = op((*a & 0xFFFF_FFFF_FFFF_FFFF) as u64, (*b & 0xFFFF_FFFF_FFFF_FFFF) as u64);
                let hi = op((*a >> 64) as u64, (*b >> 64) as u64);
                *r = (lo as u128) | ((hi as u128) << 64);
            },
            (MaskBits::Heap(a), MaskBits::Heap(b), MaskBits::Heap(r)) => {
                for i in 0..r.len() {
                    r[i] = op(a[i], b[i]);
                }
            },
            _ => unreachable!("mismatched subresource mask backing storage"),
        }

        result
    }

    pub fn intersects(&self, other: &SubresourceMask) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn intersects_single(&self, layer: u32, level: u32) -> bool {
        self.get(layer, level)
    }

    /// Emit a minimal set of maximal axis-aligned (layer x level) rectangles covering this mask.
    ///
    /// Sweeps levels in increasing order; for each uncovered bit, grows the layer-run at the
    /// current level, then extends through adjacent levels that share the identical run, clearing
    /// covered bits as it goes. The result is a disjoint cover usable directly as
    /// `vk::ImageSubresourceRange` values for barrier emission.
    pub fn iterate_ranges(&self, aspect_mask: vk::ImageAspectFlags) -> Vec<vk::ImageSubresourceRange> {

        let mut remaining = self.clone();
        let mut ranges = Vec::new();

        for base_level in 0..remaining.level_count {
            let mut base_layer = 0;

            while base_layer < remaining.layer_count {

                if !remaining.get(base_layer, base_level) {
                    base_layer += 1;
                    continue;
                }

                // grow the layer run at this level.
                let mut layer_count = 1;
                while base_layer + layer_count < remaining.layer_count
                    && remaining.get(base_layer + layer_count, base_level) {
                    layer_count += 1;
                }

                // extend through subsequent levels sharing the identical run.
                let mut level_count = 1;
                while base_level + level_count < remaining.level_count
                    && (0..layer_count).all(|l| remaining.get(base_layer + l, base_level + level_count)) {
                    level_count += 1;
                }

                for layer in base_layer..(base_layer + layer_count) {
                    for level in base_level..(base_level + level_count) {
                        remaining.set(layer, level, false);
                    }
                }

                ranges.push(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level  : base_level,
                    level_count,
                    base_array_layer: base_layer,
                    layer_count,
                });

                base_layer += layer_count;
            }
        }

        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_has_no_ranges() {
        let mask = SubresourceMask::empty(4, 4);
        assert!(mask.iterate_ranges(vk::ImageAspectFlags::COLOR).is_empty());
    }

    #[test]
    fn full_mask_is_one_rectangle() {
        let mask = SubresourceMask::full(4, 6);
        let ranges = mask.iterate_ranges(vk::ImageAspectFlags::COLOR);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].layer_count, 4);
        assert_eq!(ranges[0].level_count, 6);
    }

    #[test]
    fn rectangle_iteration_covers_mask_disjointly() {

        let mut mask = SubresourceMask::empty(4, 4);
        mask.set_range(0, 2, 0, 4);
        mask.set_range(2, 2, 1, 2);

        let set_bits: u32 = (0..4).flat_map(|l| (0..4).map(move |m| (l, m)))
            .filter(|&(l, m)| mask.get(l, m)).count() as u32;

        let ranges = mask.iterate_ranges(vk::ImageAspectFlags::COLOR);

        let covered: u32 = ranges.iter().map(|r| r.layer_count * r.level_count).sum();
        assert_eq!(covered, set_bits);
        assert!(ranges.len() as u32 <= set_bits);

        // verify pairwise disjointness.
        for (i, a) in ranges.iter().enumerate() {
            for b in ranges.iter().skip(i + 1) {
                let layers_overlap = a.base_array_layer < b.base_array_layer + b.layer_count
                    && b.base_array_layer < a.base_array_layer + a.layer_count;
                let levels_overlap = a.base_mip_level < b.base_mip_level + b.level_count
                    && b.base_mip_level < a.base_mip_level + a.level_count;
                assert!(!(layers_overlap && levels_overlap), "overlapping rectangles emitted");
            }
        }
    }

    #[test]
    fn union_intersection_subtract() {

        let a = SubresourceMask::single(2, 2, 0, 0);
        let b = SubresourceMask::single(2, 2, 0, 1);

        assert!(!a.union(&b).is_empty());
        assert!(a.intersection(&b).is_empty());
        assert!(!a.subtract(&b).is_empty());
        assert!(a.subtract(&a).is_empty());
    }
}
