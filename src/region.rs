/// A watermark rectangle in reference-frame pixel coordinates.
///
/// The two corners carry no ordering constraint (a drag can end above or
/// left of where it started), so consumers must normalize before slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Region {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Corner coordinates as (left, top, right, bottom) with min/max applied.
    pub fn normalized(&self) -> (i32, i32, i32, i32) {
        (
            self.x0.min(self.x1),
            self.y0.min(self.y1),
            self.x0.max(self.x1),
            self.y0.max(self.y1),
        )
    }

    /// A click without a drag marks no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.x0 == self.x1 || self.y0 == self.y1
    }
}

/// Ordered watermark regions for one video, built interactively.
///
/// `undo_last` is a stack pop, so two identical regions are never ambiguous.
/// `freeze` consumes the set, which makes it read-only after submission by
/// construction.
#[derive(Debug, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Removes the most recently added region. No-op when the set is empty.
    pub fn undo_last(&mut self) -> Option<Region> {
        self.regions.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn freeze(self) -> Vec<Region> {
        self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_swaps_inverted_corners() {
        let region = Region::new(30, 40, 10, 20);
        assert_eq!(region.normalized(), (10, 20, 30, 40));
    }

    #[test]
    fn degenerate_region_detected() {
        assert!(Region::new(5, 5, 5, 9).is_degenerate());
        assert!(Region::new(5, 5, 9, 5).is_degenerate());
        assert!(!Region::new(5, 5, 9, 9).is_degenerate());
    }

    #[test]
    fn undo_removes_most_recent() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 0, 4, 4));
        set.add(Region::new(1, 1, 5, 5));
        assert_eq!(set.undo_last(), Some(Region::new(1, 1, 5, 5)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn undo_on_empty_set_is_noop() {
        let mut set = RegionSet::new();
        assert_eq!(set.undo_last(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn undo_with_duplicates_pops_last_instance() {
        let mut set = RegionSet::new();
        let region = Region::new(2, 2, 8, 8);
        set.add(region);
        set.add(region);
        set.undo_last();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn freeze_preserves_order() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 0, 1, 1));
        set.add(Region::new(2, 2, 3, 3));
        let frozen = set.freeze();
        assert_eq!(frozen[0], Region::new(0, 0, 1, 1));
        assert_eq!(frozen[1], Region::new(2, 2, 3, 3));
    }
}
