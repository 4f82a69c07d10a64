use crate::common::metadata::Version;

// Iterator over the data region of a symbol in reading order
//------------------------------------------------------------------------------

const VERT_TIMING_COL: i32 = 6;

/// Yields (x, y) module coordinates of the data region, walking two-column strips from the
/// bottom right corner in a zigzag and skipping the vertical timing pattern.
#[derive(Clone)]
pub struct DataRegionIter {
    x: i32,
    y: i32,
    w: i32,
    ap: Vec<i32>,
    ver: Version,
}

impl DataRegionIter {
    pub fn new(ver: Version) -> Self {
        let w = ver.width() as i32;
        let ap = ver.alignment_pattern();
        Self { x: w - 1, y: w - 1, w, ap, ver }
    }

    // Checks if the module is reserved for functional pattern or metadata info
    fn is_reserved(&self, x: i32, y: i32) -> bool {
        let w = self.w;

        // Top left finder & format info
        if x < 9 && y < 9 {
            return true;
        }

        // Top right finder & format info
        if x >= w - 8 && y < 9 {
            return true;
        }

        // Bottom left finder & format info
        if x < 9 && y >= w - 8 {
            return true;
        }

        // Timing patterns
        if x == VERT_TIMING_COL || y == 6 {
            return true;
        }

        if self.ver.has_version_info() {
            // Top right
            if (w - 11..=w - 9).contains(&x) && (0..=5).contains(&y) {
                return true;
            }

            // Bottom left
            if (0..=5).contains(&x) && (w - 11..=w - 9).contains(&y) {
                return true;
            }
        }

        // Alignment patterns, except those overlapping finders
        for &ax in &self.ap {
            for &ay in &self.ap {
                if (ax == 6 && (ay == 6 || ay == w - 7)) || (ax == w - 7 && ay == 6) {
                    continue;
                }
                if ax - 2 <= x && x <= ax + 2 && ay - 2 <= y && y <= ay + 2 {
                    return true;
                }
            }
        }

        false
    }
}

impl Iterator for DataRegionIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x < 0 {
            return None;
        }

        let res = (self.x, self.y);

        loop {
            let adjusted_x = if self.x <= VERT_TIMING_COL { self.x + 1 } else { self.x };
            let col_type = (self.w - adjusted_x) % 4;

            match col_type {
                2 if self.y > 0 => {
                    self.y -= 1;
                    self.x += 1;
                }
                0 if self.y < self.w - 1 => {
                    self.y += 1;
                    self.x += 1;
                }
                0 | 2 if self.x == VERT_TIMING_COL + 1 => {
                    self.x -= 2;
                }
                _ => {
                    self.x -= 1;
                }
            }

            if self.x < 0 || !self.is_reserved(self.x, self.y) {
                break;
            }
        }

        Some(res)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::DataRegionIter;
    use crate::common::metadata::Version;

    #[test]
    fn test_data_region_size() {
        for v in 1..=40 {
            let ver = Version::new(v).unwrap();
            assert_eq!(DataRegionIter::new(ver).count(), ver.raw_modules(), "Version {v}");
        }
    }

    #[test]
    fn test_data_region_start() {
        let ver = Version::new(1).unwrap();
        let coords: Vec<_> = DataRegionIter::new(ver).take(6).collect();
        assert_eq!(coords, [(20, 20), (19, 20), (20, 19), (19, 19), (20, 18), (19, 18)]);
    }

    #[test]
    fn test_data_region_skips_timing_col() {
        let ver = Version::new(2).unwrap();
        assert!(DataRegionIter::new(ver).all(|(x, y)| x != 6 && y != 6));
    }
}
