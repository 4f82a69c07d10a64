use crate::common::metadata::Color;

use super::{
    binarize::BinaryImage,
    utils::{
        geometry::{Point, PointF, Y},
        is_ratio_match, verify_pattern,
    },
};

const FINDER_PATTERN: [u32; 5] = [1, 1, 3, 1, 1];

// Finder line
//------------------------------------------------------------------------------

// **   ******   **  <- Finder line
// ^    ^        ^
// left |        right
//      stone
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct DatumLine {
    left: u32,
    stone: u32,
    right: u32,
    y: u32,
}

// Line scanner to detect finder line
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct LineScanner {
    pub buffer: [u32; 6], // Run length of each transition
    prev: Option<Color>,  // Last observed color
    flips: u32,           // Count of color changes
    pos: u32,             // Position of the next pixel
    y: u32,
}

impl LineScanner {
    pub fn new() -> Self {
        Self { buffer: [0; 6], prev: None, flips: 0, pos: 0, y: 0 }
    }

    pub fn reset(&mut self, y: u32) {
        self.buffer = [0; 6];
        self.prev = None;
        self.flips = 0;
        self.pos = 0;
        self.y = y;
    }

    pub fn advance(&mut self, color: Color) -> Option<DatumLine> {
        let x = self.pos;
        self.pos += 1;

        if self.prev == Some(color) {
            self.buffer[5] += 1;
            return None;
        }

        self.buffer.rotate_left(1);
        self.buffer[5] = 1;
        self.prev = Some(color);
        self.flips += 1;

        // A light run closes the candidate dark-light-dark-light-dark sequence
        if color.is_dark() || !self.is_finder_line() {
            return None;
        }

        Some(DatumLine {
            left: x - self.buffer[..5].iter().sum::<u32>(),
            stone: x - self.buffer[2..5].iter().sum::<u32>(),
            right: x - self.buffer[4],
            y: self.y,
        })
    }

    // Validates whether last 5 run lengths are in the 1:1:3:1:1 ratio
    fn is_finder_line(&self) -> bool {
        self.flips >= 6 && is_ratio_match(&self.buffer[..5], &FINDER_PATTERN)
    }
}

// Finder
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finder {
    pub centre: PointF,
    pub module: f64, // Estimated module size in pixels
}

// Locate finders
//------------------------------------------------------------------------------

/// Scans every row for the 1:1:3:1:1 run pattern and returns the verified finder patterns
pub fn locate_finders(img: &mut BinaryImage) -> Vec<Finder> {
    let mut finders = Vec::with_capacity(16);
    let w = img.w;
    let h = img.h;
    let mut scanner = LineScanner::new();

    for y in 0..h {
        scanner.reset(y);

        for x in 0..w {
            let Some(px) = img.get(x, y) else {
                continue;
            };
            let Some(datum) = scanner.advance(Color::from(px)) else {
                continue;
            };

            if let Some(finder) = verify_and_mark_finder(img, &scanner, &datum) {
                finders.push(finder);
            }
        }

        // Handles an edge case where the QR is located at the right edge of the image
        if let Some(datum) = scanner.advance(Color::White) {
            if let Some(finder) = verify_and_mark_finder(img, &scanner, &datum) {
                finders.push(finder);
            }
        }
    }

    finders
}

// Checks multiple conditions to ensure the finder is valid
// 1. The stone wasn't already marked as finder
// 2. Crosscheck 1:1:3:1:1 pattern along Y axis
// 3. Left and right datum points are connected
// 4. Ring and stone regions aren't connected
// 5. Stone area is between 10% and 70% of ring area
// Finally it marks the regions as finder and returns the stone centre
fn verify_and_mark_finder(
    img: &mut BinaryImage,
    scn: &LineScanner,
    datum: &DatumLine,
) -> Option<Finder> {
    let DatumLine { left: l, stone: s, right: r, y } = *datum;

    let stone_id = img.region_id(s, y)?;
    if img.region(stone_id).is_finder {
        return None;
    }

    let seed = Point { x: (s + scn.buffer[2] / 2) as i32, y: y as i32 };
    let max_run = (r - l) * 2; // Loose upper limit on each run
    if !verify_pattern::<Y>(img, &seed, &FINDER_PATTERN, max_run) {
        return None;
    }

    let ring_id = img.region_id(r, y)?;
    if img.region_id(l, y)? != ring_id || ring_id == stone_id {
        return None;
    }

    let stone = *img.region(stone_id);
    let ring = *img.region(ring_id);
    let ratio = stone.area * 100 / ring.area;
    if ratio <= 10 || 70 <= ratio {
        return None;
    }

    img.region_mut(stone_id).is_finder = true;
    img.region_mut(ring_id).is_finder = true;

    // Ring covers 24 modules
    let module = (ring.area as f64 / 24.0).sqrt();
    Some(Finder { centre: stone.centre, module })
}

// Groups finders in 3, which form potential symbols
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderGroup {
    pub finders: [Finder; 3], // [TL, TR, BL]
    pub score: f64,           // Lower is better
}

impl FinderGroup {
    pub fn top_left(&self) -> &Finder {
        &self.finders[0]
    }

    pub fn top_right(&self) -> &Finder {
        &self.finders[1]
    }

    pub fn bottom_left(&self) -> &Finder {
        &self.finders[2]
    }

    pub fn module(&self) -> f64 {
        self.finders.iter().map(|f| f.module).sum::<f64>() / 3.0
    }
}

// Every finder is tried as the top left corner with every pair of the others. The pair must be
// roughly perpendicular, of similar length and with similar module sizes. Image y grows
// downwards, so a positive cross product from the first arm to the second means the first arm
// points to the top right finder.
//
//  TL ------- TR
//  |
//  |
//  BL
pub fn group_finders(finders: &[Finder]) -> Vec<FinderGroup> {
    let mut all_groups: Vec<(FinderGroup, [usize; 3])> = Vec::new();

    for (i, tl) in finders.iter().enumerate() {
        for (j, fj) in finders.iter().enumerate() {
            for (k, fk) in finders.iter().enumerate().skip(j + 1) {
                if i == j || i == k {
                    continue;
                }

                let a = fj.centre - tl.centre;
                let b = fk.centre - tl.centre;
                let (la, lb) = (a.norm(), b.norm());
                if la == 0.0 || lb == 0.0 {
                    continue;
                }

                let cos = a.dot(&b) / (la * lb);
                if cos.abs() > 0.6 {
                    continue;
                }

                let len_ratio = la / lb;
                if !(0.5..=2.0).contains(&len_ratio) {
                    continue;
                }

                let mods = [tl.module, fj.module, fk.module];
                let max_mod = mods.iter().copied().fold(f64::MIN, f64::max);
                let min_mod = mods.iter().copied().fold(f64::MAX, f64::min);
                if max_mod > 2.0 * min_mod {
                    continue;
                }

                let (tr, bl) = if a.cross(&b) > 0.0 { (j, k) } else { (k, j) };
                let score = (1.0 - len_ratio).abs() + cos.abs() + (max_mod / min_mod - 1.0);
                let group = FinderGroup { finders: [*tl, finders[tr], finders[bl]], score };
                all_groups.push((group, [i, tr, bl]));
            }
        }
    }

    all_groups.sort_by(|a, b| a.0.score.total_cmp(&b.0.score));

    // A finder joins at most one group, the best scoring one
    let mut res = Vec::with_capacity(finders.len() / 3);
    let mut is_grouped = vec![false; finders.len()];

    for (g, ids) in all_groups {
        if ids.iter().all(|&id| !is_grouped[id]) {
            ids.iter().for_each(|&id| is_grouped[id] = true);
            res.push(g);
        }
    }

    res
}

#[cfg(test)]
mod finder_tests {
    use image::{GrayImage, Luma};

    use super::{group_finders, locate_finders, Finder, LineScanner};
    use crate::common::metadata::Color;
    use crate::reader::binarize::BinaryImage;
    use crate::reader::utils::geometry::PointF;

    // Draws a 7x7 finder pattern with its top left module at (mx, my)
    fn draw_finder(img: &mut GrayImage, mx: u32, my: u32, scale: u32) {
        for y in 0..7 {
            for x in 0..7 {
                let ring = x == 0 || x == 6 || y == 0 || y == 6;
                let stone = (2..=4).contains(&x) && (2..=4).contains(&y);
                if ring || stone {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = (mx + x) * scale + dx;
                            let py = (my + y) * scale + dy;
                            img.put_pixel(px, py, Luma([0]));
                        }
                    }
                }
            }
        }
    }

    fn finder_image() -> GrayImage {
        // 25 module grid with a 4 module margin at 4px per module
        let mut img = GrayImage::from_pixel(132, 132, Luma([255]));
        draw_finder(&mut img, 4, 4, 4);
        draw_finder(&mut img, 22, 4, 4);
        draw_finder(&mut img, 4, 22, 4);
        img
    }

    fn finder(x: f64, y: f64) -> Finder {
        Finder { centre: PointF::new(x, y), module: 4.0 }
    }

    #[test]
    fn test_line_scanner() {
        let mut scn = LineScanner::new();
        let runs = [(Color::White, 3), (Color::Black, 2), (Color::White, 2), (Color::Black, 6)];
        let runs = runs.iter().chain(&[(Color::White, 2), (Color::Black, 2), (Color::White, 1)]);

        let mut found = None;
        for &(color, len) in runs {
            for _ in 0..len {
                if let Some(d) = scn.advance(color) {
                    found = Some(d);
                }
            }
        }

        let datum = found.expect("Finder line not detected");
        assert_eq!((datum.left, datum.stone, datum.right), (3, 7, 15));
    }

    #[test]
    fn test_locate_finders() {
        let mut img = BinaryImage::from_thresholded(&finder_image());
        let mut finders = locate_finders(&mut img);
        finders.sort_by(|a, b| (a.centre.y, a.centre.x).partial_cmp(&(b.centre.y, b.centre.x)).unwrap());

        let exp = [(29.5, 29.5), (101.5, 29.5), (29.5, 101.5)];
        assert_eq!(finders.len(), 3);
        for (f, e) in finders.iter().zip(exp) {
            assert_eq!(f.centre, PointF::new(e.0, e.1));
            assert!((f.module - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_group_finders_orientation() {
        // Listed out of order to exercise corner assignment
        let finders = [finder(101.5, 29.5), finder(29.5, 101.5), finder(29.5, 29.5)];
        let groups = group_finders(&finders);

        assert_eq!(groups.len(), 1);
        let g = groups[0];
        assert_eq!(g.top_left().centre, PointF::new(29.5, 29.5));
        assert_eq!(g.top_right().centre, PointF::new(101.5, 29.5));
        assert_eq!(g.bottom_left().centre, PointF::new(29.5, 101.5));
        assert!(g.score.abs() < 1e-9);
    }

    #[test]
    fn test_group_finders_rejects_collinear() {
        let finders = [finder(10.0, 10.0), finder(60.0, 10.0), finder(110.0, 10.0)];
        assert!(group_finders(&finders).is_empty());
    }

    #[test]
    fn test_group_finders_no_reuse() {
        // Two symbols side by side
        let finders = [
            finder(30.0, 30.0),
            finder(100.0, 30.0),
            finder(30.0, 100.0),
            finder(330.0, 30.0),
            finder(400.0, 30.0),
            finder(330.0, 100.0),
        ];
        let groups = group_finders(&finders);
        assert_eq!(groups.len(), 2);
    }
}
