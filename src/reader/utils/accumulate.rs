use super::geometry::PointF;

// Accumulator trait for flood fill
//------------------------------------------------------------------------------

pub trait Accumulator {
    fn accumulate(&mut self, row: Row);
}

impl<F> Accumulator for F
where
    F: FnMut(Row),
{
    fn accumulate(&mut self, row: Row) {
        self(row)
    }
}

// Region row
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Row {
    pub left: u32,
    pub right: u32,
    pub y: u32,
}

// Area & centre locator for regions
// Uses the centroid formula:
// CX = Sum of X / Total points
// CY = Sum of Y / Total points
//------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AreaAndCentreLocator {
    sum_x: u64,
    sum_y: u64,
    pub area: u32,
}

impl AreaAndCentreLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn centre(&self) -> PointF {
        if self.area == 0 {
            return PointF::default();
        }
        let area = self.area as f64;
        PointF::new(self.sum_x as f64 / (2.0 * area), self.sum_y as f64 / area)
    }
}

impl Accumulator for AreaAndCentreLocator {
    fn accumulate(&mut self, row: Row) {
        let Row { left, right, y } = row;
        let width = (right - left + 1) as u64;
        // Not halved to stay in integers; accounted for in centre()
        let mid = (left + right) as u64;

        self.sum_x += mid * width;
        self.sum_y += y as u64 * width;
        self.area += width as u32;
    }
}

#[cfg(test)]
mod accumulate_tests {
    use super::{Accumulator, AreaAndCentreLocator, Row};
    use crate::reader::utils::geometry::PointF;

    #[test]
    fn test_area_and_centre() {
        let mut acc = AreaAndCentreLocator::new();
        // 3x3 square with top left at (2, 4)
        for y in 4..7 {
            acc.accumulate(Row { left: 2, right: 4, y });
        }
        assert_eq!(acc.area, 9);
        assert_eq!(acc.centre(), PointF::new(3.0, 5.0));
    }

    #[test]
    fn test_closure_accumulator() {
        let mut rows = Vec::new();
        let mut acc = |r: Row| rows.push(r);
        acc.accumulate(Row { left: 0, right: 1, y: 0 });
        assert_eq!(rows.len(), 1);
    }
}
