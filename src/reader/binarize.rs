use std::collections::VecDeque;

use image::GrayImage;

use crate::common::metadata::Color;

use super::utils::{
    accumulate::{Accumulator, AreaAndCentreLocator, Row},
    geometry::{Point, PointF},
};

// Pixel
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Pixel {
    Visited(u32, Color), // Contains id of associated region
    Unvisited(Color),    // Default tag
}

impl From<Pixel> for Color {
    fn from(p: Pixel) -> Self {
        match p {
            Pixel::Visited(_, c) | Pixel::Unvisited(c) => c,
        }
    }
}

// Region
//------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Region {
    pub color: Color,
    pub area: u32,
    pub centre: PointF,
    pub is_finder: bool,
}

// Adaptive binarization for grayscale images
// Steps:
// 1. Divides image into blocks of 8x8 pixels. Blocks on the right and bottom edges may be
//    partial and are averaged over the pixels they hold
// 2. Calculates average of each block. Flat blocks (max - min <= 24) take half their minimum,
//    or the weighted average of the top/left neighbours when that is brighter than the minimum
// 3. Calculates the threshold for each block by averaging the 5x5 blocks around it, clipped to
//    the image
// 4. Marks a pixel dark if its value is less than or equal to the threshold
//------------------------------------------------------------------------------

const BLOCK_SHIFT: u32 = 3;
const FLAT_BLOCK_RANGE: u8 = 24;

pub trait Binarize {
    fn binarize(&self) -> Vec<Pixel>;
    fn calculate_block_average(&self) -> Vec<usize>;
    fn calculate_threshold(&self, avg: &[usize]) -> Vec<u8>;
}

fn block_steps(w: u32, h: u32) -> (usize, usize) {
    let wsteps = w.div_ceil(1 << BLOCK_SHIFT) as usize;
    let hsteps = h.div_ceil(1 << BLOCK_SHIFT) as usize;
    (wsteps, hsteps)
}

impl Binarize for GrayImage {
    fn binarize(&self) -> Vec<Pixel> {
        let (w, h) = self.dimensions();
        let (wsteps, _) = block_steps(w, h);

        let blk_avg = self.calculate_block_average();
        let thresh = self.calculate_threshold(&blk_avg);

        let mut res = Vec::with_capacity((w * h) as usize);
        for (x, y, p) in self.enumerate_pixels() {
            let idx = (y >> BLOCK_SHIFT) as usize * wsteps + (x >> BLOCK_SHIFT) as usize;
            let color = Color::from(p[0] <= thresh[idx]);
            res.push(Pixel::Unvisited(color));
        }

        res
    }

    fn calculate_block_average(&self) -> Vec<usize> {
        let (w, h) = self.dimensions();
        let (wsteps, hsteps) = block_steps(w, h);
        let len = wsteps * hsteps;

        let mut sum = vec![0usize; len];
        let mut count = vec![0usize; len];
        let mut min_max = vec![(u8::MAX, u8::MIN); len];

        for (x, y, p) in self.enumerate_pixels() {
            let idx = (y >> BLOCK_SHIFT) as usize * wsteps + (x >> BLOCK_SHIFT) as usize;
            let p = p[0];
            sum[idx] += p as usize;
            count[idx] += 1;
            min_max[idx].0 = min_max[idx].0.min(p);
            min_max[idx].1 = min_max[idx].1.max(p);
        }

        let mut avg = vec![0usize; len];
        for by in 0..hsteps {
            for bx in 0..wsteps {
                let i = by * wsteps + bx;
                let (mn, mx) = min_max[i];

                if mx - mn > FLAT_BLOCK_RANGE {
                    avg[i] = sum[i] / count[i];
                    continue;
                }

                avg[i] = mn as usize / 2;
                if bx > 0 && by > 0 {
                    // Neighbours (x-1, y), (x, y-1), (x-1, y-1)
                    let ng_avg = (2 * avg[i - 1] + avg[i - wsteps] + avg[i - wsteps - 1]) / 4;
                    if (mn as usize) < ng_avg {
                        avg[i] = ng_avg;
                    }
                }
            }
        }

        avg
    }

    fn calculate_threshold(&self, avg: &[usize]) -> Vec<u8> {
        let (w, h) = self.dimensions();
        let (wsteps, hsteps) = block_steps(w, h);

        let mut res = vec![0u8; wsteps * hsteps];
        for by in 0..hsteps {
            let (y0, y1) = (by.saturating_sub(2), (by + 3).min(hsteps));
            for bx in 0..wsteps {
                let (x0, x1) = (bx.saturating_sub(2), (bx + 3).min(wsteps));

                let mut sum = 0;
                for ny in y0..y1 {
                    sum += avg[ny * wsteps + x0..ny * wsteps + x1].iter().sum::<usize>();
                }
                let count = (y1 - y0) * (x1 - x0);

                res[by * wsteps + bx] = (sum / count) as u8;
            }
        }
        res
    }
}

// Image type for reader
//------------------------------------------------------------------------------

#[derive(Debug)]
pub struct BinaryImage {
    buffer: Vec<Pixel>,
    regions: Vec<Region>, // Index is the region id stored in visited pixels
    pub w: u32,
    pub h: u32,
}

impl BinaryImage {
    /// Performs adaptive binarization on a grayscale image
    pub fn prepare(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let buffer = img.binarize();
        Self { buffer, regions: Vec::new(), w, h }
    }

    /// Wraps an image that has already been thresholded. Pixels below mid gray are dark
    pub fn from_thresholded(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let buffer = img.pixels().map(|p| Pixel::Unvisited(Color::from(p[0] < 128))).collect();
        Self { buffer, regions: Vec::new(), w, h }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(self.buffer[(y * self.w + x) as usize])
    }

    pub fn get_at_point(&self, pt: &Point) -> Option<Pixel> {
        if pt.x < 0 || pt.y < 0 {
            return None;
        }
        self.get(pt.x as u32, pt.y as u32)
    }

    pub fn color_at(&self, pt: &Point) -> Option<Color> {
        self.get_at_point(pt).map(Color::from)
    }

    fn set(&mut self, x: u32, y: u32, px: Pixel) {
        let idx = (y * self.w + x) as usize;
        self.buffer[idx] = px;
    }

    pub fn region(&self, id: u32) -> &Region {
        &self.regions[id as usize]
    }

    pub fn region_mut(&mut self, id: u32) -> &mut Region {
        &mut self.regions[id as usize]
    }

    /// Returns the id of the region containing the pixel, labelling the region on first visit
    pub fn region_id(&mut self, x: u32, y: u32) -> Option<u32> {
        match self.get(x, y)? {
            Pixel::Visited(id, _) => Some(id),
            Pixel::Unvisited(color) => {
                let id = self.regions.len() as u32;
                let acc = self.fill_and_accumulate((x, y), id, AreaAndCentreLocator::new());
                self.regions.push(Region {
                    color,
                    area: acc.area,
                    centre: acc.centre(),
                    is_finder: false,
                });
                Some(id)
            }
        }
    }

    /// Labels the unvisited region around src with the id and accumulates its rows
    fn fill_and_accumulate<A: Accumulator>(&mut self, src: (u32, u32), id: u32, mut acc: A) -> A {
        let Some(from @ Pixel::Unvisited(color)) = self.get(src.0, src.1) else {
            return acc;
        };
        let target = Pixel::Visited(id, color);

        // Span flood fill
        let (w, h) = (self.w, self.h);
        let mut queue = VecDeque::new();
        queue.push_back(src);

        while let Some((x, y)) = queue.pop_front() {
            // Seed may have been filled through another span
            if self.get(x, y) != Some(from) {
                continue;
            }

            let mut left = x;
            let mut right = x;
            self.set(x, y, target);

            // Traverse left till boundary
            while left > 0 && self.get(left - 1, y) == Some(from) {
                left -= 1;
                self.set(left, y, target);
            }

            // Traverse right till boundary
            while right < w - 1 && self.get(right + 1, y) == Some(from) {
                right += 1;
                self.set(right, y, target);
            }

            acc.accumulate(Row { left, right, y });

            for ny in [y.wrapping_sub(1), y + 1] {
                if ny >= h {
                    continue;
                }
                let mut seg_len = 0;
                for nx in left..=right {
                    if self.get(nx, ny) == Some(from) {
                        seg_len += 1;
                    } else if seg_len > 0 {
                        queue.push_back((nx - 1, ny));
                        seg_len = 0;
                    }
                }
                if seg_len > 0 {
                    queue.push_back((right, ny));
                }
            }
        }
        acc
    }
}
