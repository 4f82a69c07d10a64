use super::{
    binarize::BinaryImage,
    finder::FinderGroup,
    utils::{geometry::PointF, homography::Homography},
};
use crate::common::{
    ec::rectify_info,
    mask::MaskPattern,
    metadata::{
        Color, ECLevel, Version, FORMAT_INFOS, FORMAT_INFO_COORDS_MAIN, FORMAT_INFO_COORDS_SIDE,
        FORMAT_MASK, VERSION_INFOS, VERSION_INFO_COORDS_BL,
    },
    utils::{DataRegionIter, QRError, QRResult},
};

const FORMAT_ERROR_CAPACITY: u32 = 3;
const VERSION_ERROR_CAPACITY: u32 = 3;
const VERSION_ERROR_BIT_LEN: u32 = 12;

// Estimates version from the distance between finder centres, which sit 3.5 modules inside
// the symbol edge
//------------------------------------------------------------------------------

pub fn estimate_version(group: &FinderGroup) -> usize {
    let tl = group.top_left().centre;
    let d = (group.top_right().centre.dist(&tl) + group.bottom_left().centre.dist(&tl)) / 2.0;
    let size = d / group.module() + 7.0;
    let ver = ((size - 17.0) / 4.0).round();
    ver.clamp(1.0, Version::MAX as f64) as usize
}

// Locates symbol based on 3 finder centres and a candidate version
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SymbolLocation {
    h: Homography,
    pub ver: Version,
}

impl SymbolLocation {
    pub fn locate(img: &mut BinaryImage, group: &FinderGroup, ver: Version) -> QRResult<Self> {
        let size = ver.width() as f64;
        let tl = group.top_left().centre;
        let tr = group.top_right().centre;
        let bl = group.bottom_left().centre;

        let (src_br, dst_br) = if ver.number() == 1 {
            // No alignment pattern. Complete the parallelogram to the bottom right finder
            ((size - 3.5, size - 3.5), tr + bl - tl)
        } else {
            // Provisional alignment centre, 6.5 modules from the bottom right edge
            let k = (size - 10.0) / (size - 7.0);
            let est = tl + (tr - tl).scale(k) + (bl - tl).scale(k);
            let align = locate_alignment_pattern(img, est, group.module()).unwrap_or(est);
            ((size - 6.5, size - 6.5), align)
        };

        let src = [(3.5, 3.5), (size - 3.5, 3.5), (3.5, size - 3.5), src_br];
        let dst = [tl.into(), tr.into(), bl.into(), dst_br.into()];

        let h = Homography::compute(src, dst)?;
        let h = jiggle_homography(img, h, ver);

        Ok(Self { h, ver })
    }
}

// Spirals out from the provisional centre to find a dark region the size of an alignment stone
fn locate_alignment_pattern(img: &mut BinaryImage, seed: PointF, module: f64) -> Option<PointF> {
    let mod_area = module * module;
    let mut pos = seed.round();

    // x & y increments w.r.t direction
    const DX: [i32; 4] = [1, 0, -1, 0];
    const DY: [i32; 4] = [0, -1, 0, 1];

    let mut dir = 0;
    let mut run_len = 1;

    while (run_len as f64) < module * 8.0 {
        for _ in 0..run_len {
            if img.color_at(&pos) == Some(Color::Black) {
                let id = img.region_id(pos.x as u32, pos.y as u32)?;
                let reg = img.region(id);
                let area = reg.area as f64;
                if !reg.is_finder && mod_area / 4.0 <= area && area <= mod_area * 2.0 {
                    return Some(reg.centre);
                }
            }
            pos.x += DX[dir];
            pos.y += DY[dir];
        }

        // Cycle direction
        dir = (dir + 1) & 3;
        if dir & 1 == 0 {
            run_len += 1;
        }
    }

    None
}

// Adjust the homography slightly to refine viewport of qr
fn jiggle_homography(img: &BinaryImage, mut h: Homography, ver: Version) -> Homography {
    let mut best = symbol_fitness(img, &h, ver);

    // Create an adjustment matrix by scaling the homography
    let mut adjustments = h.0.map(|x| x * 0.02);

    for _pass in 0..5 {
        for i in 0..16 {
            let j = i >> 1;
            let old = h[j];
            let step = adjustments[j];

            h[j] = if i & 1 == 0 { old - step } else { old + step };

            let test = symbol_fitness(img, &h, ver);
            if test > best {
                best = test
            } else {
                h[j] = old
            }
        }

        // Halve all adjustment steps
        adjustments = adjustments.map(|x| x * 0.5);
    }
    h
}

fn symbol_fitness(img: &BinaryImage, h: &Homography, ver: Version) -> i32 {
    let mut score = 0;
    let grid_size = ver.width() as i32;

    // Score timing patterns. Even modules are dark
    for i in 7..grid_size - 7 {
        let flip = if i & 1 == 0 { 1 } else { -1 };
        score += cell_fitness(img, h, i, 6) * flip;
        score += cell_fitness(img, h, 6, i) * flip;
    }

    // Score finders
    score += finder_fitness(img, h, 0, 0);
    score += finder_fitness(img, h, grid_size - 7, 0);
    score += finder_fitness(img, h, 0, grid_size - 7);

    // Score alignment patterns
    let aps = ver.alignment_pattern();
    if aps.is_empty() {
        return score;
    }
    let len = aps.len();

    for i in aps[1..len - 1].iter() {
        score += alignment_fitness(img, h, 6, *i);
        score += alignment_fitness(img, h, *i, 6);
    }
    for i in aps[1..].iter() {
        for j in aps[1..].iter() {
            score += alignment_fitness(img, h, *i, *j);
        }
    }

    score
}

fn finder_fitness(img: &BinaryImage, h: &Homography, x: i32, y: i32) -> i32 {
    let (x, y) = (x + 3, y + 3);
    cell_fitness(img, h, x, y) + ring_fitness(img, h, x, y, 1) - ring_fitness(img, h, x, y, 2)
        + ring_fitness(img, h, x, y, 3)
}

fn alignment_fitness(img: &BinaryImage, h: &Homography, x: i32, y: i32) -> i32 {
    cell_fitness(img, h, x, y) - ring_fitness(img, h, x, y, 1) + ring_fitness(img, h, x, y, 2)
}

fn ring_fitness(img: &BinaryImage, h: &Homography, cx: i32, cy: i32, r: i32) -> i32 {
    let mut score = 0;

    for i in 0..r * 2 {
        score += cell_fitness(img, h, cx - r + i, cy - r);
        score += cell_fitness(img, h, cx - r, cy + r - i);
        score += cell_fitness(img, h, cx + r, cy - r + i);
        score += cell_fitness(img, h, cx + r - i, cy + r);
    }

    score
}

// +1 for each dark sample and -1 for each light sample in a 3x3 grid inside the module
fn cell_fitness(img: &BinaryImage, hm: &Homography, x: i32, y: i32) -> i32 {
    const OFFSETS: [f64; 3] = [0.3, 0.5, 0.7];
    let mut score = 0;

    for dy in OFFSETS.iter() {
        for dx in OFFSETS.iter() {
            let Ok(pt) = hm.map(x as f64 + dx, y as f64 + dy) else {
                continue;
            };
            match img.color_at(&pt) {
                Some(Color::Black) => score += 1,
                Some(Color::White) => score -= 1,
                None => {}
            }
        }
    }
    score
}

// Symbol
// Module grid sampled through the homography
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Symbol {
    grid: Vec<Color>,
    pub ver: Version,
}

impl Symbol {
    pub fn sample(img: &BinaryImage, loc: &SymbolLocation) -> Self {
        let ver = loc.ver;
        let w = ver.width();
        let mut grid = Vec::with_capacity(w * w);

        for y in 0..w {
            for x in 0..w {
                let color = loc
                    .h
                    .map(x as f64 + 0.5, y as f64 + 0.5)
                    .ok()
                    .and_then(|pt| img.color_at(&pt))
                    .unwrap_or(Color::White);
                grid.push(color);
            }
        }

        Self { grid, ver }
    }

    /// Module at column x and row y. Negative coordinates wrap from the far edge
    pub fn get(&self, x: i32, y: i32) -> Color {
        let (x, y) = self.wrap_coord(x, y);
        self.grid[(y * self.ver.width() as i32 + x) as usize]
    }

    fn wrap_coord(&self, x: i32, y: i32) -> (i32, i32) {
        let w = self.ver.width() as i32;
        debug_assert!(-w <= x && x < w, "x shouldn't be greater than or equal to w");
        debug_assert!(-w <= y && y < w, "y shouldn't be greater than or equal to w");

        let x = if x < 0 { x + w } else { x };
        let y = if y < 0 { y + w } else { y };
        (x, y)
    }

    // Reads bits at (row, col) coordinates, most significant first
    fn get_number(&self, coords: &[(i32, i32)]) -> u32 {
        coords.iter().fold(0, |num, &(y, x)| (num << 1) | self.get(x, y).is_dark() as u32)
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl Symbol {
    pub fn read_format_info(&self) -> QRResult<(ECLevel, MaskPattern)> {
        for coords in [&FORMAT_INFO_COORDS_MAIN, &FORMAT_INFO_COORDS_SIDE] {
            let info = self.get_number(coords);
            if let Ok(format) = rectify_info(info, &FORMAT_INFOS, FORMAT_ERROR_CAPACITY) {
                let data = (format ^ FORMAT_MASK) >> 10;
                let ecl = ECLevel::from_info_bits(data >> 3);
                let mask = MaskPattern::new((data & 0b111) as u8)?;
                return Ok((ecl, mask));
            }
        }

        Err(QRError::InvalidFormatInfo)
    }

    pub fn read_version_info(&self) -> QRResult<Version> {
        // Top right block is the transpose of the bottom left block
        let tr_coords = VERSION_INFO_COORDS_BL.map(|(r, c)| (c, r));

        for coords in [&VERSION_INFO_COORDS_BL, &tr_coords] {
            let info = self.get_number(coords);
            if let Ok(v) = rectify_info(info, &VERSION_INFOS, VERSION_ERROR_CAPACITY) {
                return Version::new((v >> VERSION_ERROR_BIT_LEN) as usize);
            }
        }

        Err(QRError::InvalidVersionInfo)
    }
}

// Extracts encoded data codewords and error correction codewords
//------------------------------------------------------------------------------

impl Symbol {
    pub fn extract_payload(&self, mask: MaskPattern) -> Vec<u8> {
        let mask_fn = mask.mask_functions();
        let total = self.ver.total_codewords();
        let mut pld = vec![0u8; total];

        for (i, (x, y)) in DataRegionIter::new(self.ver).take(total << 3).enumerate() {
            let bit = self.get(x, y).is_dark() ^ mask_fn(x, y);
            if bit {
                pld[i >> 3] |= 0x80 >> (i & 7);
            }
        }
        pld
    }
}

#[cfg(test)]
mod symbol_tests {
    use std::path::Path;

    use super::{estimate_version, Symbol, SymbolLocation};
    use crate::common::metadata::{ECLevel, Version};
    use crate::reader::{
        binarize::BinaryImage,
        finder::{group_finders, locate_finders},
    };

    fn locate(path: &str, ver: usize) -> (usize, Symbol) {
        let img = image::open(Path::new(path)).unwrap().to_luma8();
        let mut img = BinaryImage::prepare(&img);
        let finders = locate_finders(&mut img);
        let groups = group_finders(&finders);
        assert!(!groups.is_empty(), "No finder group found");

        let est = estimate_version(&groups[0]);
        let ver = Version::new(ver).unwrap();
        let loc = SymbolLocation::locate(&mut img, &groups[0], ver).unwrap();
        (est, Symbol::sample(&img, &loc))
    }

    #[test]
    fn test_read_format_info() {
        let (est, symbol) = locate("tests/fixtures/https_url.png", 3);
        assert_eq!(est, 3);
        let (ecl, mask) = symbol.read_format_info().unwrap();
        assert_eq!(ecl, ECLevel::M);
        assert_eq!(*mask, 3);
    }

    #[test]
    fn test_read_format_info_rotated() {
        let (_, symbol) = locate("tests/fixtures/rotated.png", 3);
        let (ecl, mask) = symbol.read_format_info().unwrap();
        assert_eq!(ecl, ECLevel::M);
        assert_eq!(*mask, 2);
    }

    #[test]
    fn test_read_version_info() {
        let (est, symbol) = locate("tests/fixtures/version7.png", 7);
        assert!((6..=8).contains(&est));
        assert_eq!(symbol.read_version_info().unwrap(), Version::new(7).unwrap());
        let (ecl, mask) = symbol.read_format_info().unwrap();
        assert_eq!(ecl, ECLevel::L);
        assert_eq!(*mask, 1);
    }

    #[test]
    fn test_extract_payload_len() {
        let (_, symbol) = locate("tests/fixtures/plain_text.png", 1);
        let (_, mask) = symbol.read_format_info().unwrap();
        assert_eq!(symbol.extract_payload(mask).len(), 26);
    }
}
