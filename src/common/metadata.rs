use std::fmt::{Display, Formatter};

use super::codec::Mode;
use super::utils::{QRError, QRResult};

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn is_dark(self) -> bool {
        self == Self::Black
    }
}

impl From<bool> for Color {
    fn from(dark: bool) -> Self {
        if dark {
            Self::Black
        } else {
            Self::White
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    // Two bit indicator stored in format info
    pub fn from_info_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => Self::L,
            0b00 => Self::M,
            0b11 => Self::Q,
            _ => Self::H,
        }
    }

    pub fn info_bits(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct Version(usize);

impl Version {
    pub const MAX: usize = 40;

    pub fn new(ver: usize) -> QRResult<Self> {
        if (1..=Self::MAX).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(QRError::InvalidVersion)
        }
    }

    pub fn number(self) -> usize {
        self.0
    }

    pub fn width(self) -> usize {
        self.0 * 4 + 17
    }

    pub fn has_version_info(self) -> bool {
        self.0 >= 7
    }

    /// Centre coordinates of alignment patterns along one axis
    pub fn alignment_pattern(self) -> Vec<i32> {
        let ver = self.0 as i32;
        if ver == 1 {
            return Vec::new();
        }

        let n = ver / 7 + 2;
        let step = if ver == 32 { 26 } else { (ver * 4 + n * 2 + 1) / (n * 2 - 2) * 2 };

        let mut res = vec![6; n as usize];
        let mut pos = self.width() as i32 - 7;
        for p in res.iter_mut().skip(1).rev() {
            *p = pos;
            pos -= step;
        }
        res
    }

    /// Number of modules available for data and ec codewords
    pub fn raw_modules(self) -> usize {
        let ver = self.0;
        let mut res = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let n = ver / 7 + 2;
            res -= (25 * n - 10) * n - 55;
            if ver >= 7 {
                res -= 36;
            }
        }
        res
    }

    pub fn total_codewords(self) -> usize {
        self.raw_modules() >> 3
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        ECC_PER_BLOCK[self.0][ecl as usize]
    }

    pub fn block_count(self, ecl: ECLevel) -> usize {
        BLOCK_COUNT[self.0][ecl as usize]
    }

    pub fn data_codewords(self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ecl) * self.block_count(ecl)
    }

    /// Returns (short block count, short block length, long block count). Long blocks carry
    /// one extra data codeword.
    pub fn block_layout(self, ecl: ECLevel) -> (usize, usize, usize) {
        let total = self.total_codewords();
        let blk_cnt = self.block_count(ecl);
        let short_cnt = blk_cnt - total % blk_cnt;
        (short_cnt, total / blk_cnt, blk_cnt - short_cnt)
    }

    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        let grp = match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match mode {
            Mode::Numeric => [10, 12, 14][grp],
            Mode::Alphanumeric => [9, 11, 13][grp],
            Mode::Byte => [8, 16, 16][grp],
            Mode::Kanji => [8, 10, 12][grp],
            _ => 0,
        }
    }

    pub fn info(self) -> u32 {
        debug_assert!(self.has_version_info(), "Version info only exists from version 7");
        VERSION_INFOS[self.0 - 7]
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}", self.0)
    }
}

// Format & version info
//------------------------------------------------------------------------------

pub const FORMAT_MASK: u32 = 0x5412;

const fn format_info(data: u32) -> u32 {
    let mut rem = data;
    let mut i = 0;
    while i < 10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
        i += 1;
    }
    ((data << 10) | rem) ^ FORMAT_MASK
}

const fn version_info(ver: u32) -> u32 {
    let mut rem = ver;
    let mut i = 0;
    while i < 12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
        i += 1;
    }
    (ver << 12) | rem
}

const fn build_format_infos() -> [u32; 32] {
    let mut res = [0; 32];
    let mut i = 0;
    while i < 32 {
        res[i] = format_info(i as u32);
        i += 1;
    }
    res
}

const fn build_version_infos() -> [u32; 34] {
    let mut res = [0; 34];
    let mut i = 0;
    while i < 34 {
        res[i] = version_info(i as u32 + 7);
        i += 1;
    }
    res
}

// Indexed by the 5 data bits (ec level << 3 | mask)
pub static FORMAT_INFOS: [u32; 32] = build_format_infos();

// Indexed by version - 7
pub static VERSION_INFOS: [u32; 34] = build_version_infos();

// Format info coordinates, most significant bit first. Stored as (row, col); negative values
// wrap from the far edge.
pub static FORMAT_INFO_COORDS_MAIN: [(i32, i32); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub static FORMAT_INFO_COORDS_SIDE: [(i32, i32); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

// Version info coordinates, most significant bit first, as (row, col). The bottom left block
// is listed; the top right block is its transpose.
pub static VERSION_INFO_COORDS_BL: [(i32, i32); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

// Error correction tables, indexed by [version][ec level]
//------------------------------------------------------------------------------

static ECC_PER_BLOCK: [[usize; 4]; 41] = [
    [0, 0, 0, 0],
    [7, 10, 13, 17], [10, 16, 22, 28], [15, 26, 18, 22], [20, 18, 26, 16], [26, 24, 18, 22],
    [18, 16, 24, 28], [20, 18, 18, 26], [24, 22, 22, 26], [30, 22, 20, 24], [18, 26, 24, 28],
    [20, 30, 28, 24], [24, 22, 26, 28], [26, 22, 24, 22], [30, 24, 20, 24], [22, 24, 30, 24],
    [24, 28, 24, 30], [28, 28, 28, 28], [30, 26, 28, 28], [28, 26, 26, 26], [28, 26, 30, 28],
    [28, 26, 28, 30], [28, 28, 30, 24], [30, 28, 30, 30], [30, 28, 30, 30], [26, 28, 30, 30],
    [28, 28, 28, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30],
    [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30],
    [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30], [30, 28, 30, 30],
];

static BLOCK_COUNT: [[usize; 4]; 41] = [
    [0, 0, 0, 0],
    [1, 1, 1, 1], [1, 1, 1, 1], [1, 1, 2, 2], [1, 2, 2, 4], [1, 2, 4, 4],
    [2, 4, 4, 4], [2, 4, 6, 5], [2, 4, 6, 6], [2, 5, 8, 8], [4, 5, 8, 8],
    [4, 5, 8, 11], [4, 8, 10, 11], [4, 9, 12, 16], [4, 9, 16, 16], [6, 10, 12, 18],
    [6, 10, 17, 16], [6, 11, 16, 19], [6, 13, 18, 21], [7, 14, 21, 25], [8, 16, 20, 25],
    [8, 17, 23, 25], [9, 17, 23, 34], [9, 18, 25, 30], [10, 20, 27, 32], [12, 21, 29, 35],
    [12, 23, 34, 37], [12, 25, 34, 40], [13, 26, 35, 42], [14, 28, 38, 45], [15, 29, 40, 48],
    [16, 31, 43, 51], [17, 33, 45, 54], [18, 35, 48, 57], [19, 37, 51, 60], [19, 38, 53, 63],
    [20, 40, 56, 66], [21, 43, 59, 70], [22, 45, 62, 74], [24, 47, 65, 77], [25, 49, 68, 81],
];
