mod binarize;
mod finder;
mod symbol;
mod utils;

use image::GrayImage;
use tracing::{debug, trace};

use crate::common::{
    codec::decode,
    ec::Block,
    metadata::{ECLevel, Version},
    utils::{QRError, QRResult},
};
pub use binarize::BinaryImage;
use finder::{group_finders, locate_finders, FinderGroup};
use symbol::{estimate_version, Symbol, SymbolLocation};

pub struct QRReader();

impl QRReader {
    /// Binarizes the image adaptively and decodes the first readable symbol
    pub fn read(img: &GrayImage) -> QRResult<String> {
        Self::read_binary(BinaryImage::prepare(img))
    }

    /// Decodes the first readable symbol from an already binarized image
    pub fn read_binary(mut img: BinaryImage) -> QRResult<String> {
        trace!("Locating finders...");
        let finders = locate_finders(&mut img);

        trace!("Grouping finders...");
        let groups = group_finders(&finders);
        debug!(finders = finders.len(), groups = groups.len(), "Finder search done");

        let mut last_err = QRError::SymbolNotFound;
        for g in groups {
            match read_group(&mut img, &g) {
                Ok(msg) => return Ok(msg),
                Err(e) => {
                    trace!(error = %e, score = g.score, "Finder group rejected");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

// Tries the estimated version and its neighbours. For version 7 and above the version info
// read from the symbol takes precedence
fn read_group(img: &mut BinaryImage, group: &FinderGroup) -> QRResult<String> {
    let est = estimate_version(group);
    let mut candidates = vec![est, est - 1, est + 1];
    let mut tried = Vec::with_capacity(4);
    let mut last_err = QRError::SymbolNotFound;

    while !candidates.is_empty() {
        let v = candidates.remove(0);
        if tried.contains(&v) {
            continue;
        }
        tried.push(v);
        let Ok(ver) = Version::new(v) else {
            continue;
        };

        let loc = match SymbolLocation::locate(img, group, ver) {
            Ok(loc) => loc,
            Err(e) => {
                last_err = e;
                continue;
            }
        };
        let symbol = Symbol::sample(img, &loc);

        if ver.has_version_info() {
            if let Ok(read_ver) = symbol.read_version_info() {
                if read_ver != ver {
                    candidates.insert(0, read_ver.number());
                    continue;
                }
            }
        }

        match read_symbol(&symbol) {
            Ok(msg) => return Ok(msg),
            Err(e) => last_err = e,
        }
    }

    Err(last_err)
}

fn read_symbol(symbol: &Symbol) -> QRResult<String> {
    let ver = symbol.ver;
    let (ecl, mask) = symbol.read_format_info()?;
    debug!(version = %ver, ec_level = %ecl, mask = *mask, "Symbol located");

    let pld = symbol.extract_payload(mask);

    let mut data = Vec::with_capacity(ver.data_codewords(ecl));
    for mut blk in deinterleave(&pld, ver, ecl) {
        data.extend_from_slice(blk.rectify()?);
    }

    decode(&data, ver)
}

// Splits interleaved codewords into blocks. Short blocks come first and long blocks carry one
// extra data codeword
fn deinterleave(data: &[u8], ver: Version, ecl: ECLevel) -> Vec<Block> {
    let (short_cnt, short_len, long_cnt) = ver.block_layout(ecl);
    let ec_len = ver.ecc_per_block(ecl);
    let short_dlen = short_len - ec_len;

    let mut dilvd: Vec<Vec<u8>> = vec![Vec::with_capacity(short_len + 1); short_cnt + long_cnt];
    let mut it = data.iter();

    // Deinterleaving data
    for i in 0..=short_dlen {
        for (j, blk) in dilvd.iter_mut().enumerate() {
            if i == short_dlen && j < short_cnt {
                continue;
            }
            blk.extend(it.next());
        }
    }

    // Deinterleaving ecc
    for _ in 0..ec_len {
        for blk in dilvd.iter_mut() {
            blk.extend(it.next());
        }
    }

    dilvd.iter().map(|b| Block::with_encoded(b, b.len() - ec_len)).collect()
}

#[cfg(test)]
mod reader_tests {
    use image::{GrayImage, Luma};

    use super::{deinterleave, QRReader};
    use crate::common::metadata::{ECLevel, Version};
    use crate::common::utils::QRError;

    #[test]
    fn test_deinterleave() {
        // 5-Q has 2 blocks of 15 and 2 blocks of 16 data codewords, each with 18 ec codewords
        let ver = Version::new(5).unwrap();
        let data: Vec<u8> = (0..134).collect();
        let blks = deinterleave(&data, ver, ECLevel::Q);

        assert_eq!(blks.len(), 4);
        let exp_data0: Vec<u8> = (0..15).map(|i| i * 4).collect();
        let exp_data2: Vec<u8> = (0..15).map(|i| i * 4 + 2).chain([60]).collect();
        assert_eq!(blks[0].data(), exp_data0);
        assert_eq!(blks[2].data(), exp_data2);
        assert_eq!(blks[3].data().last(), Some(&61));
        assert_eq!(blks[0].full()[15], 62);
        assert_eq!(blks[3].full().last(), Some(&133));
        assert!(blks.iter().all(|b| b.ec_len() == 18));
    }

    #[test]
    fn test_deinterleave_single_block() {
        let ver = Version::new(1).unwrap();
        let data: Vec<u8> = (0..26).collect();
        let blks = deinterleave(&data, ver, ECLevel::M);
        assert_eq!(blks.len(), 1);
        assert_eq!(blks[0].data(), &data[..16]);
    }

    #[test]
    fn test_read_blank_image() {
        let img = GrayImage::from_pixel(64, 64, Luma([255]));
        assert_eq!(QRReader::read(&img), Err(QRError::SymbolNotFound));
    }
}
