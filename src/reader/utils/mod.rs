use geometry::{Axis, Point};

use super::binarize::BinaryImage;

pub mod accumulate;
pub mod geometry;
pub mod homography;

// Validates a run length pattern centred on the seed along one axis. Used by the finder
// locator to cross check the 1:1:3:1:1 pattern vertically
//------------------------------------------------------------------------------

pub fn verify_pattern<A: Axis>(img: &BinaryImage, seed: &Point, pattern: &[u32], max_run: u32) -> bool {
    let Some(initial) = img.color_at(seed) else {
        return false;
    };
    let pat_len = pattern.len();
    let mid = pat_len / 2;

    let mut run_len = vec![0; pat_len];
    run_len[mid] = 1;

    for dir in [-1, 1] {
        let mut pos = *seed;
        let mut idx = mid;
        let mut last = initial;

        loop {
            A::shift(&mut pos, dir);
            if !A::bound_check(img, &pos) {
                break;
            }

            let Some(color) = img.color_at(&pos) else {
                break;
            };
            if color != last {
                if (dir < 0 && idx == 0) || (dir > 0 && idx == pat_len - 1) {
                    break;
                }
                idx = if dir < 0 { idx - 1 } else { idx + 1 };
                last = color;
            }

            run_len[idx] += 1;
            if run_len[idx] > max_run {
                return false;
            }
        }
    }

    is_ratio_match(&run_len, pattern)
}

// Checks the run lengths follow the pattern ratio within a tolerance of 3/4 of the unit run
pub fn is_ratio_match(run_len: &[u32], pattern: &[u32]) -> bool {
    if run_len.iter().any(|&r| r == 0) {
        return false;
    }

    let avg = run_len.iter().sum::<u32>() as f64 / pattern.iter().sum::<u32>() as f64;
    let tol = avg * 3.0 / 4.0;

    run_len.iter().zip(pattern).all(|(&rl, &p)| {
        let (rl, p) = (rl as f64, p as f64);
        p * avg - tol <= rl && rl <= p * avg + tol
    })
}

#[cfg(test)]
mod pattern_tests {
    use test_case::test_case;

    use super::is_ratio_match;

    #[test_case(&[2, 2, 6, 2, 2], true; "exact")]
    #[test_case(&[3, 2, 7, 1, 2], true; "within tolerance")]
    #[test_case(&[2, 2, 2, 2, 2], false; "uniform runs")]
    #[test_case(&[2, 0, 6, 2, 2], false; "missing run")]
    #[test_case(&[1, 1, 12, 1, 1], false; "stone too wide")]
    fn test_finder_ratio(runs: &[u32], exp: bool) {
        assert_eq!(is_ratio_match(runs, &[1, 1, 3, 1, 1]), exp);
    }
}
