use super::{galois::G, Block, MAX_EC_SIZE};
use crate::common::utils::{QRError, QRResult};

// Rectifier
// Codewords are read as a polynomial with the first byte as the highest degree coefficient.
// Syndromes are evaluated at alpha^0..alpha^(ec_len - 1)
//------------------------------------------------------------------------------

impl Block {
    pub fn rectify(&mut self) -> QRResult<&[u8]> {
        // Compute syndromes
        let synd = match self.syndromes() {
            Ok(()) => return Ok(self.data()),
            Err(s) => s,
        };
        let ec_len = self.ec_len();

        // Error locator polynomial
        let (sig, deg) = berlekamp_massey(&synd, ec_len);
        if 2 * deg > ec_len {
            return Err(QRError::TooManyError);
        }

        // Sigma derivative. Even powers vanish in characteristic 2
        let mut dsig = [G(0); MAX_EC_SIZE];
        for i in (1..=deg).step_by(2) {
            dsig[i - 1] = sig[i];
        }

        // Error evaluator
        let omg = omega(&synd, &sig, ec_len, deg);

        // Chien search & Forney
        let mut found = 0;
        for pow in 0..self.len {
            let xinv = G::gen_pow(255 - pow);
            if !eval_poly(&sig[..=deg], xinv).is_zero() {
                continue;
            }
            found += 1;

            let den = eval_poly(&dsig[..deg], xinv);
            if den.is_zero() {
                return Err(QRError::TooManyError);
            }
            let num = G::gen_pow(pow) * eval_poly(&omg[..ec_len], xinv);
            let idx = self.len - 1 - pow;
            self.data[idx] = (G(self.data[idx]) + num / den).into();
        }

        if found != deg {
            return Err(QRError::TooManyError);
        }

        match self.syndromes() {
            Ok(()) => Ok(self.data()),
            Err(_) => Err(QRError::TooManyError),
        }
    }

    fn syndromes(&self) -> Result<(), [G; MAX_EC_SIZE]> {
        let mut synd = [G(0); MAX_EC_SIZE];

        for (i, s) in synd.iter_mut().take(self.ec_len()).enumerate() {
            let x = G::gen_pow(i);
            *s = self.full().iter().fold(G(0), |acc, &b| acc * x + G(b));
        }

        if synd.iter().all(|s| s.is_zero()) {
            Ok(())
        } else {
            Err(synd)
        }
    }
}

// Sigma polynomial, lowest degree first. Returns the polynomial and its degree
fn berlekamp_massey(synd: &[G; MAX_EC_SIZE], ec_len: usize) -> ([G; MAX_EC_SIZE], usize) {
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G(1);
    let mut cx = [G(0); MAX_EC_SIZE];
    let mut bx = [G(0); MAX_EC_SIZE];
    cx[0] = G(1);
    bx[0] = G(1);

    for n in 0..ec_len {
        // Calculate discrepancy
        let mut d = synd[n];
        for i in 1..=l {
            d += cx[i] * synd[n - i];
        }

        if d.is_zero() {
            m += 1;
            continue;
        }

        let tx = cx;
        let scale = d / b;
        for i in 0..MAX_EC_SIZE - m {
            cx[i + m] += scale * bx[i];
        }

        if 2 * l <= n {
            bx = tx;
            l = n + 1 - l;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }
    (cx, l)
}

// Error evaluator polynomial: S(x) * Sigma(x) mod x^ec_len
fn omega(synd: &[G; MAX_EC_SIZE], sig: &[G; MAX_EC_SIZE], ec_len: usize, deg: usize) -> [G; MAX_EC_SIZE] {
    let mut omg = [G(0); MAX_EC_SIZE];
    for (i, o) in omg.iter_mut().take(ec_len).enumerate() {
        for j in 0..=i.min(deg) {
            *o += synd[i - j] * sig[j];
        }
    }
    omg
}

// Lowest degree coefficient first
fn eval_poly(poly: &[G], x: G) -> G {
    poly.iter().rev().fold(G(0), |acc, &c| acc * x + c)
}

// Rectifier for format and version infos
//------------------------------------------------------------------------------

pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> QRResult<u32> {
    let res = valid_numbers
        .iter()
        .copied()
        .min_by_key(|&n| (info ^ n).count_ones())
        .ok_or(QRError::InvalidInfo)?;

    if (info ^ res).count_ones() <= err_capacity {
        Ok(res)
    } else {
        Err(QRError::InvalidInfo)
    }
}
