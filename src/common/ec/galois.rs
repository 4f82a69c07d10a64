use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

// Galois field GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

const PRIMITIVE: u16 = 0x11d;

const fn build_exp_table() -> [u8; 255] {
    let mut exp = [0u8; 255];
    let mut v: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = v as u8;
        v <<= 1;
        if v & 0x100 != 0 {
            v ^= PRIMITIVE;
        }
        i += 1;
    }
    exp
}

const fn build_log_table(exp: &[u8; 255]) -> [u8; 256] {
    let mut log = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        log[exp[i] as usize] = i as u8;
        i += 1;
    }
    log
}

static EXP_TABLE: [u8; 255] = build_exp_table();
static LOG_TABLE: [u8; 256] = build_log_table(&build_exp_table());

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct G(pub u8);

impl G {
    /// Returns alpha^pow
    pub fn gen_pow(pow: usize) -> Self {
        Self(EXP_TABLE[pow % 255])
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Sub for G {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Mul for G {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self(0);
        }
        let pow = LOG_TABLE[self.0 as usize] as usize + LOG_TABLE[rhs.0 as usize] as usize;
        Self::gen_pow(pow)
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        debug_assert!(!rhs.is_zero(), "Division by zero in GF(256)");

        if self.is_zero() {
            return Self(0);
        }
        let pow = LOG_TABLE[self.0 as usize] as usize + 255 - LOG_TABLE[rhs.0 as usize] as usize;
        Self::gen_pow(pow)
    }
}
