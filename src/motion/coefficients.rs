//! Per-motor polynomial coefficients.

use heapless::Vec;

use crate::instruction::{DEGREE, MAX_MOTORS};

/// Fixed-point coefficients of `position(t) = linear·t + quadratic·t² + cubic·t³`.
///
/// Units are position-accumulator units: one step is `1 << (bit_shift + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coefficients {
    /// Coefficient of `t`.
    pub linear: i32,
    /// Coefficient of `t²`.
    pub quadratic: i32,
    /// Coefficient of `t³`.
    pub cubic: i32,
}

impl Coefficients {
    /// All-zero coefficients (no motion).
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Create coefficients from their three terms.
    #[inline]
    pub const fn new(linear: i32, quadratic: i32, cubic: i32) -> Self {
        Self {
            linear,
            quadratic,
            cubic,
        }
    }

    /// Pure velocity move.
    #[inline]
    pub const fn linear(linear: i32) -> Self {
        Self::new(linear, 0, 0)
    }

    /// Coefficients in wire order.
    #[inline]
    pub const fn to_words(self) -> [u32; DEGREE] {
        [self.linear as u32, self.quadratic as u32, self.cubic as u32]
    }

    /// Rebuild from wire-order words.
    #[inline]
    pub const fn from_words(words: [u32; DEGREE]) -> Self {
        Self::new(words[0] as i32, words[1] as i32, words[2] as i32)
    }

    /// Closed-form evaluation at tick `t`, for checking the recurrence.
    pub fn evaluate(&self, t: i64) -> i64 {
        let a1 = self.linear as i64;
        let a2 = self.quadratic as i64;
        let a3 = self.cubic as i64;
        ((a3 * t + a2) * t + a1) * t
    }
}

/// Coefficients for every motor of one move, filled word by word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientVector {
    motors: Vec<Coefficients, MAX_MOTORS>,
}

impl CoefficientVector {
    /// Zeroed vector for `motors` motors (clamped to [`MAX_MOTORS`]).
    pub fn zeroed(motors: usize) -> Self {
        let mut v = Vec::new();
        for _ in 0..motors.min(MAX_MOTORS) {
            let _ = v.push(Coefficients::ZERO);
        }
        Self { motors: v }
    }

    /// Build from a slice of per-motor coefficients.
    pub fn from_slice(coefficients: &[Coefficients]) -> Self {
        let mut v = Vec::new();
        for c in coefficients.iter().take(MAX_MOTORS) {
            let _ = v.push(*c);
        }
        Self { motors: v }
    }

    /// Number of motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Number of coefficient words (`motors × 3`).
    #[inline]
    pub fn word_count(&self) -> usize {
        self.motors.len() * DEGREE
    }

    /// Coefficients of one motor.
    #[inline]
    pub fn motor(&self, index: usize) -> Option<&Coefficients> {
        self.motors.get(index)
    }

    /// All motors in order.
    #[inline]
    pub fn as_slice(&self) -> &[Coefficients] {
        &self.motors
    }

    /// Store coefficient word `index` in wire order.
    ///
    /// Word `3m` is motor `m`'s linear term, `3m + 1` quadratic, `3m + 2` cubic.
    /// Out-of-range indices are ignored.
    pub fn set_word(&mut self, index: usize, word: u32) {
        let Some(c) = self.motors.get_mut(index / DEGREE) else {
            return;
        };
        let value = word as i32;
        match index % DEGREE {
            0 => c.linear = value,
            1 => c.quadratic = value,
            _ => c.cubic = value,
        }
    }

    /// Read coefficient word `index` in wire order.
    pub fn word(&self, index: usize) -> Option<u32> {
        self.motors
            .get(index / DEGREE)
            .map(|c| c.to_words()[index % DEGREE])
    }

    /// Zero every coefficient, keeping the motor count.
    pub fn clear(&mut self) {
        for c in self.motors.iter_mut() {
            *c = Coefficients::ZERO;
        }
    }
}
