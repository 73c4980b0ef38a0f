// A complex polynomial held as real coefficients in ascending power order
// along with the coefficients of its derivative.
//
// The derivative coefficients are worked out once at construction so the
// iteration loop never re-differentiates.

use std::fmt;
use std::io::{Error, ErrorKind};

use json::JsonValue;
use num::complex::Complex64;

#[derive(Clone, PartialEq, Debug)]
pub struct Polynomial {
    coefficients : Vec<f64>,
    derivative : Vec<f64>
}

fn differentiate(coefficients : &[f64]) -> Vec<f64> {
    coefficients.iter().enumerate().skip(1).map(
        |(i, v)| (i as f64) * v
    ).collect()
}

impl Polynomial {
    pub fn new(coefficients : Vec<f64>) -> Polynomial {
        let derivative = differentiate(&coefficients);
        Polynomial { coefficients : coefficients, derivative : derivative }
    }

    // Json lists coefficients highest power first
    pub fn from_json(input : &JsonValue) -> std::io::Result<Polynomial> {
        if !input.is_array() {
            return Err(Error::new(ErrorKind::InvalidData, "Missing coefficients"))
        }
        let coefficients : Vec<f64> = input.members().filter_map(|i| i.as_f64()).rev().collect();
        Ok(Polynomial::new(coefficients))
    }

    // Coefficients drawn uniformly from [-10, 10); the leading one is
    // pinned away from zero to keep the requested degree
    pub fn random<Rng>(degree : usize, rng : &mut Rng) -> Polynomial
        where Rng : rand::Rng
    {
        let mut coefficients : Vec<f64> = (0..=degree).map(
            |_| rng.gen_range(-10.0..10.0)
        ).collect();
        if let Some(leading) = coefficients.last_mut() {
            if *leading == 0.0 {
                *leading = 1.0;
            }
        }
        Polynomial::new(coefficients)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    // The precomputed derivative; for a constant this is the zero polynomial
    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(self.derivative.clone())
    }

    pub fn evaluate(&self, z : Complex64) -> Complex64 {
        let mut acc = Complex64::new(0.0, 0.0);
        let mut curr_pow = Complex64::new(1.0, 0.0);
        for &coeff in self.coefficients.iter() {
            acc += coeff * curr_pow;
            curr_pow *= z;
        }
        acc
    }

    pub fn evaluate_many(&self, points : &[Complex64]) -> Vec<Complex64> {
        points.iter().map(|&z| self.evaluate(z)).collect()
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        if self.coefficients.is_empty() {
            return write!(f, "0")
        }
        let terms : Vec<String> = self.coefficients.iter().enumerate().map(
            |(power, coeff)| match power {
                0 => format!("{}", coeff),
                1 => format!("{}·z", coeff),
                _ => format!("{}·z^{}", coeff, power)
            }
        ).collect();
        write!(f, "{}", terms.join(" + "))
    }
}
