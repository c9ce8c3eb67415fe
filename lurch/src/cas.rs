//! Computer algebra.

use crate::Expr;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// A system that decides relations between expressions.
pub trait Cas {
    /// Decide whether a relation such as `(= a b)` holds,
    /// returning `None` if the system cannot decide it.
    fn decide(&self, e: &Expr) -> Option<bool>;
}

/// Exact arithmetic on rational numbers.
///
/// ~~~
/// # use lurch::{cas::{Arithmetic, Cas}, Document};
/// let doc = Document::parse("(= (+ 1 (/ 1 2)) 1.5) (< (^ 2 10) 1000) (= x 1)")?;
/// let decided: Vec<_> = doc
///     .children(doc.root())
///     .iter()
///     .map(|c| Arithmetic.decide(doc.expr(*c).unwrap()))
///     .collect();
/// assert_eq!(decided, [Some(true), Some(false), None]);
/// # Ok::<_, lurch::Error>(())
/// ~~~
#[derive(Copy, Clone, Debug, Default)]
pub struct Arithmetic;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Ratio {
    num: i128,
    /// positive, coprime with the numerator
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs()
}

impl Ratio {
    const ZERO: Self = Self { num: 0, den: 1 };
    const ONE: Self = Self { num: 1, den: 1 };

    fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den);
        let sign = den.signum();
        Some(Self {
            num: num.checked_div(g)?.checked_mul(sign)?,
            den: den.checked_div(g)?.checked_mul(sign)?,
        })
    }

    /// Parse integers and decimals such as `-1.25`.
    fn parse(s: &str) -> Option<Self> {
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        let digits: i128 = [int, frac].concat().parse().ok()?;
        Self::new(digits, 10i128.checked_pow(frac.len() as u32)?)
    }

    fn add(self, o: Self) -> Option<Self> {
        let num = self.num.checked_mul(o.den)?.checked_add(o.num.checked_mul(self.den)?)?;
        Self::new(num, self.den.checked_mul(o.den)?)
    }

    fn neg(self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    fn mul(self, o: Self) -> Option<Self> {
        Self::new(self.num.checked_mul(o.num)?, self.den.checked_mul(o.den)?)
    }

    fn recip(self) -> Option<Self> {
        Self::new(self.den, self.num)
    }

    fn pow(self, exp: Self) -> Option<Self> {
        let times = exp.num.unsigned_abs();
        if exp.den != 1 || times > 128 {
            return None;
        }
        let base = if exp.num < 0 { self.recip()? } else { self };
        (0..times).try_fold(Self::ONE, |acc, _| acc.mul(base))
    }

    fn compare(self, o: Self) -> Option<Ordering> {
        Some(self.num.checked_mul(o.den)?.cmp(&o.num.checked_mul(self.den)?))
    }
}

impl Arithmetic {
    fn eval(&self, e: &Expr) -> Option<Ratio> {
        match e {
            Expr::Number(n) => Ratio::parse(n),
            Expr::Apply(items) => {
                let (head, args) = items.split_first()?;
                let args: Vec<Ratio> = args.iter().map(|a| self.eval(a)).collect::<Option<_>>()?;
                match (head.get_symbol()?, args.as_slice()) {
                    ("+", args) => args.iter().try_fold(Ratio::ZERO, |acc, x| acc.add(*x)),
                    ("-", [x]) => x.neg(),
                    ("-", [x, y]) => x.add(y.neg()?),
                    ("*" | "·" | "×", args) => args.iter().try_fold(Ratio::ONE, |acc, x| acc.mul(*x)),
                    ("/" | "÷", [x, y]) => x.mul(y.recip()?),
                    ("^", [x, y]) => x.pow(*y),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Cas for Arithmetic {
    fn decide(&self, e: &Expr) -> Option<bool> {
        let (head, args) = e.get_apply()?;
        let rel = head.get_symbol()?;
        if let ("¬" | "not", [arg]) = (rel, args) {
            return self.decide(arg).map(|b| !b);
        }

        let vals: Vec<Ratio> = args.iter().map(|a| self.eval(a)).collect::<Option<_>>()?;
        let ords: Vec<Ordering> = vals.windows(2).map(|w| w[0].compare(w[1])).collect::<Option<_>>()?;
        if ords.is_empty() {
            return None;
        }
        let all = |f: fn(Ordering) -> bool| Some(ords.iter().all(|o| f(*o)));
        match rel {
            "=" => all(Ordering::is_eq),
            "≠" | "!=" if ords.len() == 1 => all(Ordering::is_ne),
            "<" => all(Ordering::is_lt),
            ">" => all(Ordering::is_gt),
            "≤" | "<=" => all(Ordering::is_le),
            "≥" | ">=" => all(Ordering::is_ge),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expr;

    fn decide(s: &str) -> Option<bool> {
        Arithmetic.decide(&parse_expr(s))
    }

    #[test]
    fn relations() {
        assert_eq!(decide("(= (* 2 3) 6 (+ 1 5))"), Some(true));
        assert_eq!(decide("(= (- 1) (- 0 1))"), Some(true));
        assert_eq!(decide("(= (/ 1 3) 0.33)"), Some(false));
        assert_eq!(decide("(≠ 1 2)"), Some(true));
        assert_eq!(decide("(≤ 1 1 2)"), Some(true));
        assert_eq!(decide("(¬ (> 1 2))"), Some(true));
        assert_eq!(decide("(= (^ 2 -2) 0.25)"), Some(true));
    }

    #[test]
    fn inapplicable() {
        assert_eq!(decide("(= x 1)"), None);
        assert_eq!(decide("(= (/ 1 0) 1)"), None);
        assert_eq!(decide("(f 1 2)"), None);
        assert_eq!(decide("(= 1)"), None);
        // exponents are bounded, even the smallest one
        assert_eq!(decide("(= (^ 2 200) 1)"), None);
        assert_eq!(decide("(= (^ 2 -170141183460469231731687303715884105728) 1)"), None);
    }
}
