//! Generalized exponential integral.

/// Exponential integral `E_n(x)` for `x >= 0`.
///
/// Uses the power series for `x <= 1` and a modified Lentz continued
/// fraction above, after Numerical Recipes §6.3.
pub(crate) fn expn(n: u32, x: f64) -> f64 {
    #![allow(clippy::excessive_precision)]
    const EULER: f64 = 0.5772156649015328606;
    const MAX_ITER: u32 = 200;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    if x.is_nan() || x < 0. {
        return f64::NAN;
    }
    if n == 0 {
        return (-x).exp() / x;
    }
    let nm1 = f64::from(n - 1);
    if x == 0. {
        return if n == 1 { f64::INFINITY } else { 1. / nm1 };
    }

    if x > 1. {
        let mut b = x + f64::from(n);
        let mut c = 1. / TINY;
        let mut d = 1. / b;
        let mut h = d;
        for i in 1..=MAX_ITER {
            let i = f64::from(i);
            let a = -i * (nm1 + i);
            b += 2.;
            d = 1. / (a * d + b);
            c = b + a / c;
            let delta = c * d;
            h *= delta;
            if (delta - 1.).abs() < EPS {
                break;
            }
        }
        h * (-x).exp()
    } else {
        let mut ans = if n == 1 { -x.ln() - EULER } else { 1. / nm1 };
        let mut fact = 1.;
        for i in 1..=MAX_ITER {
            fact *= -x / f64::from(i);
            let delta = if i != n - 1 {
                -fact / (f64::from(i) - nm1)
            } else {
                // Digamma of n
                let psi = -EULER + (1..n).map(|k| 1. / f64::from(k)).sum::<f64>();
                fact * (-x.ln() + psi)
            };
            ans += delta;
            if delta.abs() < ans.abs() * EPS {
                break;
            }
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn known_values() {
        // Reference values from Abramowitz & Stegun Table 5.1 / scipy.special.expn
        assert_relative_eq!(expn(2, 0.), 1.);
        assert_relative_eq!(expn(2, 0.5), 0.3266438623245, max_relative = 1e-10);
        assert_relative_eq!(expn(2, 1.), 0.1484955067759, max_relative = 1e-10);
        assert_relative_eq!(expn(2, 2.), 0.0375342618204, max_relative = 1e-10);
        assert_relative_eq!(expn(1, 1.), 0.2193839343956, max_relative = 1e-10);
    }

    #[test]
    fn recurrence() {
        // n E_{n+1}(x) = exp(-x) - x E_n(x)
        for x in [0.1, 0.9, 1.5, 7.] {
            assert_relative_eq!(
                expn(2, x),
                (-x).exp() - x * expn(1, x),
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn large_argument_vanishes() {
        assert!(expn(2, 800.) >= 0.);
        assert!(expn(2, 800.) < 1e-300);
    }
}
