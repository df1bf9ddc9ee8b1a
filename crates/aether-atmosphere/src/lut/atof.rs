/// Significant digits kept in the integer mantissa. `10^19 < 2^64`.
const MAX_DIGITS: u32 = 19;

/// Exact powers of ten representable in an `f64`.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Parse an ASCII decimal such as `-12.5`, `0.000314` or `6.02e23`.
///
/// Leading zeros are skipped and at most 19 significant digits are kept,
/// which is within a few ulps of the correctly rounded value. Returns `None`
/// for anything that is not a complete number.
pub fn fast_atof(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut mantissa: u64 = 0;
    let mut digits = 0u32;
    let mut exponent: i32 = 0;
    let mut seen_digit = false;

    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        if digits < MAX_DIGITS {
            if mantissa != 0 || b != b'0' {
                mantissa = mantissa * 10 + u64::from(b - b'0');
                digits += 1;
            }
        } else {
            exponent += 1;
        }
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while let Some(&b) = bytes.get(pos) {
            if !b.is_ascii_digit() {
                break;
            }
            seen_digit = true;
            if digits < MAX_DIGITS {
                if mantissa != 0 || b != b'0' {
                    mantissa = mantissa * 10 + u64::from(b - b'0');
                    digits += 1;
                }
                exponent -= 1;
            }
            pos += 1;
        }
    }

    if !seen_digit {
        return None;
    }

    if let Some(b'e' | b'E') = bytes.get(pos) {
        pos += 1;
        let exp_negative = match bytes.get(pos) {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };
        let start = pos;
        let mut value: i32 = 0;
        while let Some(&b) = bytes.get(pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.saturating_mul(10).saturating_add(i32::from(b - b'0'));
            pos += 1;
        }
        if pos == start {
            return None;
        }
        exponent = exponent.saturating_add(if exp_negative { -value } else { value });
    }

    if pos != bytes.len() {
        return None;
    }

    let mut value = mantissa as f64;
    if mantissa != 0 {
        value = scale(value, exponent);
    }
    Some(if negative { -value } else { value })
}

fn scale(mut value: f64, exponent: i32) -> f64 {
    // Anything past this under- or overflows for a 19 digit mantissa.
    let mut exponent = exponent.clamp(-400, 400);
    while exponent > 22 {
        value *= POW10[22];
        exponent -= 22;
    }
    while exponent < -22 {
        value /= POW10[22];
        exponent += 22;
    }
    if exponent >= 0 {
        value * POW10[exponent as usize]
    } else {
        value / POW10[(-exponent) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_std_parser() {
        for text in [
            "0",
            "1",
            "-1",
            "0.5",
            "3.141592653589793",
            "0.000012345678901234567",
            "123456789012345678901234",
            "6360000",
            "1e-7",
            "2.5E+3",
            "-0.0",
            "0.015873015873015872",
        ] {
            let expected: f64 = text.parse().unwrap();
            let parsed = fast_atof(text).unwrap();
            let tolerance = expected.abs() * 1e-15;
            assert!(
                (parsed - expected).abs() <= tolerance,
                "{text}: {parsed} vs {expected}"
            );
        }
    }

    #[test]
    fn test_round_trips_display() {
        for value in [0.1_f64, 1.0 / 3.0, 24.123456789, 1.5e-20, 2.0e-5] {
            let parsed = fast_atof(&value.to_string()).unwrap();
            assert!((parsed - value).abs() <= value.abs() * 1e-15, "{value}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["", "-", ".", "1.2.3", "abc", "1e", "1e+", "12x", "--1"] {
            assert_eq!(fast_atof(text), None, "{text:?}");
        }
    }

    #[test]
    fn test_sign_of_zero() {
        assert!(fast_atof("-0").unwrap().is_sign_negative());
        assert_eq!(fast_atof("+0.000"), Some(0.0));
    }
}
