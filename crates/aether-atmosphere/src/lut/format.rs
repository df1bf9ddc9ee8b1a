//! Plain-text LUT persistence.
//!
//! ```text
//! Nh Ns Nv
//! h_norm s_norm v_norm planet_norm atmosphere_norm R G B A
//! ...
//! ```
//!
//! Cells follow in height, sun angle, view angle order. Radii are divided by
//! the scaled Earth radius so tables from different planets are comparable.

use std::io::Write;

use aether_math::DVec4;

use super::atof::fast_atof;
use super::{LutDims, ScatteringLut, fraction};
use crate::error::LutError;

const FIELDS: usize = 9;

pub(super) fn write_lut<W: Write>(lut: &ScatteringLut, out: &mut W) -> std::io::Result<()> {
    let dims = lut.dims();
    writeln!(out, "{} {} {}", dims.heights, dims.sun_angles, dims.view_angles)?;
    let (planet, atmosphere) = lut.normalized_radii();
    for ih in 0..dims.heights {
        for is in 0..dims.sun_angles {
            for iv in 0..dims.view_angles {
                let cell = lut.cell(ih, is, iv);
                writeln!(
                    out,
                    "{} {} {} {} {} {} {} {} {}",
                    fraction(ih, dims.heights),
                    fraction(is, dims.sun_angles),
                    fraction(iv, dims.view_angles),
                    planet,
                    atmosphere,
                    cell.x,
                    cell.y,
                    cell.z,
                    cell.w,
                )?;
            }
        }
    }
    Ok(())
}

pub(super) fn parse_lut(text: &str) -> Result<ScatteringLut, LutError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(LutError::Header(String::new()));
    };
    let dims = parse_header(header)?;
    let expected = dims.len();

    let mut cells = Vec::with_capacity(expected);
    let mut radii = (0.0, 0.0);
    for (line_number, line) in lines.take(expected) {
        let mut values = [0.0; FIELDS];
        let mut count = 0;
        for token in line.split_ascii_whitespace() {
            if count == FIELDS {
                return Err(LutError::Cell { line: line_number });
            }
            values[count] = fast_atof(token).ok_or(LutError::Cell { line: line_number })?;
            count += 1;
        }
        if count != FIELDS {
            return Err(LutError::Cell { line: line_number });
        }
        if cells.is_empty() {
            radii = (values[3], values[4]);
        }
        cells.push(DVec4::new(values[5], values[6], values[7], values[8]));
    }

    if cells.len() < expected {
        return Err(LutError::Truncated {
            expected,
            found: cells.len(),
        });
    }
    Ok(ScatteringLut::from_parts(dims, cells, radii))
}

fn parse_header(line: &str) -> Result<LutDims, LutError> {
    let malformed = || LutError::Header(line.to_owned());
    let mut fields = line.split_ascii_whitespace().map(|token| token.parse::<usize>());
    let mut next = || match fields.next() {
        Some(Ok(value)) if value > 0 => Ok(value),
        _ => Err(malformed()),
    };
    let dims = LutDims {
        heights: next()?,
        sun_angles: next()?,
        view_angles: next()?,
    };
    if fields.next().is_some() {
        return Err(malformed());
    }
    dims.heights
        .checked_mul(dims.sun_angles)
        .and_then(|n| n.checked_mul(dims.view_angles))
        .ok_or_else(malformed)?;
    Ok(dims)
}
