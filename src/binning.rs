//! Default histogram binning for fields without a hand-written plot.

use std::f64::consts::PI;

use anyhow::Result;

use crate::plot::PlotSpec;
use crate::schema::{Field, SIZE_ENTRY};
use crate::source::SchemaSource;

const DEFAULT_BINS: u32 = 20;
const MAX_COUNT_BINS: f64 = 40.0;
/// Integer ranges narrower than this get one bin per value.
const MAX_INTEGER_SPAN: f64 = 20.0;
/// Lower edges below this fraction of the upper edge are moved to zero.
const ZERO_CLAMP_RATIO: f64 = 0.03;

/// Round `x` away from zero to a "nice" axis edge: one significant digit,
/// or a multiple of 5 in the second digit when the leading pair exceeds 30.
///
/// ```
/// use dqm_autoplot::binning::smart_round;
/// assert_eq!(smart_round(37.0), 40.0);
/// assert_eq!(smart_round(-0.37), -0.4);
/// ```
pub fn smart_round(x: f64) -> f64 {
    if x.abs() <= 1e-7 {
        return 0.0;
    }
    if x < 0.0 {
        return -smart_round(-x);
    }
    let shift = 10f64.powi(x.log10().ceil() as i32 - 1);
    let mut u = x / shift;
    u = if u > 30.0 { 5.0 * (u / 5.0).ceil() } else { u.ceil() };
    u * shift
}

/// Default plot for `field`, shown under `name`.
///
/// `column` is the field's suffix within its group (`@size` for the
/// group's counter). Value ranges are only read when needed.
pub fn auto_plot(
    name: &str,
    column: &str,
    field: &Field,
    source: &dyn SchemaSource,
) -> Result<PlotSpec> {
    if field.leaf_type.is_bool() {
        return Ok(PlotSpec::plot1d(name, column, 2, -0.5, 1.5));
    }

    let (mut min, mut max) = source.extent(&field.name)?;
    tracing::trace!(field = %field.name, min, max, "observed range");

    if column == SIZE_ENTRY {
        let nbins = (max + 1.0).min(MAX_COUNT_BINS) as u32;
        return Ok(PlotSpec::count1d(name, nbins, -0.5, max + 0.5));
    }
    if field.leaf_type.is_integer() && name.contains("Idx") {
        return Ok(PlotSpec::none(name));
    }

    if !field.leaf_type.is_floating() {
        min = min.trunc();
        max = max.trunc();
        if max - min < MAX_INTEGER_SPAN {
            let nbins = (max - min + 1.0) as u32;
            return Ok(PlotSpec::plot1d(name, column, nbins, min - 0.5, max + 0.5));
        }
    } else if name == "phi" {
        return Ok(PlotSpec::plot1d(name, column, DEFAULT_BINS, -PI, PI));
    }

    if min < 0.0 && max > 0.0 {
        (min, max) = (min.min(-max), max.max(-min));
    } else if max > 0.0 && min / max < ZERO_CLAMP_RATIO {
        min = 0.0;
    }
    Ok(PlotSpec::plot1d(
        name,
        column,
        DEFAULT_BINS,
        smart_round(min),
        smart_round(max),
    ))
}
