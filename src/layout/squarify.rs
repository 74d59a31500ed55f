use super::{BoundingBox, StripAxis};

/// Longest strip considered when growing a row (cap for speed).
const MAX_STRIP_LEN: usize = 20;
const EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Positioned {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Squarified strip layout that keeps input order.
///
/// `areas` must already be in rank order and sum to the box area. Strips are
/// grown greedily while the worst aspect ratio in the strip improves. The last
/// strip takes whatever extent is left and the last tile in every strip takes
/// whatever length is left, so rounding never leaves a gap or overlap.
pub(crate) fn squarify(areas: &[f64], bbox: BoundingBox, axis: StripAxis) -> Vec<Positioned> {
    let mut result = Vec::with_capacity(areas.len());
    let BoundingBox {
        mut x,
        mut y,
        width: mut w,
        height: mut h,
    } = bbox;

    let mut start = 0;
    while start < areas.len() {
        let remaining = &areas[start..];

        // A "row" spans the full remaining width and consumes height.
        let row_spans_width = match axis {
            StripAxis::Alternate => w < h,
            StripAxis::Rows => true,
            StripAxis::Columns => false,
        };
        let side = if row_spans_width { w } else { h };

        // Find best strip length
        let mut best_score = f64::INFINITY;
        let mut best_k = 1;
        let mut strip_sum = remaining[0];
        let mut sum = 0.0;
        for k in 1..=remaining.len().min(MAX_STRIP_LEN) {
            sum += remaining[k - 1];
            let score = worst_aspect_ratio(&remaining[..k], sum, side);
            if score < best_score {
                best_score = score;
                best_k = k;
                strip_sum = sum;
            } else {
                break;
            }
        }

        let strip = &remaining[..best_k];
        let is_last_strip = start + best_k == areas.len();
        let thickness = if is_last_strip {
            if row_spans_width {
                h
            } else {
                w
            }
        } else {
            strip_sum / side.max(EPS)
        };

        let mut offset = 0.0;
        for (i, &area) in strip.iter().enumerate() {
            let length = if i + 1 == strip.len() {
                (side - offset).max(0.0)
            } else {
                area / thickness.max(EPS)
            };

            let pos = if row_spans_width {
                Positioned {
                    x: x + offset,
                    y,
                    w: length,
                    h: thickness,
                }
            } else {
                Positioned {
                    x,
                    y: y + offset,
                    w: thickness,
                    h: length,
                }
            };
            result.push(pos);
            offset += length;
        }

        // Shrink remaining space
        if row_spans_width {
            y += thickness;
            h = (h - thickness).max(0.0);
        } else {
            x += thickness;
            w = (w - thickness).max(0.0);
        }

        start += best_k;
    }

    result
}

/// Worst (largest) aspect ratio among tiles of `row` laid along `side`.
fn worst_aspect_ratio(row: &[f64], sum: f64, side: f64) -> f64 {
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().copied().fold(0.0, f64::max);
    let min_r = row.iter().copied().fold(f64::INFINITY, f64::min);
    if min_r <= 0.0 {
        return f64::MAX;
    }
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}
