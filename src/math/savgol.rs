//! Savitzky–Golay smoothing.
//!
//! Each output point is the value, at that point's position, of a degree
//! `poly_order` polynomial fitted by least squares to a `window_size` window
//! of inputs.
//!
//! For a fixed window the fit-then-evaluate step is linear in the inputs, so
//! we precompute the hat matrix `H = V · pinv(V)` once (`V` is the Vandermonde
//! matrix of centred positions `-h..=h`). Row `k` of `H` gives the smoothed
//! value at window position `k`:
//!
//! - interior points use the centre row on the window centred on them
//! - the first/last `h` points use rows `0..h` / `h+1..w` of the first/last
//!   full window (the polynomial is extrapolated to the edges rather than
//!   padding the input)

use nalgebra::DMatrix;

use crate::error::SmoothError;

/// Check a `(window_size, poly_order)` pair.
pub fn validate_params(window_size: usize, poly_order: usize) -> Result<(), SmoothError> {
    if window_size == 0 {
        return Err(SmoothError::EmptyWindow);
    }
    if window_size % 2 == 0 {
        return Err(SmoothError::EvenWindow { window_size });
    }
    if poly_order >= window_size {
        return Err(SmoothError::OrderTooHigh {
            poly_order,
            window_size,
        });
    }
    Ok(())
}

/// Smooth `values` with a Savitzky–Golay filter.
///
/// Inputs shorter than the window are returned unchanged (there is no full
/// window to fit); callers that care about that case check the length first.
pub fn savgol_filter(values: &[f64], window_size: usize, poly_order: usize) -> Result<Vec<f64>, SmoothError> {
    validate_params(window_size, poly_order)?;

    let n = values.len();
    if n < window_size {
        return Ok(values.to_vec());
    }

    let hat = hat_matrix(window_size, poly_order);
    let half = window_size / 2;
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        // Window start, clamped so the window always lies inside the input.
        let start = i.saturating_sub(half).min(n - window_size);
        let row = i - start;
        let window = &values[start..start + window_size];

        let mut acc = 0.0;
        for (k, &v) in window.iter().enumerate() {
            acc += hat[(row, k)] * v;
        }
        out.push(acc);
    }

    Ok(out)
}

fn hat_matrix(window_size: usize, poly_order: usize) -> DMatrix<f64> {
    let half = (window_size / 2) as f64;
    let cols = poly_order + 1;

    let vandermonde = DMatrix::from_fn(window_size, cols, |i, j| {
        let t = i as f64 - half;
        t.powi(j as i32)
    });

    match vandermonde.clone().pseudo_inverse(1e-12) {
        Ok(pinv) => &vandermonde * pinv,
        // Validated parameters give a full-column-rank Vandermonde matrix, so
        // this branch is unreachable in practice; identity leaves data as-is.
        Err(_) => DMatrix::identity(window_size, window_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_even_window_and_high_order() {
        assert_eq!(
            validate_params(4, 2),
            Err(SmoothError::EvenWindow { window_size: 4 })
        );
        assert_eq!(
            validate_params(5, 5),
            Err(SmoothError::OrderTooHigh {
                poly_order: 5,
                window_size: 5
            })
        );
        assert_eq!(validate_params(0, 0), Err(SmoothError::EmptyWindow));
        assert!(validate_params(15, 3).is_ok());
    }

    #[test]
    fn reproduces_polynomials_up_to_order() {
        // A cubic is fitted exactly by an order-3 filter, edges included.
        let values: Vec<f64> = (0..30)
            .map(|i| {
                let x = i as f64;
                0.5 - 0.2 * x + 0.03 * x * x - 0.001 * x * x * x
            })
            .collect();

        let smoothed = savgol_filter(&values, 7, 3).unwrap();
        for (a, b) in smoothed.iter().zip(values.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn centre_coefficients_match_classic_five_point_quadratic() {
        // Classic SG(5, 2) smoothing weights: [-3, 12, 17, 12, -3] / 35.
        let hat = hat_matrix(5, 2);
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0];
        for (k, e) in expected.iter().enumerate() {
            assert!((hat[(2, k)] - e / 35.0).abs() < 1e-12);
        }
    }

    #[test]
    fn attenuates_alternating_noise() {
        let values: Vec<f64> = (0..21)
            .map(|i| 10.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let smoothed = savgol_filter(&values, 5, 2).unwrap();

        // Interior points move toward the underlying level.
        for v in &smoothed[2..19] {
            assert!((v - 10.0).abs() < 1.0);
        }
    }

    #[test]
    fn short_input_is_returned_unchanged() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(savgol_filter(&values, 5, 2).unwrap(), values.to_vec());
    }
}
