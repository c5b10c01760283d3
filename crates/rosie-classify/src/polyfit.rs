//! Least-squares polynomial fitting.

/// Fit `y ≈ c0 + c1·x + … + cd·x^d` and return the coefficients lowest
/// order first.
///
/// Solves the normal equations on `x` scaled to `[-1, 1]`. When the system
/// is singular (fewer distinct `x` than coefficients) the degree is lowered
/// until it is not. Empty input yields the zero polynomial.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Vec<f64> {
    let n = x.len().min(y.len());
    if n == 0 {
        return vec![0.0];
    }
    let scale = x[..n].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let xs: Vec<f64> = x[..n].iter().map(|v| v / scale).collect();

    for d in (0..=degree).rev() {
        if let Some(scaled) = solve_normal_equations(&xs, &y[..n], d) {
            return scaled
                .iter()
                .enumerate()
                .map(|(k, c)| c / scale.powi(k as i32))
                .collect();
        }
    }
    // Degree 0 with at least one point is never singular.
    vec![y[..n].iter().sum::<f64>() / n as f64]
}

/// Evaluate lowest-order-first `coefficients` at `x` (Horner).
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn solve_normal_equations(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let m = degree + 1;
    // Power sums Σ x^k for k in 0..=2d, and Σ y·x^k for k in 0..=d.
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut rhs = vec![0.0; m];
    for (&xi, &yi) in x.iter().zip(y) {
        let mut p = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += p;
            if k < m {
                rhs[k] += yi * p;
            }
            p *= xi;
        }
    }

    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|row| {
            let mut r: Vec<f64> = power_sums[row..row + m].to_vec();
            r.push(rhs[row]);
            r
        })
        .collect();
    gaussian_elimination(&mut a)
}

/// Solve an augmented `m × (m+1)` system with partial pivoting.
fn gaussian_elimination(a: &mut [Vec<f64>]) -> Option<Vec<f64>> {
    const EPSILON: f64 = 1e-10;
    let m = a.len();
    let magnitude = a
        .iter()
        .flat_map(|r| r[..m].iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    for col in 0..m {
        let pivot = (col..m).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() <= EPSILON * magnitude.max(1.0) {
            return None;
        }
        a.swap(col, pivot);
        for row in col + 1..m {
            let factor = a[row][col] / a[col][col];
            if factor != 0.0 {
                for k in col..=m {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }
    }

    let mut solution = vec![0.0; m];
    for row in (0..m).rev() {
        let tail: f64 = (row + 1..m).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (a[row][m] - tail) / a[row][row];
    }
    Some(solution)
}
