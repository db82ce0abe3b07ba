//! Central-difference numerical Jacobians.
//!
//! Belief dynamics, the observation model, and kinematics are all treated as
//! black-box smooth vector functions (§4.2): rather than deriving analytic
//! derivatives for each one, every nonlinear model is linearized the same
//! way, by finite differences. This is the one numeric primitive the rest
//! of the workspace builds on.

use faer::Mat;

/// Default finite-difference step, `2⁻¹¹`.
///
/// Too small a step produces Jacobians dominated by floating-point noise
/// near the (already noisy) belief dynamics; too large a step reintroduces
/// linearization error. `2⁻¹¹` is the value the original implementation
/// hard-codes; it is kept as a named default here but every call site takes
/// it as a parameter so it can be tuned per model.
pub const DEFAULT_JACOBIAN_STEP: f64 = 0.00048828125; // 2^-11

/// Computes the Jacobian of `f: R^n -> R^m` at `x` by central differences.
///
/// Column `i` of the returned `m x n` matrix is
/// `(f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)`.
///
/// `f` is evaluated `2n` times. Callers that need the value at `x` itself
/// (e.g. to build the constant term of a linearization) should compute it
/// separately — this function does not return it.
pub fn calc_num_jac<F>(f: F, x: &[f64], eps: f64) -> Mat<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = x.len();
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    // Probe once to learn the output dimension before allocating the Jacobian.
    let y0 = f(x);
    let m = y0.len();
    let mut jac = Mat::zeros(m, n);

    for i in 0..n {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        let y_plus = f(&x_plus);
        let y_minus = f(&x_minus);

        for row in 0..m {
            let deriv = (y_plus[row] - y_minus[row]) / (2.0 * eps);
            jac.write(row, i, deriv);
        }

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }

    jac
}

/// [`calc_num_jac`] with the [`DEFAULT_JACOBIAN_STEP`].
pub fn calc_num_jac_default<F>(f: F, x: &[f64]) -> Mat<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    calc_num_jac(f, x, DEFAULT_JACOBIAN_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_function_has_exact_jacobian() {
        // f(x) = [2x0 + 3x1, x1 - x0]
        let f = |x: &[f64]| vec![2.0 * x[0] + 3.0 * x[1], x[1] - x[0]];
        let jac = calc_num_jac(f, &[1.0, 2.0], DEFAULT_JACOBIAN_STEP);

        assert_relative_eq!(jac.read(0, 0), 2.0, epsilon = 1e-6);
        assert_relative_eq!(jac.read(0, 1), 3.0, epsilon = 1e-6);
        assert_relative_eq!(jac.read(1, 0), -1.0, epsilon = 1e-6);
        assert_relative_eq!(jac.read(1, 1), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn quadratic_function_matches_analytic_gradient_to_second_order() {
        // f(x) = x0^2, f'(x0) = 2*x0
        let f = |x: &[f64]| vec![x[0] * x[0]];
        let x0 = 3.0;
        let jac = calc_num_jac(f, &[x0], 1e-4);
        assert_relative_eq!(jac.read(0, 0), 2.0 * x0, epsilon = 1e-4);
    }
}
