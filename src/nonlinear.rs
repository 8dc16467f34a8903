//! # Kerr Detuning
//!
//! The Kerr-shifted detuning `y` of a driven resonator is a real root of the
//! monic cubic
//!
//! ```text
//! y^3 + b y^2 + c y + d = 0
//! b = -2 x
//! c = ((coupling_loss + internal_loss) / 2)^2 + x^2
//! d = -kxin * coupling_loss
//! ```
//!
//! where `x` is the detuning. The roots are computed in closed form with
//! Cardano's method. Each point is classified by its discriminant; points with
//! more than one real root are reduced to a single value by a caller-supplied
//! [`ChooseRoot`] policy, which decides which branch of the bistable response
//! the model follows.
//!
//! Nothing here guards against degenerate inputs: NaN and infinities
//! propagate to the output.

use log::debug;
use ndarray::{stack, Array1, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;

/// Coefficients of the Kerr cubic at every point of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicCoefficients {
    /// Quadratic coefficient per point
    pub b: Array1<f64>,
    /// Linear coefficient per point
    pub c: Array1<f64>,
    /// Constant coefficient, shared by all points
    pub d: f64,
}

impl CubicCoefficients {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// `delta0 = b^2 - 3c`
    pub fn delta0(&self) -> Array1<f64> {
        &self.b * &self.b - 3.0 * &self.c
    }

    /// `delta1 = 2b^3 - 9bc + 27d`
    pub fn delta1(&self) -> Array1<f64> {
        let d = self.d;
        ndarray::Zip::from(&self.b)
            .and(&self.c)
            .map_collect(|&b, &c| 2.0 * b.powi(3) - 9.0 * b * c + 27.0 * d)
    }

    /// `(4 delta0^3 - delta1^2) / 27`
    pub fn discriminant(&self) -> Array1<f64> {
        let delta0 = self.delta0();
        let delta1 = self.delta1();
        ndarray::Zip::from(&delta0)
            .and(&delta1)
            .map_collect(|&d0, &d1| (4.0 * d0.powi(3) - d1 * d1) / 27.0)
    }
}

/// Coefficients of the Kerr cubic for every detuning point.
pub fn cubic_coefficients(
    detuning: &Array1<f64>,
    coupling_loss: f64,
    internal_loss: f64,
    kxin: f64,
) -> CubicCoefficients {
    let half_width = ((coupling_loss + internal_loss) / 2.0).powi(2);
    CubicCoefficients {
        b: detuning.mapv(|x| -2.0 * x),
        c: detuning.mapv(|x| half_width + x * x),
        d: -kxin * coupling_loss,
    }
}

/// Root structure of the cubic at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootCase {
    /// One real root and two complex conjugates (discriminant < 0)
    OneReal,
    /// A single real root of multiplicity three
    TripleRoot,
    /// A double root and a simple root (the bifurcation boundary)
    DoubleAndSimple,
    /// Three distinct real roots (discriminant > 0)
    ThreeDistinctReal,
}

impl RootCase {
    /// Classify a point from its `delta0` and discriminant.
    ///
    /// A NaN discriminant satisfies none of the comparisons and falls into
    /// `OneReal`, so the NaN flows through the closed form.
    pub fn from_discriminant(delta0: f64, discriminant: f64) -> Self {
        if discriminant > 0.0 {
            RootCase::ThreeDistinctReal
        } else if discriminant == 0.0 {
            if delta0 == 0.0 {
                RootCase::TripleRoot
            } else {
                RootCase::DoubleAndSimple
            }
        } else {
            RootCase::OneReal
        }
    }
}

/// Classify every point of the sweep.
pub fn classify(coefficients: &CubicCoefficients) -> Vec<RootCase> {
    let delta0 = coefficients.delta0();
    let discriminant = coefficients.discriminant();
    delta0
        .iter()
        .zip(discriminant.iter())
        .map(|(&d0, &disc)| RootCase::from_discriminant(d0, disc))
        .collect()
}

/// Policy that reduces stacked candidate roots to one root per point.
///
/// `candidates` holds one candidate per row along `axis`; the result has one
/// entry per point.
pub trait ChooseRoot {
    fn choose(&self, candidates: ArrayView2<f64>, axis: Axis) -> Array1<f64>;
}

/// Pick the smallest or the largest real root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Choose {
    /// The lowest root, the branch followed on a sweep toward lower detuning
    #[default]
    Min,
    /// The highest root
    Max,
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

impl ChooseRoot for Choose {
    fn choose(&self, candidates: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
        match self {
            Choose::Min => candidates.fold_axis(axis, f64::INFINITY, |&a, &b| nan_min(a, b)),
            Choose::Max => candidates.fold_axis(axis, f64::NEG_INFINITY, |&a, &b| nan_max(a, b)),
        }
    }
}

impl<F> ChooseRoot for F
where
    F: Fn(ArrayView2<f64>, Axis) -> Array1<f64>,
{
    fn choose(&self, candidates: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
        self(candidates, axis)
    }
}

/// Per-point intermediate quantities, gathered once for all branches.
struct Gathered {
    b: Array1<f64>,
    c: Array1<f64>,
    delta0: Array1<f64>,
    delta1: Array1<f64>,
    cases: Vec<RootCase>,
}

impl Gathered {
    fn new(coefficients: &CubicCoefficients) -> Self {
        Self {
            b: coefficients.b.clone(),
            c: coefficients.c.clone(),
            delta0: coefficients.delta0(),
            delta1: coefficients.delta1(),
            cases: classify(coefficients),
        }
    }

    fn indices(&self, case: RootCase) -> Vec<usize> {
        self.cases
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == case)
            .map(|(i, _)| i)
            .collect()
    }
}

fn one_real_root(b: f64, delta0: f64, delta1: f64) -> f64 {
    // Either sign of the square root gives the same real root; matching the
    // sign of delta1 keeps the radicand away from zero.
    let sqrt = (delta1 * delta1 - 4.0 * delta0.powi(3)).sqrt();
    let big_c = ((delta1 + delta1.signum() * sqrt) / 2.0).cbrt();
    -(b + big_c + delta0 / big_c) / 3.0
}

fn double_and_simple_roots(b: f64, c: f64, d: f64, delta0: f64) -> (f64, f64) {
    let double = (9.0 * d - b * c) / (2.0 * delta0);
    let simple = (4.0 * b * c - 9.0 * d - b.powi(3)) / delta0;
    (double, simple)
}

fn three_distinct_roots(b: f64, delta0: f64, delta1: f64) -> [f64; 3] {
    let radicand = Complex64::new(delta1, (4.0 * delta0.powi(3) - delta1 * delta1).sqrt());
    let big_c = (radicand / 2.0).cbrt();
    let xi = Complex64::new(-0.5, 3.0f64.sqrt() / 2.0);

    let mut roots = [0.0; 3];
    let mut rotated = big_c;
    for root in roots.iter_mut() {
        *root = (-(b + rotated + delta0 / rotated) / 3.0).re;
        rotated *= xi;
    }
    roots
}

/// Solve the cubic at every point, reducing multiple real roots with `choose`.
///
/// Points are gathered by [`RootCase`], each case is solved on its subset,
/// and the results are scattered back to their original positions.
pub fn solve_cubic<C>(coefficients: &CubicCoefficients, choose: &C) -> Array1<f64>
where
    C: ChooseRoot + ?Sized,
{
    let g = Gathered::new(coefficients);
    let d = coefficients.d;
    let mut roots = Array1::zeros(coefficients.len());

    let one_real = g.indices(RootCase::OneReal);
    for &i in &one_real {
        roots[i] = one_real_root(g.b[i], g.delta0[i], g.delta1[i]);
    }

    let triple = g.indices(RootCase::TripleRoot);
    for &i in &triple {
        roots[i] = -g.b[i] / 3.0;
    }

    let double_and_simple = g.indices(RootCase::DoubleAndSimple);
    if !double_and_simple.is_empty() {
        let (double, simple): (Vec<f64>, Vec<f64>) = double_and_simple
            .iter()
            .map(|&i| double_and_simple_roots(g.b[i], g.c[i], d, g.delta0[i]))
            .unzip();
        let double = Array1::from(double);
        let simple = Array1::from(simple);
        scatter_chosen(&mut roots, &double_and_simple, &[double.view(), simple.view()], choose);
    }

    let three_distinct = g.indices(RootCase::ThreeDistinctReal);
    if !three_distinct.is_empty() {
        let mut candidates = [
            Array1::zeros(three_distinct.len()),
            Array1::zeros(three_distinct.len()),
            Array1::zeros(three_distinct.len()),
        ];
        for (k, &i) in three_distinct.iter().enumerate() {
            let xs = three_distinct_roots(g.b[i], g.delta0[i], g.delta1[i]);
            for (candidate, x) in candidates.iter_mut().zip(xs) {
                candidate[k] = x;
            }
        }
        let views: Vec<ArrayView1<f64>> = candidates.iter().map(|a| a.view()).collect();
        scatter_chosen(&mut roots, &three_distinct, &views, choose);
    }

    debug!(
        "kerr cubic: {} one-real, {} triple, {} double-and-simple, {} three-distinct",
        one_real.len(),
        triple.len(),
        double_and_simple.len(),
        three_distinct.len()
    );

    roots
}

/// Stack the candidates along axis 0, reduce them, and write the chosen root
/// back to each original index.
fn scatter_chosen<C>(
    roots: &mut Array1<f64>,
    indices: &[usize],
    candidates: &[ArrayView1<f64>],
    choose: &C,
) where
    C: ChooseRoot + ?Sized,
{
    // All candidate rows have the same length, so stacking cannot fail.
    let chosen = match stack(Axis(0), candidates) {
        Ok(stacked) => choose.choose(stacked.view(), Axis(0)),
        Err(_) => Array1::from_elem(indices.len(), f64::NAN),
    };
    for (&i, &root) in indices.iter().zip(chosen.iter()) {
        roots[i] = root;
    }
}

/// Kerr-shifted detuning at every point of a sweep.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use resonator::nonlinear::{kerr_detuning, Choose};
///
/// // Without drive the Kerr shift vanishes.
/// let shift = kerr_detuning(&array![-1e-4, 0.0, 1e-4], 1e-4, 1e-5, 0.0, &Choose::Min);
/// assert!(shift.iter().all(|y| y.abs() < 1e-15));
/// ```
pub fn kerr_detuning<C>(
    detuning: &Array1<f64>,
    coupling_loss: f64,
    internal_loss: f64,
    kxin: f64,
    choose: &C,
) -> Array1<f64>
where
    C: ChooseRoot + ?Sized,
{
    let coefficients = cubic_coefficients(detuning, coupling_loss, internal_loss, kxin);
    solve_cubic(&coefficients, choose)
}

/// Kerr-shifted detuning at a single point.
pub fn kerr_detuning_at<C>(
    detuning: f64,
    coupling_loss: f64,
    internal_loss: f64,
    kxin: f64,
    choose: &C,
) -> f64
where
    C: ChooseRoot + ?Sized,
{
    let roots = kerr_detuning(
        &Array1::from_elem(1, detuning),
        coupling_loss,
        internal_loss,
        kxin,
        choose,
    );
    roots[0]
}

/// Drive `kxin` at which the response becomes bistable:
/// `3^(-3/2) (internal_loss + coupling_loss)^3 / coupling_loss`.
///
/// The cubic has a triple root at this drive, at detuning
/// `sqrt(3) (coupling_loss + internal_loss) / 2`.
pub fn kerr_detuning_at_bifurcation(coupling_loss: f64, internal_loss: f64) -> f64 {
    3.0f64.powf(-1.5) * (internal_loss + coupling_loss).powi(3) / coupling_loss
}

/// All distinct real roots of the Kerr cubic at every point, ascending.
///
/// Uses the same classification as [`kerr_detuning`]; useful for drawing
/// both branches of a bistable response.
pub fn kerr_detuning_roots(
    detuning: &Array1<f64>,
    coupling_loss: f64,
    internal_loss: f64,
    kxin: f64,
) -> Vec<Vec<f64>> {
    let coefficients = cubic_coefficients(detuning, coupling_loss, internal_loss, kxin);
    real_roots(&coefficients)
}

/// All distinct real roots of each cubic, ascending.
pub fn real_roots(coefficients: &CubicCoefficients) -> Vec<Vec<f64>> {
    let g = Gathered::new(coefficients);
    let d = coefficients.d;

    g.cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let mut roots = match case {
                RootCase::OneReal => vec![one_real_root(g.b[i], g.delta0[i], g.delta1[i])],
                RootCase::TripleRoot => vec![-g.b[i] / 3.0],
                RootCase::DoubleAndSimple => {
                    let (double, simple) = double_and_simple_roots(g.b[i], g.c[i], d, g.delta0[i]);
                    vec![double, simple]
                }
                RootCase::ThreeDistinctReal => {
                    three_distinct_roots(g.b[i], g.delta0[i], g.delta1[i]).to_vec()
                }
            };
            roots.sort_by(|a, b| a.total_cmp(b));
            roots
        })
        .collect()
}
