/// Sampled, normalized 1D Gaussian kernel.
///
/// Conventions:
/// - Parameterized by variance (not standard deviation), in samples².
/// - `radius = ceil(3*sigma)`, minimum 1 for a positive variance.
/// - A zero variance yields the identity kernel `[1.0]` with radius 0.
/// - `g` is normalized such that `sum(g) ~= 1`.
#[derive(Debug, Clone)]
pub struct GaussianKernel1D {
    pub variance: f64,
    pub radius: usize,
    pub g: Vec<f32>,
}

impl GaussianKernel1D {
    pub fn from_variance(variance: f64) -> Self {
        assert!(
            variance.is_finite() && variance >= 0.0,
            "variance must be >= 0 and finite"
        );

        if variance == 0.0 {
            return Self {
                variance,
                radius: 0,
                g: vec![1.0],
            };
        }

        let sigma = variance.sqrt();
        let radius = ((3.0 * sigma).ceil() as usize).max(1);
        let len = 2 * radius + 1;

        let mut g = vec![0.0f64; len];
        for (i, gi) in g.iter_mut().enumerate() {
            let x = i as f64 - radius as f64;
            *gi = (-(x * x) / (2.0 * variance)).exp();
        }
        let sum: f64 = g.iter().sum();

        Self {
            variance,
            radius,
            g: g.iter().map(|&v| (v / sum) as f32).collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.radius == 0
    }
}
