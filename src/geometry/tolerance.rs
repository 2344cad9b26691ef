// Centralized tolerances for curve walking, stripification and chaining

pub const M_EPSILON: f64 = 1e-8;                 // degenerate segment / parallel line threshold
pub const ZERO: f64 = 1e-5;                      // "is this vector null" threshold for strip directions
pub const EPS_COINCIDENT: f64 = 1e-6;            // 3D endpoint match, overlapping stroke vertices
pub const EPS_ORIENTATION: f64 = 1e-6;           // zero-length user orientation
pub const EPS_SINGULARITY_RENDERER: f64 = 0.05;  // strip direction vs next segment (dot)
pub const MAX_RATIO_LENGTH_SINGU: f64 = 2.0;     // rail length over thickness before reset
pub const HUGE_COORD: f64 = 1e4;                 // strip coordinates beyond this are invalid
pub const EPS_BEGIN: f32 = 1e-6;                 // curve cursor "at start" slack on t

// Offset used to pull overlapping stroke vertices apart
pub const SINGULARITY_OFFSET: f64 = 1e-3;

// Valid strip coordinate: finite and inside the huge-coordinate box.
#[inline]
pub fn is_sane_coord(x: f64) -> bool { x.is_finite() && x.abs() <= HUGE_COORD }

/// Gaussian edge-stopping weight `exp(-x²/σ²)`; `σ = 0` disables damping.
#[inline]
pub fn edge_stopping(x: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return 1.0;
    }
    (-(x * x) / (sigma * sigma)).exp()
}
