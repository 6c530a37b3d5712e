pub use log::{info, warn};

pub type Mat = nalgebra::DMatrix<f32>;
pub type DVec = nalgebra::DVector<f32>;

/// Total count drawn for every synthetic cell
pub const SIMULATED_TOTAL_COUNT: u64 = 3000;
