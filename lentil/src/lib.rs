pub mod clone_cnv;
pub mod common;
pub mod fit;
pub mod fit_outcome;
pub mod input;
pub mod multinomial;
pub mod params;
pub mod sampling_plan;
pub mod simulate;
