pub mod context;
pub mod counts;
pub mod design;
pub mod fs;
pub mod normalization;
pub mod scaling_factors;

pub use self::{
    context::Context,
    design::{Design, Grouping},
    normalization::{NormalizationError, NormalizationMethod},
    scaling_factors::ScalingFactors,
};
