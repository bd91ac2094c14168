mod calculator;
mod resolver;

pub use calculator::{
    adjusted_price, compute_adjustments, home_similarity_score, similarity_score,
};
pub use resolver::{
    cascade, default_values, AdjustmentResolver, AdjustmentScope, ResolutionSource,
    ResolvedAdjustments,
};
