mod condo;
mod home;
mod ladder;

pub use condo::{ComparableMatcher, CONDO_SQFT_TOLERANCE};
pub use home::{
    GeographyLevel, HomeComparableMatcher, HomeMatchResult, COMMUNITY_MIN_RESULTS,
    HOME_SQFT_TOLERANCE,
};
pub use ladder::{ADJUSTED_LIMIT, CONTACT_LIMIT};
