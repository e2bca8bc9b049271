pub mod enrichment;
pub mod grouper;
pub mod validator;

pub use enrichment::{
    enrich_studies, CrossrefResolver, EnrichmentLimits, NoopResolver, TitleResolver,
};
pub use grouper::{group_by_track, TrackGroups};
pub use validator::{validate, Rejection, RejectionReason, ValidationReport};
