//! Accident Reporting Domain
//!
//! Drivers submit accident reports with a damage photo and location. The
//! photo is screened locally, scored for damage severity by the ML scoring
//! service, and the report then awaits traffic-officer verification before a
//! claim can be raised against it.
//!
//! # Report lifecycle
//!
//! ```text
//! Submitted (verification pending) -> Verified / Rejected (traffic officer)
//! ```

pub mod report;
pub mod image;
pub mod prediction;
pub mod adapters;
pub mod error;

pub use report::{
    AccidentReport, DamagePrediction, DamageSeverity, FirRecord, GeoLocation,
    TrafficVerification, VerificationStatus,
};
pub use image::{sniff_image_format, validate_image, ImageFormat, MAX_IMAGE_BYTES};
pub use prediction::DamagePredictor;
pub use error::ReportError;
