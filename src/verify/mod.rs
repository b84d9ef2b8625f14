// URL verification — input validation, the submission lifecycle, and the
// session history it produces.
//
// Data flows one way: raw input goes through the validator, the orchestrator
// sends it to a Classifier, and successful results are prepended to History
// for presentation to read.

pub mod error;
pub mod models;
pub mod orchestrator;
pub mod validator;

pub use error::VerifyError;
pub use models::{
    History, RiskLevel, SessionSnapshot, SubmissionState, VerificationRequest, VerificationResult,
};
pub use orchestrator::{Orchestrator, SubmitOutcome};
pub use validator::{validate, ValidatedUrl};
