// URL classification — trait-based abstraction over the detector service.
//
// The Classifier trait defines the interface. HttpClassifier implements it
// against the phishing detector HTTP API; the orchestrator only ever sees
// the trait, so tests can swap in a scripted service.

pub mod http;
pub mod traits;
