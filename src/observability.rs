use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("emochat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("emochat.client.request_errors");
pub(crate) static CLIENT_SERVICE_ERRORS: Counter = Counter::new("emochat.client.service_errors");
pub(crate) static CLIENT_TRANSPORT_ERRORS: Counter =
    Counter::new("emochat.client.transport_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("emochat.client.request_duration_seconds");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("emochat.session.submissions");
pub(crate) static SESSION_IGNORED_INPUTS: Counter = Counter::new("emochat.session.ignored_inputs");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_SERVICE_ERRORS);
    collector.register_counter(&CLIENT_TRANSPORT_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_IGNORED_INPUTS);
}
