//! Maps the internal alert model onto the provider's parameter names

use std::collections::BTreeMap;

use crate::config::{ParamMethod, Parameters};

/// Request parts for one (alert, member) pair
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutboundRequest {
    /// Parameters sent in the request body
    pub body: BTreeMap<String, String>,
    /// Query string, empty or starting with `?`
    pub query: String,
}

impl OutboundRequest {
    fn place(&mut self, method: ParamMethod, name: &str, value: &str) {
        match method {
            ParamMethod::Post => {
                self.body.insert(name.to_string(), value.to_string());
            }
            ParamMethod::Query => {
                self.query.push(if self.query.is_empty() { '?' } else { '&' });
                self.query.push_str(name);
                self.query.push('=');
                self.query.push_str(value);
            }
        }
    }
}

/// Build the body map and query string for sending `message` to `member`.
///
/// The message always goes in the body. `from` is placed before `to`, so when
/// both use the query string the result is `?from=..&to=..`. Values are
/// appended verbatim.
pub fn shape(member: &str, message: &str, parameters: &Parameters) -> OutboundRequest {
    let mut request = OutboundRequest::default();
    request
        .body
        .insert(parameters.message.param_name.clone(), message.to_string());

    request.place(
        parameters.from.param_method,
        &parameters.from.param_name,
        &parameters.from.param_value,
    );
    request.place(parameters.to.param_method, &parameters.to.param_name, member);

    request
}
