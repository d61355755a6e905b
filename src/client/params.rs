//! Request parameter encoding.
//!
//! Values render as follows:
//! - strings are sent verbatim
//! - numbers and booleans use their JSON text
//! - lists (and objects) use their compact JSON literal, so `[1,2,3]`
//!   travels as one value rather than repeated keys
//! - nulls are dropped

use reqwest::Method;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::endpoints::Endpoint;

/// Request parameters, keyed by name.
pub type Params = Map<String, Value>;

/// Convert a JSON object into [`Params`]. Anything else yields no parameters.
pub fn to_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Wire form of a single parameter value, or `None` if it is omitted.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `application/x-www-form-urlencoded` encoding of all parameters.
pub fn encode_form(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(rendered) = render_value(value) {
            serializer.append_pair(key, &rendered);
        }
    }
    serializer.finish()
}

/// Full request URL for `endpoint`. Only GET carries parameters in the URL.
pub fn build_url(endpoint: &Endpoint, path: &str, method: &Method, params: &Params) -> String {
    let mut url = endpoint.url_for(path);
    if *method == Method::GET {
        let query = encode_form(params);
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
    }
    url
}
