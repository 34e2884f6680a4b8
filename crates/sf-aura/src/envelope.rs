//! Request envelope serialization.

use serde_json::{json, Map, Value};

use crate::catalog::ActionTemplate;
use crate::error::Result;
use crate::session::SessionContext;

/// Action id echoed back by the server. Only one action is sent per request.
const ACTION_ID: &str = "123";

/// Serialize the `message` parameter for a single action.
pub fn message(action: &ActionTemplate) -> Result<String> {
    let message = json!({
        "actions": [{
            "id": ACTION_ID,
            "descriptor": action.descriptor,
            "callingDescriptor": "UNKNOWN",
            "params": Value::Object(action.params.clone()),
        }]
    });
    Ok(serde_json::to_string(&message)?)
}

/// Serialize the `aura.context` parameter.
pub fn context(session: &SessionContext) -> Result<String> {
    let mut loaded = Map::new();
    loaded.insert(
        format!("APPLICATION@markup://{}", session.app()),
        Value::String(session.app().to_string()),
    );
    let context = json!({
        "mode": session.mode(),
        "fwuid": session.fwuid(),
        "app": session.app(),
        "loaded": loaded,
        "dn": [],
        "globals": {},
        "uad": false,
    });
    Ok(serde_json::to_string(&context)?)
}

/// Full form body: `message`, `aura.token` and `aura.context`.
pub fn form_body(action: &ActionTemplate, token: &str, session: &SessionContext) -> Result<String> {
    Ok(format!(
        "message={}&aura.token={}&aura.context={}",
        urlencoding::encode(&message(action)?),
        urlencoding::encode(token),
        urlencoding::encode(&context(session)?),
    ))
}
