//! Response envelope types.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Parsed protocol response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuraResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub context: Option<Context>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Event>,
    /// Raw body, kept for classification.
    #[serde(skip)]
    pub raw_body: String,
}

/// Outcome of one action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default)]
    pub state: Option<ActionState>,
    #[serde(default)]
    pub return_value: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: Vec<Value>,
}

/// Server-reported action state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ActionState {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "INCOMPLETE")]
    Incomplete,
    #[serde(rename = "ABORTED")]
    Aborted,
    #[serde(rename = "warning")]
    Warning,
    #[serde(other)]
    Unknown,
}

/// Framework context echoed by the server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default)]
    pub fwuid: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub global_value_providers: Vec<GlobalValueProvider>,
}

/// Side channel of values keyed by provider type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalValueProvider {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub values: Value,
}

/// Client-side event, e.g. a navigation after login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub descriptor: Option<String>,
    #[serde(default)]
    pub attributes: Option<EventAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventAttributes {
    #[serde(default)]
    pub values: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Action {
    pub fn is_success(&self) -> bool {
        self.state == Some(ActionState::Success)
    }

    pub fn is_warning(&self) -> bool {
        self.state == Some(ActionState::Warning)
    }

    /// Return value when it is a non-empty object.
    pub fn return_map(&self) -> Option<&Map<String, Value>> {
        self.return_value
            .as_ref()
            .and_then(Value::as_object)
            .filter(|map| !map.is_empty())
    }
}

impl AuraResponse {
    /// Parse a body, keeping the raw text.
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        let mut response: AuraResponse = serde_json::from_str(body)?;
        response.raw_body = body.to_string();
        Ok(response)
    }

    pub fn first_action(&self) -> Option<&Action> {
        self.actions.first()
    }

    /// Returns true if any action is in the `warning` state.
    pub fn has_warning(&self) -> bool {
        self.actions.iter().any(Action::is_warning)
    }

    /// Returns true if the first action succeeded.
    pub fn is_success(&self) -> bool {
        self.first_action().is_some_and(Action::is_success)
    }

    /// Non-empty object return value of the first action.
    pub fn return_map(&self) -> Option<&Map<String, Value>> {
        self.first_action().and_then(Action::return_map)
    }

    /// Build id announced in the response context.
    pub fn context_fwuid(&self) -> Option<&str> {
        self.context.as_ref()?.fwuid.as_deref()
    }

    /// `url` attribute of the first event.
    pub fn redirect_url(&self) -> Option<&str> {
        self.events
            .first()?
            .attributes
            .as_ref()?
            .values
            .get("url")?
            .as_str()
            .filter(|url| !url.is_empty())
    }

    /// Values of the `$Record` global value provider.
    pub fn record_provider(&self) -> Option<&Value> {
        self.context
            .as_ref()?
            .global_value_providers
            .iter()
            .find(|gvp| gvp.kind.eq_ignore_ascii_case("$Record"))
            .map(|gvp| &gvp.values)
    }
}
