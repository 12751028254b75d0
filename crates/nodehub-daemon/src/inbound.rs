//! Inbound host calls, received as JSON lines

use nodehub_core::{Lookup, Registry};
use serde::Deserialize;
use serde_json::Value;

/// A call from the host engine into the registry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Inbound {
    /// Deliver data to a node's read callback
    ReadCall {
        object: String,
        frame: String,
        node: String,
        #[serde(default)]
        data: Value,
    },
    /// Deliver data to a node's connection callback
    ConnectCall {
        object: String,
        frame: String,
        node: String,
        #[serde(default)]
        data: Value,
    },
    RenameNode {
        object: String,
        frame: String,
        node: String,
        text: String,
    },
    MoveNode {
        object: String,
        node: String,
        x: f64,
        y: f64,
    },
    Activate { object: String },
    Deactivate { object: String },
    ReloadNodeUi { object: String },
    DeveloperUi { enabled: bool },
    Reset,
    Shutdown,
}

impl Inbound {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Apply a registry call. Lifecycle calls are handled by the daemon.
    pub fn apply(&self, registry: &mut Registry) -> Lookup {
        match self {
            Inbound::ReadCall { object, frame, node, data } => {
                registry.read_call(object, frame, node, data)
            }
            Inbound::ConnectCall { object, frame, node, data } => {
                registry.connect_call(object, frame, node, data)
            }
            Inbound::RenameNode { object, frame, node, text } => {
                registry.rename_node(object, frame, node, text)
            }
            Inbound::MoveNode { object, node, x, y } => registry.move_node(object, node, *x, *y),
            Inbound::Activate { object } => registry.activate(object),
            Inbound::Deactivate { object } => registry.deactivate(object),
            Inbound::ReloadNodeUi { object } => registry.reload_node_ui(object),
            Inbound::DeveloperUi { enabled } => {
                registry.enable_developer_ui(*enabled);
                Ok(())
            }
            Inbound::Reset | Inbound::Shutdown => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_calls() {
        assert_eq!(
            Inbound::parse(r#"{"readCall":{"object":"Lamp","frame":"io","node":"switch","data":{"value":1}}}"#)
                .unwrap(),
            Inbound::ReadCall {
                object: "Lamp".to_string(),
                frame: "io".to_string(),
                node: "switch".to_string(),
                data: json!({"value": 1}),
            }
        );
        assert_eq!(Inbound::parse(r#""reset""#).unwrap(), Inbound::Reset);
        assert_eq!(Inbound::parse(r#""shutdown""#).unwrap(), Inbound::Shutdown);
        assert_eq!(
            Inbound::parse(r#"{"developerUi":{"enabled":true}}"#).unwrap(),
            Inbound::DeveloperUi { enabled: true }
        );
        assert!(Inbound::parse(r#"{"launch":{}}"#).is_err());
    }

    #[test]
    fn test_connect_call_data_defaults_to_null() {
        let call = Inbound::parse(r#"{"connectCall":{"object":"Lamp","frame":"io","node":"switch"}}"#)
            .unwrap();
        assert!(matches!(call, Inbound::ConnectCall { data: Value::Null, .. }));
    }
}
