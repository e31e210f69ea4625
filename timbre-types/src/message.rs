//! Protocol-agnostic control messages for the synthesis server.
//!
//! Engine code builds these; the OSC backend converts them to `rosc` types at
//! the edge, so nothing above the transport depends on the wire encoding.

use serde::{Deserialize, Serialize};

/// Add-action: place the new node at the head of the target group.
pub const ADD_TO_HEAD: i32 = 0;
/// Add-action: place the new node immediately before the target node.
pub const ADD_BEFORE: i32 = 2;
/// Group every node is created under.
pub const DEFAULT_GROUP: i32 = 1;

/// A loosely-typed message argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawArg {
    Int(i32),
    Float(f32),
    Str(String),
}

/// One server command: an address plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub addr: String,
    pub args: Vec<RawArg>,
}

impl ControlMessage {
    pub fn new(addr: &str, args: Vec<RawArg>) -> Self {
        Self {
            addr: addr.to_string(),
            args,
        }
    }

    /// Node id the message targets, when its first argument is one.
    pub fn node_id(&self) -> Option<i32> {
        match (self.addr.as_str(), self.args.as_slice()) {
            ("/n_set", [RawArg::Int(id), ..]) => Some(*id),
            ("/s_new", [_, RawArg::Int(id), ..]) => Some(*id),
            _ => None,
        }
    }

    /// Control name for an `/n_set` message.
    pub fn control_name(&self) -> Option<&str> {
        match (self.addr.as_str(), self.args.get(1)) {
            ("/n_set", Some(RawArg::Str(name))) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.addr)?;
        for arg in &self.args {
            match arg {
                RawArg::Int(v) => write!(f, " {v}")?,
                RawArg::Float(v) => write!(f, " {v}")?,
                RawArg::Str(v) => write!(f, " {v:?}")?,
            }
        }
        Ok(())
    }
}

/// `/s_new def node action target`
pub fn build_s_new_message(def_name: &str, node_id: i32, add_action: i32, target: i32) -> ControlMessage {
    ControlMessage::new(
        "/s_new",
        vec![
            RawArg::Str(def_name.to_string()),
            RawArg::Int(node_id),
            RawArg::Int(add_action),
            RawArg::Int(target),
        ],
    )
}

/// Build an /n_set message for a single float control on a node.
pub fn build_n_set_message(node_id: i32, param: &str, value: f32) -> ControlMessage {
    ControlMessage::new(
        "/n_set",
        vec![
            RawArg::Int(node_id),
            RawArg::Str(param.to_string()),
            RawArg::Float(value),
        ],
    )
}

/// Build an /n_set message for an integer control (bus numbers).
pub fn build_n_set_int_message(node_id: i32, param: &str, value: i32) -> ControlMessage {
    ControlMessage::new(
        "/n_set",
        vec![
            RawArg::Int(node_id),
            RawArg::Str(param.to_string()),
            RawArg::Int(value),
        ],
    )
}

/// Ask the server process to exit.
pub fn build_quit_message() -> ControlMessage {
    ControlMessage::new("/quit", Vec::new())
}

/// Load every synth definition file in `dir` (a path on the server's host).
pub fn build_d_load_dir_message(dir: &str) -> ControlMessage {
    ControlMessage::new("/d_loadDir", vec![RawArg::Str(dir.to_string())])
}

/// Ask for `/status.reply`; answered once the server is listening.
pub fn build_status_message() -> ControlMessage {
    ControlMessage::new("/status", Vec::new())
}

/// Answered with `/synced id` after every earlier asynchronous command completes.
pub fn build_sync_message(id: i32) -> ControlMessage {
    ControlMessage::new("/sync", vec![RawArg::Int(id)])
}
