//! Console WebSocket protocol
//!
//! Server → Console: ConsoleMessage (push)
//! Console → Server: ConsoleCommand

use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus};

/// Server → Console push message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsoleMessage {
    /// Handshake done; the order watcher is running for this session
    Ready { poll_interval_secs: u64 },

    /// Order count grew since the last poll
    NewOrder {
        /// Most recent order as returned by the store
        order: Option<Box<Order>>,
        new_orders: u64,
        total_orders: u64,
    },

    /// Status of an order changed from another admin session
    OrderStatusChanged { order_id: i64, status: OrderStatus },
}

/// Console → Server command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsoleCommand {
    /// Ask for a fresh `Ready`
    Hello,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_tagged() {
        let msg = ConsoleMessage::NewOrder {
            order: None,
            new_orders: 2,
            total_orders: 7,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "NewOrder");
        assert_eq!(json["new_orders"], 2);
        assert_eq!(json["total_orders"], 7);
    }

    #[test]
    fn command_parses() {
        let cmd: ConsoleCommand = serde_json::from_str(r#"{"type":"Hello"}"#).unwrap();
        assert!(matches!(cmd, ConsoleCommand::Hello));
    }
}
