//! MCP server speaking JSON-RPC over stdio. Incoming lines are parsed on a
//! dedicated task, handled by the message processor, and answered through a
//! writer task that owns stdout.

use std::io::Result as IoResult;
use std::sync::Arc;

use mcp_types::JSONRPCMessage;
use slides_writer_api::Config;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

mod error_code;
mod message_processor;
mod outgoing_message;
mod tool_config;

use message_processor::MessageProcessor;
use outgoing_message::OutgoingMessage;
use outgoing_message::OutgoingMessageSender;

/// Size of the bounded queues used to communicate between tasks. The value
/// is a compromise: a strict size of 1 would guarantee ordering at the cost
/// of throughput, anything larger trades a bit of reordering headroom for
/// fewer stalls on bursty clients.
const CHANNEL_CAPACITY: usize = 128;

pub async fn run_main(config: Config) -> IoResult<()> {
    let (incoming_tx, mut incoming_rx) = mpsc::channel::<JSONRPCMessage>(CHANNEL_CAPACITY);

    // Task that reads JSON-RPC lines from stdin and forwards them.
    let stdin_reader = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match serde_json::from_str::<JSONRPCMessage>(&line) {
                Ok(message) => {
                    if incoming_tx.send(message).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to deserialize JSONRPCMessage: {e}"),
            }
        }
        tracing::debug!("stdin reader finished (EOF or closed channel)");
    });

    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<OutgoingMessage>();

    // Task that owns stdout and serializes every outgoing message.
    let stdout_writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(outgoing) = outgoing_rx.recv().await {
            let message = JSONRPCMessage::from(outgoing);
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if stdout.write_all(json.as_bytes()).await.is_err()
                        || stdout.write_all(b"\n").await.is_err()
                    {
                        break;
                    }
                    let _ = stdout.flush().await;
                }
                Err(e) => tracing::error!("Failed to serialize outgoing message: {e}"),
            }
        }
    });

    // Task that dispatches incoming messages to the processor.
    let processor = tokio::spawn(async move {
        let outgoing = Arc::new(OutgoingMessageSender::new(outgoing_tx));
        let mut processor = MessageProcessor::new(outgoing, Arc::new(config));
        while let Some(message) = incoming_rx.recv().await {
            match message {
                JSONRPCMessage::Request(request) => processor.process_request(request).await,
                JSONRPCMessage::Notification(notification) => {
                    processor.process_notification(notification);
                }
                JSONRPCMessage::Response(response) => processor.process_response(response),
                JSONRPCMessage::Error(error) => processor.process_error(error),
            }
        }
        tracing::debug!("processor task exited (incoming channel closed)");
    });

    let _ = tokio::join!(stdin_reader, processor, stdout_writer);
    Ok(())
}
