use std::sync::Arc;

use mcp_types::CallToolRequest;
use mcp_types::CallToolRequestParams;
use mcp_types::CallToolResult;
use mcp_types::ClientRequest;
use mcp_types::ContentBlock;
use mcp_types::Implementation;
use mcp_types::InitializeRequest;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::JSONRPCError;
use mcp_types::JSONRPCErrorError;
use mcp_types::JSONRPCNotification;
use mcp_types::JSONRPCRequest;
use mcp_types::JSONRPCResponse;
use mcp_types::ListToolsRequest;
use mcp_types::ListToolsResult;
use mcp_types::PingRequest;
use mcp_types::RequestId;
use mcp_types::ServerCapabilities;
use mcp_types::ServerCapabilitiesTools;
use mcp_types::TextContent;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slides_writer_api::Config;
use slides_writer_api::Result as SlidesResult;
use slides_writer_api::SlidesClient;
use slides_writer_api::find_title_shape;
use slides_writer_api::overwrite_text;
use slides_writer_api::replace_text;
use slides_writer_api::resolve_text_boxes;
use slides_writer_login::load_or_login;

use crate::error_code::INVALID_REQUEST_ERROR_CODE;
use crate::outgoing_message::OutgoingMessageSender;
use crate::tool_config::WRITE_SLIDE_CONTENT_TOOL_NAME;
use crate::tool_config::WRITE_SLIDE_TITLE_TOOL_NAME;
use crate::tool_config::WriteSlideContentParam;
use crate::tool_config::WriteSlideTitleParam;
use crate::tool_config::write_slide_content_tool;
use crate::tool_config::write_slide_title_tool;

pub(crate) struct MessageProcessor {
    outgoing: Arc<OutgoingMessageSender>,
    initialized: bool,
    config: Arc<Config>,
}

impl MessageProcessor {
    pub(crate) fn new(outgoing: Arc<OutgoingMessageSender>, config: Arc<Config>) -> Self {
        Self {
            outgoing,
            initialized: false,
            config,
        }
    }

    pub(crate) async fn process_request(&mut self, request: JSONRPCRequest) {
        let request_id = request.id.clone();
        let client_request = match ClientRequest::try_from(request) {
            Ok(client_request) => client_request,
            Err(e) => {
                tracing::warn!("rejecting request: {e}");
                self.outgoing
                    .send_error(
                        request_id,
                        JSONRPCErrorError {
                            code: INVALID_REQUEST_ERROR_CODE,
                            message: format!("unsupported request: {e}"),
                            data: None,
                        },
                    )
                    .await;
                return;
            }
        };

        match client_request {
            ClientRequest::InitializeRequest(params) => {
                self.handle_initialize(request_id, params).await;
            }
            ClientRequest::PingRequest(_) => self.handle_ping(request_id).await,
            ClientRequest::ListToolsRequest(_) => self.handle_list_tools(request_id).await,
            ClientRequest::CallToolRequest(params) => {
                self.handle_call_tool(request_id, params).await;
            }
        }
    }

    pub(crate) fn process_notification(&self, notification: JSONRPCNotification) {
        tracing::debug!("notification: {}", notification.method);
    }

    pub(crate) fn process_response(&self, response: JSONRPCResponse) {
        tracing::debug!("unexpected response: {response:?}");
    }

    pub(crate) fn process_error(&self, error: JSONRPCError) {
        tracing::error!("error from client: {error:?}");
    }

    async fn handle_initialize(&mut self, id: RequestId, params: InitializeRequestParams) {
        if self.initialized {
            self.outgoing
                .send_error(
                    id,
                    JSONRPCErrorError {
                        code: INVALID_REQUEST_ERROR_CODE,
                        message: "initialize called more than once".to_string(),
                        data: None,
                    },
                )
                .await;
            return;
        }
        self.initialized = true;

        tracing::info!(
            "initialize from {} {}",
            params.client_info.name,
            params.client_info.version
        );
        let result = InitializeResult {
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            instructions: None,
            // Echo whatever protocol version the client asked for.
            protocol_version: params.protocol_version,
            server_info: Implementation {
                name: "slides-writer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Google Slides Writer".to_string()),
            },
        };
        self.outgoing.send_response::<InitializeRequest>(id, result).await;
    }

    async fn handle_ping(&self, id: RequestId) {
        self.outgoing
            .send_response::<PingRequest>(id, serde_json::json!({}))
            .await;
    }

    async fn handle_list_tools(&self, id: RequestId) {
        let result = ListToolsResult {
            tools: vec![write_slide_title_tool(), write_slide_content_tool()],
            next_cursor: None,
        };
        self.outgoing.send_response::<ListToolsRequest>(id, result).await;
    }

    async fn handle_call_tool(&self, id: RequestId, params: CallToolRequestParams) {
        tracing::info!("tools/call: {}", params.name);
        let CallToolRequestParams { name, arguments } = params;
        match name.as_str() {
            WRITE_SLIDE_TITLE_TOOL_NAME => self.handle_write_slide_title(id, arguments).await,
            WRITE_SLIDE_CONTENT_TOOL_NAME => self.handle_write_slide_content(id, arguments).await,
            _ => {
                self.outgoing
                    .send_response::<CallToolRequest>(
                        id,
                        error_result(format!("Unknown tool '{name}'")),
                    )
                    .await;
            }
        }
    }

    async fn handle_write_slide_title(&self, id: RequestId, arguments: Option<Value>) {
        let param: WriteSlideTitleParam = match parse_arguments(arguments) {
            Ok(param) => param,
            Err(message) => {
                self.outgoing
                    .send_response::<CallToolRequest>(id, error_result(message))
                    .await;
                return;
            }
        };

        // Awaited inline: the processor task serializes tool calls, so two
        // writes never interleave remote calls or token-cache rewrites.
        let result = match write_title(&self.config, &param.text).await {
            Ok(()) => success_result(format!(
                "Successfully wrote \"{}\" to slide title",
                param.text
            )),
            Err(e) => error_result(format!("Error writing slide title: {e}")),
        };
        self.outgoing.send_response::<CallToolRequest>(id, result).await;
    }

    async fn handle_write_slide_content(&self, id: RequestId, arguments: Option<Value>) {
        let param: WriteSlideContentParam = match parse_arguments(arguments) {
            Ok(param) => param,
            Err(message) => {
                self.outgoing
                    .send_response::<CallToolRequest>(id, error_result(message))
                    .await;
                return;
            }
        };

        let result = match write_content(&self.config, &param.text).await {
            Ok(()) => success_result(format!(
                "Successfully wrote \"{}\" to slide content",
                param.text
            )),
            Err(e) => error_result(format!("Error writing slide content: {e}")),
        };
        self.outgoing.send_response::<CallToolRequest>(id, result).await;
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T, String> {
    let Some(arguments) = arguments else {
        return Err("Missing arguments".to_string());
    };
    serde_json::from_value(arguments).map_err(|e| format!("Failed to parse arguments: {e}"))
}

/// Replace the single text box on the configured title slide.
async fn write_title(config: &Config, text: &str) -> SlidesResult<()> {
    let auth = load_or_login(config.login_options()).await?;
    let client = SlidesClient::new(auth, config.api_base_url.clone());
    let presentation = client
        .get_presentation(&config.presentation_id, None)
        .await?;
    let element_id = find_title_shape(&presentation, config.title_slide)?;
    overwrite_text(&client, &config.presentation_id, &element_id, text).await
}

/// Replace the lower of the two text boxes on the configured content slide.
async fn write_content(config: &Config, text: &str) -> SlidesResult<()> {
    let auth = load_or_login(config.login_options()).await?;
    let client = SlidesClient::new(auth, config.api_base_url.clone());
    let presentation = client
        .get_presentation(&config.presentation_id, None)
        .await?;
    let pair = resolve_text_boxes(&presentation, config.content_slide)?;
    replace_text(&client, &config.presentation_id, &pair.content_id, text).await
}

fn success_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::TextContent(TextContent {
            r#type: "text".to_string(),
            text,
            annotations: None,
        })],
        is_error: None,
        structured_content: None,
    }
}

fn error_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::TextContent(TextContent {
            r#type: "text".to_string(),
            text,
            annotations: None,
        })],
        is_error: Some(true),
        structured_content: None,
    }
}
