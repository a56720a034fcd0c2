//! MCP Server implementation
//!
//! This module implements the MCP server that handles stdio-based JSON-RPC communication.

use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use serde_json::{json, Value};

use crate::protocol::{self, Request, RequestId, Response, RpcError};
use crate::tools::{self, ToolResult};

/// Server information
const SERVER_NAME: &str = "clj-kondo-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Tool handler trait
///
/// Implement this trait to handle tool calls. Errors are sent back to the
/// client as JSON-RPC error responses.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Handle a tool call
    async fn call(&self, name: &str, arguments: Value) -> Result<ToolResult, RpcError>;
}

/// Why [`McpServer::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// Input stream closed
    Eof,
    /// Ctrl-C / SIGINT
    Interrupted,
}

/// MCP Server
pub struct McpServer<H: ToolHandler> {
    handler: Arc<H>,
    initialized: bool,
}

impl<H: ToolHandler> McpServer<H> {
    /// Create a new MCP server with a tool handler
    pub fn new(handler: H) -> Self {
        McpServer {
            handler: Arc::new(handler),
            initialized: false,
        }
    }

    /// Whether the client has sent `initialize`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio until EOF or an interrupt
    pub async fn run(&mut self) -> anyhow::Result<ServeExit> {
        info!("clj-kondo MCP server running on stdio");

        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();

        self.serve_until(reader, writer, tokio::signal::ctrl_c()).await
    }

    /// Serve until EOF or until `shutdown` resolves, whichever comes first
    pub async fn serve_until<R, W, S>(
        &mut self,
        reader: R,
        writer: W,
        shutdown: S,
    ) -> anyhow::Result<ServeExit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = std::io::Result<()>>,
    {
        tokio::select! {
            result = self.serve(reader, writer) => {
                result?;
                Ok(ServeExit::Eof)
            }
            signal = shutdown => {
                signal?;
                info!("Interrupt received, shutting down");
                Ok(ServeExit::Interrupted)
            }
        }
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`
    ///
    /// Lines are decoded lossily, so bytes that are not UTF-8 only affect the
    /// response to their own line.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let Some(response) = self.handle_message(line).await else {
                continue;
            };
            let response_json = protocol::serialize_response_string(&response)?;

            debug!("Sending: {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!("EOF received, shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC message; notifications produce no response
    async fn handle_message(&mut self, message: &str) -> Option<Response> {
        match protocol::parse_request_str(message) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => Some(Response::from_error(RequestId::Null, err)),
        }
    }

    /// Handle a parsed request
    async fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };
        let method = request.method.as_str();
        let params = request.params.unwrap_or(Value::Null);

        let response = match method {
            "initialize" => self.handle_initialize(id, params),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            "ping" => Response::success(id, json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                Response::from_error(id, RpcError::MethodNotFound(method.to_string()))
            }
        };

        Some(response)
    }

    /// Handle initialize request
    fn handle_initialize(&mut self, id: RequestId, _params: Value) -> Response {
        self.initialized = true;
        info!("MCP server initialized");

        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            }
        });

        Response::success(id, result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: RequestId) -> Response {
        let tools = tools::all_tools();
        Response::success(id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, id: RequestId, params: Value) -> Response {
        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                return Response::from_error(id, RpcError::UnknownTool("undefined".to_string()));
            }
        };

        if tools::get_tool(&name).is_none() {
            warn!(tool = %name, "Unknown tool");
            return Response::from_error(id, RpcError::UnknownTool(name));
        }

        let Some(arguments) = params.get("arguments").cloned() else {
            return Response::from_error(
                id,
                RpcError::InvalidParams("Missing 'arguments' field".to_string()),
            );
        };

        if !self.initialized {
            warn!(tool = %name, "tools/call received before initialize");
        }

        debug!("Calling tool: {} with args: {:?}", name, arguments);

        let result = match self.handler.call(&name, arguments).await {
            Ok(result) => result,
            Err(err) => return Response::from_error(id, err),
        };

        match serde_json::to_value(result) {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::from_error(id, RpcError::InternalError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::LintHandler;
    use crate::tools::LINT_TOOL;

    struct TestHandler;

    #[async_trait::async_trait]
    impl ToolHandler for TestHandler {
        async fn call(&self, name: &str, arguments: Value) -> Result<ToolResult, RpcError> {
            match arguments.get("target").and_then(|v| v.as_str()) {
                Some(target) => Ok(ToolResult::text(format!("{}:{}", name, target))),
                None => Err(RpcError::InvalidParams("missing target".to_string())),
            }
        }
    }

    fn request(method: &str, params: Option<Value>) -> Request {
        Request {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: Some(RequestId::Number(1)),
        }
    }

    async fn serve_lines<H: ToolHandler>(server: &mut McpServer<H>, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let mut server = McpServer::new(TestHandler);
        let response = server
            .handle_request(request("initialize", Some(json!({}))))
            .await
            .unwrap();
        assert!(response.error.is_none());
        assert!(server.is_initialized());

        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "clj-kondo-mcp");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_handle_tools_list() {
        let server = McpServer::new(TestHandler);
        let response = server.handle_tools_list(RequestId::Number(1));

        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], LINT_TOOL);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["target"]));
    }

    #[tokio::test]
    async fn test_handle_tools_call() {
        let server = McpServer::new(TestHandler);
        let params = json!({ "name": LINT_TOOL, "arguments": { "target": "/tmp/a.clj" } });

        let response = server.handle_tools_call(RequestId::Number(1), params).await;
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "lint_clojure:/tmp/a.clj");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_rpc_error() {
        let server = McpServer::new(TestHandler);
        let params = json!({ "name": LINT_TOOL, "arguments": {} });

        let response = server.handle_tools_call(RequestId::Number(1), params).await;
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_handle_unknown_tool() {
        let server = McpServer::new(TestHandler);

        let response = server
            .handle_tools_call(RequestId::Number(1), json!({ "name": "lint_python", "arguments": {} }))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("lint_python"));

        for params in [json!({ "arguments": {} }), json!({ "name": "", "arguments": {} })] {
            let response = server.handle_tools_call(RequestId::Number(2), params).await;
            let error = response.error.unwrap();
            assert_eq!(error.code, -32601);
            assert_eq!(error.message, "Unknown tool: undefined");
        }
    }

    #[tokio::test]
    async fn test_missing_arguments_is_invalid_params() {
        let server = McpServer::new(TestHandler);
        let response = server
            .handle_tools_call(RequestId::Number(1), json!({ "name": LINT_TOOL }))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_handle_unknown_method() {
        let mut server = McpServer::new(TestHandler);
        let response = server
            .handle_request(request("resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_serve_session() {
        let mut server = McpServer::new(TestHandler);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":"call","method":"tools/call","params":{"name":"lint_clojure","arguments":{"target":"src"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#,
        );

        let responses = serve_lines(&mut server, input).await;
        assert_eq!(responses.len(), 5);

        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"][0]["name"], LINT_TOOL);
        assert!(responses[2]["id"].is_null());
        assert_eq!(responses[2]["error"]["code"], -32700);
        assert_eq!(responses[3]["id"], "call");
        assert_eq!(responses[3]["result"]["content"][0]["text"], "lint_clojure:src");
        assert_eq!(responses[4]["id"], 4);
        assert_eq!(responses[4]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let mut server = McpServer::new(TestHandler);
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"\xff\"}\n".to_vec();
        input.extend_from_slice(b"\xfe\xff garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server.serve(&input[..], &mut output).await.unwrap();
        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        // Lossy decoding keeps the first line parseable as an unknown method
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["error"]["code"], -32601);
        assert!(responses[1]["id"].is_null());
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_invalid_request_shape() {
        let mut server = McpServer::new(TestHandler);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1}"#,
            "\n",
            r#"[{"jsonrpc":"2.0","id":2,"method":"ping"}]"#,
            "\n",
        );

        let responses = serve_lines(&mut server, input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert_eq!(responses[1]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_idle_server() {
        let mut server = McpServer::new(TestHandler);
        // Keep the writing half open so the reader never reaches EOF
        let (_client, server_end) = tokio::io::duplex(64);

        let exit = server
            .serve_until(
                BufReader::new(server_end),
                Vec::new(),
                std::future::ready(Ok(())),
            )
            .await
            .unwrap();
        assert_eq!(exit, ServeExit::Interrupted);
    }

    #[tokio::test]
    async fn test_serve_until_eof_without_signal() {
        let mut server = McpServer::new(TestHandler);
        let input = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let mut output = Vec::new();

        let exit = server
            .serve_until(input.as_bytes(), &mut output, std::future::pending())
            .await
            .unwrap();
        assert_eq!(exit, ServeExit::Eof);
        assert!(String::from_utf8(output).unwrap().contains(r#""id":1"#));
    }

    #[tokio::test]
    async fn test_shutdown_signal_error_is_reported() {
        let mut server = McpServer::new(TestHandler);
        let (_client, server_end) = tokio::io::duplex(64);

        let result = server
            .serve_until(
                BufReader::new(server_end),
                Vec::new(),
                std::future::ready(Err(std::io::Error::other("no signal handler"))),
            )
            .await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_serve_lint_findings() {
        use kondo_runner::KondoRunner;

        let runner = KondoRunner::with_command(
            "sh",
            ["-c", "printf 'a.clj:1:1: warning: unused var'; exit 2", "clj-kondo"],
        );
        let mut server = McpServer::new(LintHandler::new(runner));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"lint_clojure","arguments":{"target":"/tmp/a.clj"}}}"#,
            "\n",
        );

        let responses = serve_lines(&mut server, input).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].get("error").is_none());
        assert_eq!(
            responses[0]["result"]["content"][0]["text"],
            "a.clj:1:1: warning: unused var"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_serve_silent_failure() {
        use kondo_runner::KondoRunner;

        let runner = KondoRunner::with_command("sh", ["-c", "exit 127", "clj-kondo"]);
        let mut server = McpServer::new(LintHandler::new(runner));
        let input = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"lint_clojure","arguments":{"target":"/tmp/a.clj"}}}"#;

        let responses = serve_lines(&mut server, input).await;
        assert_eq!(responses[0]["error"]["code"], -32603);
        assert!(responses[0].get("result").is_none());
    }
}
