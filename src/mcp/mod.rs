use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reqwest::Method;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:21547";
const TOKEN_FILE: &str = ".kanban-token";

#[derive(Clone)]
pub struct KanbanMcp {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct BoardInput {
    /// Action: "list" (default), "create", or "quick"
    #[serde(default = "default_list")]
    action: String,
    /// Restrict "list" to boards of this doctype
    doctype: Option<String>,
    /// Board name (required for "create" and "quick")
    name: Option<String>,
    /// Reference doctype (required for "create" and "quick")
    reference_doctype: Option<String>,
    /// Grouping field (required for "create" and "quick")
    field_name: Option<String>,
    /// Column names for "create"
    #[serde(default)]
    columns: Vec<String>,
    /// Project filter for "quick"
    project: Option<String>,
    #[serde(default)]
    private: bool,
}

fn default_list() -> String {
    "list".to_string()
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetBoardInput {
    board_id: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct ColumnInput {
    board_id: String,
    /// Action: "add", "archive", "restore", "indicator", or "reorder"
    action: String,
    /// Column name (required for every action except "reorder")
    column: Option<String>,
    /// Indicator color (required for "indicator")
    indicator: Option<String>,
    /// Full list of column names in the new order (required for "reorder")
    #[serde(default)]
    order: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct MoveCardInput {
    board_id: String,
    item: String,
    from_column: String,
    to_column: String,
    old_index: usize,
    new_index: usize,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct AddCardInput {
    board_id: String,
    item: String,
    column: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct BulkOrderInput {
    board_id: String,
    /// Map of column name to the full ordered list of items in that column
    order: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct UserSettingsInput {
    doctype: String,
    /// Action: "get" (default) or "save"
    #[serde(default = "default_get")]
    action: String,
    /// JSON object merged into the stored settings (required for "save")
    settings: Option<Value>,
}

fn default_get() -> String {
    "get".to_string()
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct RefreshInput {
    doctype: String,
    name: String,
}

#[tool_router]
impl KanbanMcp {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: resolve_token(token),
            tool_router: Self::tool_router(),
        }
    }

    fn api_err(msg: String) -> McpError {
        McpError::internal_error(msg, None)
    }

    fn missing(field: &str, action: &str) -> McpError {
        McpError::invalid_params(format!("{} is required for action '{}'", field, action), None)
    }

    fn json_result(value: &Value) -> Result<CallToolResult, McpError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, McpError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method.clone(), &url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Self::api_err(format!("HTTP {} {}: {}", method, path, e)))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(Self::api_err(format!("API error {}: {}", status, body_text)));
        }
        resp.json()
            .await
            .map_err(|e| Self::api_err(format!("JSON decode: {}", e)))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, McpError> {
        self.send(Method::GET, path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, McpError> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, McpError> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, McpError> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    #[tool(
        description = "Manage Kanban boards. Actions: \"list\" (default, optional doctype), \"create\" (requires name, reference_doctype, field_name; optional columns), \"quick\" (requires name, reference_doctype, field_name; columns come from the field's options). Returns board JSON."
    )]
    async fn kanban_board(
        &self,
        Parameters(input): Parameters<BoardInput>,
    ) -> Result<CallToolResult, McpError> {
        match input.action.as_str() {
            "list" => {
                let query: Vec<(&str, &str)> = input
                    .doctype
                    .as_deref()
                    .map(|d| vec![("doctype", d)])
                    .unwrap_or_default();
                let data = self.get("/api/boards", &query).await?;
                Self::json_result(&data)
            }
            "create" => {
                let name = input.name.ok_or_else(|| Self::missing("name", "create"))?;
                let doctype = input
                    .reference_doctype
                    .ok_or_else(|| Self::missing("reference_doctype", "create"))?;
                let field = input
                    .field_name
                    .ok_or_else(|| Self::missing("field_name", "create"))?;
                let body = json!({
                    "name": name,
                    "reference_doctype": doctype,
                    "field_name": field,
                    "columns": input.columns,
                    "private": input.private,
                });
                let data = self.post("/api/boards", &body).await?;
                Self::json_result(&data)
            }
            "quick" => {
                let name = input.name.ok_or_else(|| Self::missing("name", "quick"))?;
                let doctype = input
                    .reference_doctype
                    .ok_or_else(|| Self::missing("reference_doctype", "quick"))?;
                let field = input
                    .field_name
                    .ok_or_else(|| Self::missing("field_name", "quick"))?;
                let body = json!({
                    "doctype": doctype,
                    "board_name": name,
                    "field_name": field,
                    "project": input.project,
                });
                let data = self.post("/api/boards/quick", &body).await?;
                Self::json_result(&data)
            }
            other => Err(McpError::invalid_params(
                format!("Unknown action '{}'. Valid: list, create, quick", other),
                None,
            )),
        }
    }

    #[tool(
        description = "Get one board with its columns and each column's ordered card list."
    )]
    async fn kanban_get_board(
        &self,
        Parameters(input): Parameters<GetBoardInput>,
    ) -> Result<CallToolResult, McpError> {
        let data = self
            .get(&format!("/api/boards/{}", input.board_id), &[])
            .await?;
        Self::json_result(&data)
    }

    #[tool(
        description = "Change board columns. Actions: \"add\" (column), \"archive\" (column), \"restore\" (column), \"indicator\" (column, indicator), \"reorder\" (order: every column name in the new order)."
    )]
    async fn kanban_column(
        &self,
        Parameters(input): Parameters<ColumnInput>,
    ) -> Result<CallToolResult, McpError> {
        let base = format!("/api/boards/{}/columns", input.board_id);
        let action = input.action.as_str();
        let data = match action {
            "add" => {
                let column = input.column.ok_or_else(|| Self::missing("column", action))?;
                self.post(&base, &json!({ "column_title": column })).await?
            }
            "archive" | "restore" => {
                let column = input.column.ok_or_else(|| Self::missing("column", action))?;
                let status = if action == "archive" { "archived" } else { "active" };
                self.patch(
                    &format!("{}/status", base),
                    &json!({ "column_title": column, "status": status }),
                )
                .await?
            }
            "indicator" => {
                let column = input.column.ok_or_else(|| Self::missing("column", action))?;
                let indicator = input
                    .indicator
                    .ok_or_else(|| Self::missing("indicator", action))?;
                self.patch(
                    &format!("{}/indicator", base),
                    &json!({ "column_name": column, "indicator": indicator }),
                )
                .await?
            }
            "reorder" => {
                if input.order.is_empty() {
                    return Err(Self::missing("order", action));
                }
                self.put(&format!("{}/order", base), &json!({ "order": input.order }))
                    .await?
            }
            other => {
                return Err(McpError::invalid_params(
                    format!(
                        "Unknown action '{}'. Valid: add, archive, restore, indicator, reorder",
                        other
                    ),
                    None,
                ))
            }
        };
        Self::json_result(&data)
    }

    #[tool(
        description = "Move a card between positions or columns. old_index is the card's current position in from_column; new_index is the target position in to_column. Moving across columns also updates the card's grouping field."
    )]
    async fn kanban_move_card(
        &self,
        Parameters(input): Parameters<MoveCardInput>,
    ) -> Result<CallToolResult, McpError> {
        let body = json!({
            "item": input.item,
            "from_column": input.from_column,
            "to_column": input.to_column,
            "old_index": input.old_index,
            "new_index": input.new_index,
        });
        let data = self
            .patch(&format!("/api/boards/{}/cards/move", input.board_id), &body)
            .await?;
        Self::json_result(&data)
    }

    #[tool(description = "Put a newly created card at the top of a column.")]
    async fn kanban_add_card(
        &self,
        Parameters(input): Parameters<AddCardInput>,
    ) -> Result<CallToolResult, McpError> {
        let data = self
            .post(
                &format!("/api/boards/{}/cards", input.board_id),
                &json!({ "item": input.item, "column": input.column }),
            )
            .await?;
        Self::json_result(&data)
    }

    #[tool(
        description = "Replace the full card order of one or more columns. Cards found in a different column have their grouping field updated. Returns the board and the cards that changed column."
    )]
    async fn kanban_set_order(
        &self,
        Parameters(input): Parameters<BulkOrderInput>,
    ) -> Result<CallToolResult, McpError> {
        let data = self
            .put(
                &format!("/api/boards/{}/order", input.board_id),
                &json!({ "order": input.order }),
            )
            .await?;
        Self::json_result(&data)
    }

    #[tool(
        description = "Read or merge the caller's saved view settings for a doctype. Actions: \"get\" (default) or \"save\" (requires settings object)."
    )]
    async fn kanban_user_settings(
        &self,
        Parameters(input): Parameters<UserSettingsInput>,
    ) -> Result<CallToolResult, McpError> {
        let path = format!("/api/user-settings/{}", input.doctype);
        let data = match input.action.as_str() {
            "get" => self.get(&path, &[]).await?,
            "save" => {
                let settings = input.settings.ok_or_else(|| Self::missing("settings", "save"))?;
                self.put(&path, &settings).await?
            }
            other => {
                return Err(McpError::invalid_params(
                    format!("Unknown action '{}'. Valid: get, save", other),
                    None,
                ))
            }
        };
        Self::json_result(&data)
    }

    #[tool(
        description = "Ask every open Kanban view to refresh after a short delay. Returns an acknowledgement string."
    )]
    async fn kanban_refresh(
        &self,
        Parameters(input): Parameters<RefreshInput>,
    ) -> Result<CallToolResult, McpError> {
        let data = self
            .post(
                "/api/refresh",
                &json!({ "doctype": input.doctype, "name": input.name }),
            )
            .await?;
        Self::json_result(&data)
    }
}

#[tool_handler]
impl ServerHandler for KanbanMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Kanban board and view settings tools. Proxies to the kanban REST API for all operations."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn resolve_token(explicit: Option<String>) -> Option<String> {
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Some(token.trim().to_string());
    }

    if let Ok(token) = std::env::var("KANBAN_TOKEN") {
        let trimmed = token.trim().to_string();
        if !trimmed.is_empty() {
            return Some(trimmed);
        }
    }

    if let Some(token) = read_token_file(Path::new(TOKEN_FILE)) {
        return Some(token);
    }

    if let Some(path) = binary_parent_token_path() {
        if let Some(token) = read_token_file(&path) {
            return Some(token);
        }
    }

    tracing::warn!("No API token found in KANBAN_TOKEN or {}; requests will be rejected", TOKEN_FILE);
    None
}

fn read_token_file(path: &Path) -> Option<String> {
    let token = std::fs::read_to_string(path).ok()?;
    let trimmed = token.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    tracing::info!("Loaded API token from {}", path.display());
    Some(trimmed)
}

fn binary_parent_token_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let parent = exe.parent()?;
    Some(parent.join(TOKEN_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let mcp = KanbanMcp::new("http://localhost:9000/", Some("tok".into()));
        assert_eq!(mcp.base_url, "http://localhost:9000");
        assert_eq!(mcp.token.as_deref(), Some("tok"));
    }

    #[test]
    fn token_file_ignores_blank_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        std::fs::write(&path, "   \n").unwrap();
        assert_eq!(read_token_file(&path), None);

        std::fs::write(&path, " abc.def \n").unwrap();
        assert_eq!(read_token_file(&path).as_deref(), Some("abc.def"));
    }
}
