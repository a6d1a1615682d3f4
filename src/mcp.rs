use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    batch::BatchOperations,
    config::Config,
    document::{Metadata, NewDocument},
    error::Error,
    index::SemanticIndex,
    ranking::DEFAULT_RERANK_TOP_K,
    search::SearchParams,
};

/// MCP stdio transport over one shared [`SemanticIndex`].
///
/// Pure glue: tools parse request structures, delegate to the index, and
/// map the error taxonomy onto protocol errors.
#[derive(Clone)]
pub struct EmbedexMcpServer {
    index: Arc<SemanticIndex>,
    tool_router: ToolRouter<Self>,
}

impl EmbedexMcpServer {
    pub fn new(index: SemanticIndex) -> Self {
        Self {
            index: Arc::new(index),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl EmbedexMcpServer {
    /// Index a single document, generating an id when none is given.
    #[tool(
        name = "embedex_index",
        description = "Index a text document. Content is required; id, title, and metadata are optional."
    )]
    pub async fn embedex_index(
        &self,
        params: Parameters<NewDocument>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let view = self.index.index_document(params.0).map_err(mcp_error)?;

        let summary = format!("Indexed document {} ({})", view.id, view.title);
        let structured =
            serde_json::to_value(&view).map_err(serialization_error)?;

        Ok(success_result(summary, structured))
    }

    /// Index many documents with per-item failure reporting.
    #[tool(
        name = "embedex_batch_index",
        description = "Index multiple documents at once. A malformed item is reported under `failed` without aborting the rest."
    )]
    pub async fn embedex_batch_index(
        &self,
        params: Parameters<BatchIndexParams>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let summary =
            BatchOperations::new(&self.index).batch_index(params.0.documents);

        let text = format!(
            "Indexed {} of {} document(s), {} failed",
            summary.success.len(),
            summary.total,
            summary.failed.len()
        );
        let structured =
            serde_json::to_value(&summary).map_err(serialization_error)?;

        Ok(success_result(text, structured))
    }

    /// Search stored documents by similarity to the query.
    #[tool(
        name = "embedex_search",
        description = "Semantic search over indexed documents. Supports exact-match metadata filters, lexical title reranking, and time decay."
    )]
    pub async fn embedex_search(
        &self,
        params: Parameters<SearchToolParams>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let search = SearchParams {
            query: params.query,
            filters: params.filters.unwrap_or_default(),
            top_k: params.top_k,
            rerank: params.rerank.unwrap_or(false).then(|| {
                params.rerank_top_k.unwrap_or(DEFAULT_RERANK_TOP_K)
            }),
            time_decay: params.time_decay,
        };

        let response = self.index.search(&search).map_err(mcp_error)?;

        let text = format_search_summary(&response);
        let structured =
            serde_json::to_value(&response).map_err(serialization_error)?;

        Ok(success_result(text, structured))
    }

    /// Fetch a document projection by id.
    #[tool(
        name = "embedex_get",
        description = "Retrieve a stored document by id. The embedding is never exposed."
    )]
    pub async fn embedex_get(
        &self,
        params: Parameters<DocumentRefParams>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let view =
            self.index.get_document(&params.0.id).map_err(mcp_error)?;

        let summary = format!("{} ({})", view.id, view.title);
        let structured =
            serde_json::to_value(&view).map_err(serialization_error)?;

        Ok(success_result(summary, structured))
    }

    /// Delete a document by id.
    #[tool(
        name = "embedex_delete",
        description = "Delete a document by id. Reports whether anything was removed; an unknown id is not an error."
    )]
    pub async fn embedex_delete(
        &self,
        params: Parameters<DocumentRefParams>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let id = params.0.id;
        let deleted = self.index.delete_document(&id);

        let text = if deleted {
            format!("Deleted document {id}")
        } else {
            format!("Document {id} not found")
        };
        let structured = serde_json::json!({ "id": id, "deleted": deleted });

        Ok(success_result(text, structured))
    }

    /// List the version history of a document.
    #[tool(
        name = "embedex_versions",
        description = "List the content versions recorded for a document, oldest first."
    )]
    pub async fn embedex_versions(
        &self,
        params: Parameters<DocumentRefParams>,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let versions = self.index.versions(&params.0.id);

        let text = format!("{} version(s)", versions.len());
        let structured =
            serde_json::to_value(&versions).map_err(serialization_error)?;

        Ok(success_result(text, structured))
    }

    /// Index and search-history statistics.
    #[tool(
        name = "embedex_stats",
        description = "Document counts, known categories, and search history statistics."
    )]
    pub async fn embedex_stats(
        &self,
    ) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
        let stats = self.index.stats();

        let text = format!(
            "{} document(s), {} categorie(s), {} recorded search(es)",
            stats.store.total_documents,
            stats.store.categories,
            stats.history.total_searches
        );
        let structured =
            serde_json::to_value(&stats).map_err(serialization_error)?;

        Ok(success_result(text, structured))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for EmbedexMcpServer {
    fn get_info(&self) -> ServerInfo {
        // `ServerInfo`/`Implementation` are `#[non_exhaustive]`, so they cannot
        // be built with struct literals here; start from `Default` and set the
        // intended fields.
        let mut server_info = Implementation::default();
        server_info.name = "embedex".to_string();
        server_info.title = Some("embedex MCP".to_string());
        server_info.version = env!("CARGO_PKG_VERSION").to_string();
        server_info.icons = None;
        server_info.website_url = None;

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "Use embedex_index to store documents and embedex_search to rank them against a query. State is in-memory and lives for the server process."
                .to_string(),
        );
        info
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchIndexParams {
    /// Documents to index in order.
    pub documents: Vec<NewDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchToolParams {
    /// Search query string.
    pub query: String,
    /// Exact-match metadata filters (AND across keys).
    pub filters: Option<Metadata>,
    /// Maximum number of results (default from configuration).
    pub top_k: Option<usize>,
    /// Enable the lexical title-boost rerank stage.
    pub rerank: Option<bool>,
    /// Result count for the rerank stage (default: 5).
    pub rerank_top_k: Option<usize>,
    /// Time-decay factor; enables exponential down-weighting by age.
    pub time_decay: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentRefParams {
    /// Document id.
    pub id: String,
}

fn format_search_summary(response: &crate::search::SearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results found for \"{}\"", response.query);
    }

    let mut lines = Vec::with_capacity(response.results.len() + 1);
    let suffix = if response.results.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} result{} for \"{}\":",
        response.results.len(),
        suffix,
        response.query
    ));

    for (i, hit) in response.results.iter().enumerate() {
        lines.push(format!(
            "{:>3}. [{:.4}] {} (#{})",
            i + 1,
            hit.similarity_score,
            hit.title,
            hit.document_id
        ));
    }

    lines.join("\n")
}

/// Build a successful tool result carrying both a human-readable summary and
/// a structured JSON payload. `CallToolResult` is `#[non_exhaustive]`, so it
/// cannot be built with a struct literal from this crate; `success` sets
/// `is_error: Some(false)` and `meta: None`, matching the intended fields.
fn success_result(text: String, structured: serde_json::Value) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(structured);
    result
}

fn mcp_error(error: Error) -> rmcp::ErrorData {
    match &error {
        Error::Validation(_) | Error::NotFound { .. } => {
            rmcp::ErrorData::invalid_params(error.to_string(), None)
        }
        // Full detail stays server-side; the caller gets a generic message.
        detail => {
            tracing::error!(%detail, "internal error");
            rmcp::ErrorData::internal_error("internal error".to_string(), None)
        }
    }
}

fn serialization_error(error: serde_json::Error) -> rmcp::ErrorData {
    tracing::error!(%error, "failed to serialize tool result");
    rmcp::ErrorData::internal_error("internal error".to_string(), None)
}

/// Serve the MCP stdio transport until the peer disconnects.
pub fn run_mcp(config: Config) -> crate::error::Result<()> {
    let index = SemanticIndex::new(config)?;
    let server = EmbedexMcpServer::new(index);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::Internal(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            Error::Internal(format!("MCP server initialization failed: {e}"))
        })?;
        running.waiting().await.map_err(|e| {
            Error::Internal(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}
