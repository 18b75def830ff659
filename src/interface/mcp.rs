//! MCP Server for athenaeum
//!
//! MCP Protocol (stdio) <-> application::CatalogClient / BookmarkService
//!
//! 10 tools: search_books, get_book, featured_books, topics,
//! bookmarks, bookmark_add, bookmark_remove, bookmark_toggle, bookmark_status, bookmarks_clear

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::bookmarks::BookmarkService;
use crate::application::catalog::{extract_topics, CatalogClient};
use crate::application::error::RemoteFetchError;
use crate::config::Config;
use crate::domain::model::book::Book;
use crate::domain::model::bookmark::Bookmark;
use crate::domain::model::id::BookId;
use crate::domain::model::query::{CatalogPage, CatalogQuery};
use crate::infra::http::ReqwestTransport;
use crate::infra::json_store::JsonSlotStorage;

/// `featured_books` の既定件数
const DEFAULT_FEATURED_LIMIT: usize = 6;

/// 一覧表示で出すsubjectの数
const LIST_SUBJECTS: usize = 3;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。
pub async fn run(config: Config) -> anyhow::Result<()> {
    let transport = ReqwestTransport::new(config.http_timeout)?;
    let catalog = CatalogClient::new(transport, config.api_url.clone());
    let bookmarks = BookmarkService::new(JsonSlotStorage::new(config.data_dir.clone()));

    tracing::info!(
        api_url = %catalog.base_url(),
        data_dir = %config.data_dir.display(),
        "starting athenaeum MCP server"
    );

    let server = AthenaeumServer::new(catalog, bookmarks);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct AthenaeumServer {
    catalog: Arc<CatalogClient<ReqwestTransport>>,
    /// read-modify-write を直列化する
    bookmarks: Arc<Mutex<BookmarkService<JsonSlotStorage>>>,
    tool_router: ToolRouter<Self>,
}

impl AthenaeumServer {
    fn new(
        catalog: CatalogClient<ReqwestTransport>,
        bookmarks: BookmarkService<JsonSlotStorage>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            bookmarks: Arc::new(Mutex::new(bookmarks)),
            tool_router: Self::tool_router(),
        }
    }

    /// ブックマークストアをロックして処理する。awaitを跨いで保持しないこと。
    fn with_bookmarks<R>(
        &self,
        f: impl FnOnce(&BookmarkService<JsonSlotStorage>) -> R,
    ) -> Result<R, McpError> {
        let guard = self
            .bookmarks
            .lock()
            .map_err(|_| McpError::internal_error("Lock poisoned", None))?;
        Ok(f(&guard))
    }

    /// 保存済みIDの集合（一覧表示の★判定用）
    fn saved_ids(&self) -> Result<HashSet<BookId>, McpError> {
        self.with_bookmarks(|svc| svc.list().iter().map(|b| b.id()).collect())
    }

    fn to_mcp_error(e: RemoteFetchError) -> McpError {
        match e {
            RemoteFetchError::NotFound(id) => {
                McpError::invalid_params(format!("No book with id {id} in the catalog"), None)
            }
            RemoteFetchError::InvalidQuery(e) => McpError::invalid_params(format!("{e}"), None),
            other => McpError::internal_error(format!("{other}"), None),
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for AthenaeumServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "athenaeum".to_string(),
                title: Some("The Digital Athenaeum".to_string()),
                description: Some(
                    "Search and browse public-domain books, and keep a local bookmark library."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Browse the catalog with `search_books` (filters: search, topic, author birth-year range, page) \
                 or `featured_books`. Inspect one book with `get_book`.\n\
                 \n\
                 Bookmarks are stored locally: `bookmark_toggle`/`bookmark_add`/`bookmark_remove` by book ID, \
                 `bookmarks` to list (newest first, optional filter), `bookmark_status`, `bookmarks_clear`."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
struct McpSearchRequest {
    #[schemars(description = "Free-text search over titles and author names")]
    pub search: Option<String>,
    #[schemars(description = "Topic filter matched against subjects and bookshelves (e.g. 'Fiction')")]
    pub topic: Option<String>,
    #[schemars(description = "Only authors born in or after this year (negative for BCE)")]
    pub author_year_start: Option<i32>,
    #[schemars(description = "Only authors born in or before this year (negative for BCE)")]
    pub author_year_end: Option<i32>,
    #[schemars(description = "Page number, starting at 1 (default: 1)")]
    pub page: Option<u32>,
}

impl From<McpSearchRequest> for CatalogQuery {
    fn from(req: McpSearchRequest) -> Self {
        CatalogQuery {
            search: req.search,
            topic: req.topic,
            author_year_start: req.author_year_start,
            author_year_end: req.author_year_end,
            page: req.page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookRequest {
    #[schemars(description = "Book ID as shown in brackets in search results (e.g. 1342)")]
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFeaturedRequest {
    #[schemars(description = "Number of books to show (default: 6)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookmarksRequest {
    #[schemars(description = "Case-insensitive filter on title or author name. Omit to list all.")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookmarkStatusRequest {
    #[schemars(description = "Book ID to check. Omit to show only the bookmark count.")]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpClearRequest {}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl AthenaeumServer {
    #[tool(
        name = "search_books",
        description = "Search the public-domain catalog. All filters are optional; empty filters are ignored. Results show [ID] title — authors, with ★ on bookmarked books.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn search_books(
        &self,
        Parameters(req): Parameters<McpSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let query = CatalogQuery::from(req);
        let page = self
            .catalog
            .fetch_page(&query)
            .await
            .map_err(Self::to_mcp_error)?;

        let saved = self.saved_ids()?;
        let output = format_page(&page, |id| saved.contains(&id));
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "get_book",
        description = "Show full details for one book: authors with life years, subjects, bookshelves, languages and download links.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn get_book(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = BookId::new(req.id);
        let book = self
            .catalog
            .fetch_by_id(id)
            .await
            .map_err(Self::to_mcp_error)?;

        let bookmarked = self.with_bookmarks(|svc| svc.contains(id))?;
        Ok(CallToolResult::success(vec![Content::text(format_book_detail(
            &book, bookmarked,
        ))]))
    }

    #[tool(
        name = "featured_books",
        description = "Show a handful of popular classic fiction titles.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn featured_books(
        &self,
        Parameters(req): Parameters<McpFeaturedRequest>,
    ) -> Result<CallToolResult, McpError> {
        let limit = req.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
        let books = self
            .catalog
            .featured(limit)
            .await
            .map_err(Self::to_mcp_error)?;

        if books.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No featured books available right now.",
            )]));
        }

        let saved = self.saved_ids()?;
        let mut output = String::from("# Featured classics\n\n");
        for book in &books {
            output.push_str(&format_book_line(book, saved.contains(&book.id)));
            output.push('\n');
        }
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "topics",
        description = "List the main topics found on one page of search results. Useful for picking a `topic` filter.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn topics(
        &self,
        Parameters(req): Parameters<McpSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let page = self
            .catalog
            .fetch_page(&CatalogQuery::from(req))
            .await
            .map_err(Self::to_mcp_error)?;

        let topics = extract_topics(&page.results);
        if topics.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No topics found on this page.",
            )]));
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "# Topics ({})\n\n{}",
            topics.len(),
            topics.join("\n")
        ))]))
    }

    #[tool(
        name = "bookmarks",
        description = "List bookmarked books, most recently saved first. Optionally filter by title or author.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn bookmarks(
        &self,
        Parameters(req): Parameters<McpBookmarksRequest>,
    ) -> Result<CallToolResult, McpError> {
        let (total, shown) = self.with_bookmarks(|svc| {
            let shown = match req.filter.as_deref() {
                Some(term) => svc.filter(term),
                None => svc.recent(),
            };
            (svc.count(), shown)
        })?;

        if total == 0 {
            return Ok(CallToolResult::success(vec![Content::text(
                "Your library is empty. Use `bookmark_toggle` on a book from `search_books` to save it.",
            )]));
        }
        if shown.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "No bookmarks match '{}' ({} saved).",
                req.filter.unwrap_or_default(),
                total
            ))]));
        }
        Ok(CallToolResult::success(vec![Content::text(format_library(
            &shown, total,
        ))]))
    }

    #[tool(
        name = "bookmark_add",
        description = "Bookmark a book by ID. Does nothing if it is already bookmarked.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    async fn bookmark_add(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = BookId::new(req.id);
        if let Some(existing) = self.with_bookmarks(|svc| svc.get(id))? {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "Already bookmarked: [{}] {}",
                id,
                existing.book().title
            ))]));
        }

        let book = self
            .catalog
            .fetch_by_id(id)
            .await
            .map_err(Self::to_mcp_error)?;
        let added = self.with_bookmarks(|svc| svc.add(&book))?;

        let msg = if added {
            format!("Bookmarked: [{}] {}", id, book.title)
        } else {
            format!("Could not bookmark [{}] {} (storage unavailable or already saved)", id, book.title)
        };
        Ok(CallToolResult::success(vec![Content::text(msg)]))
    }

    #[tool(
        name = "bookmark_remove",
        description = "Remove a bookmark by ID. Removing a book that is not bookmarked is not an error.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn bookmark_remove(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = BookId::new(req.id);
        let ok = self.with_bookmarks(|svc| svc.remove(id))?;
        if !ok {
            return Err(McpError::internal_error(
                format!("Failed to remove bookmark {id}: storage unavailable"),
                None,
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Removed bookmark {id}"
        ))]))
    }

    #[tool(
        name = "bookmark_toggle",
        description = "Toggle a book's bookmark: saves it if not bookmarked, removes it otherwise. Reports the resulting state.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn bookmark_toggle(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = BookId::new(req.id);

        // 保存済みなら保存内容で、未保存ならカタログから取得してトグルする
        let book = match self.with_bookmarks(|svc| svc.get(id))? {
            Some(existing) => existing.into_book(),
            None => self
                .catalog
                .fetch_by_id(id)
                .await
                .map_err(Self::to_mcp_error)?,
        };

        let (bookmarked, count) = self.with_bookmarks(|svc| (svc.toggle(&book), svc.count()))?;
        let state = if bookmarked { "★ Bookmarked" } else { "Removed" };
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{}: [{}] {} ({} in library)",
            state, id, book.title, count
        ))]))
    }

    #[tool(
        name = "bookmark_status",
        description = "Show how many books are bookmarked, and whether a given book ID is among them.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn bookmark_status(
        &self,
        Parameters(req): Parameters<McpBookmarkStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = req.id.map(BookId::new);
        let (count, contains) =
            self.with_bookmarks(|svc| (svc.count(), id.map(|id| svc.contains(id))))?;

        let mut output = format!("{count} book(s) in library");
        if let (Some(id), Some(contains)) = (id, contains) {
            let state = if contains { "bookmarked" } else { "not bookmarked" };
            output.push_str(&format!("\nBook {id}: {state}"));
        }
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "bookmarks_clear",
        description = "Delete every bookmark. This cannot be undone.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn bookmarks_clear(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpClearRequest>,
    ) -> Result<CallToolResult, McpError> {
        let (count, ok) = self.with_bookmarks(|svc| (svc.count(), svc.clear_all()))?;
        if !ok {
            return Err(McpError::internal_error(
                "Failed to clear bookmarks: storage unavailable",
                None,
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Cleared {count} bookmark(s)"
        ))]))
    }
}

// =============================================================================
// Helpers — text rendering
// =============================================================================

/// `★ [1342] Pride and Prejudice — Austen, Jane (Courtship, England, Sisters)`
fn format_book_line(book: &Book, bookmarked: bool) -> String {
    let marker = if bookmarked { "★" } else { "·" };
    let subjects = book.main_subjects(LIST_SUBJECTS);
    let mut line = format!("{} [{}] {} — {}", marker, book.id, book.title, book.author_names());
    if !subjects.is_empty() {
        line.push_str(&format!(" ({})", subjects.join(", ")));
    }
    line
}

fn format_page(page: &CatalogPage, is_bookmarked: impl Fn(BookId) -> bool) -> String {
    if page.results.is_empty() {
        return "No books found. Try adjusting your search or filters.".to_string();
    }

    let mut output = format!(
        "# Page {} of {} ({} books)\n\n",
        page.current_page,
        page.total_pages().max(1),
        page.count
    );
    for book in &page.results {
        output.push_str(&format_book_line(book, is_bookmarked(book.id)));
        output.push('\n');
    }

    let mut nav = Vec::new();
    if page.has_previous {
        nav.push(format!("previous: page {}", page.current_page.saturating_sub(1)));
    }
    if page.has_next {
        nav.push(format!("next: page {}", page.current_page.saturating_add(1)));
    }
    if !nav.is_empty() {
        output.push_str(&format!("\n({})\n", nav.join(", ")));
    }
    output
}

fn format_life_years(birth: Option<i32>, death: Option<i32>) -> Option<String> {
    match (birth, death) {
        (None, None) => None,
        (b, d) => Some(format!(
            "{}-{}",
            b.map(|y| y.to_string()).unwrap_or_else(|| "?".into()),
            d.map(|y| y.to_string()).unwrap_or_else(|| "?".into())
        )),
    }
}

fn format_book_detail(book: &Book, bookmarked: bool) -> String {
    let mut output = format!("# {}\n\n", book.title);

    if book.authors.is_empty() {
        output.push_str(&format!("Author: {}\n", book.author_names()));
    } else {
        for author in &book.authors {
            match format_life_years(author.birth_year, author.death_year) {
                Some(years) => output.push_str(&format!("Author: {} ({})\n", author.name, years)),
                None => output.push_str(&format!("Author: {}\n", author.name)),
            }
        }
    }

    output.push_str(&format!(
        "ID: {} | Downloads: {} | Languages: {}\n",
        book.id,
        book.download_count,
        if book.languages.is_empty() {
            "-".to_string()
        } else {
            book.languages.join(", ")
        }
    ));
    if let Some(copyright) = book.copyright {
        output.push_str(&format!(
            "Copyright: {}\n",
            if copyright { "yes" } else { "public domain" }
        ));
    }
    output.push_str(&format!(
        "Bookmarked: {}\n",
        if bookmarked { "★ yes" } else { "no" }
    ));

    if !book.subjects.is_empty() {
        output.push_str("\n## Subjects\n");
        for subject in &book.subjects {
            output.push_str(&format!("- {subject}\n"));
        }
    }
    if !book.bookshelves.is_empty() {
        output.push_str("\n## Bookshelves\n");
        for shelf in &book.bookshelves {
            output.push_str(&format!("- {shelf}\n"));
        }
    }

    let links = book.download_links();
    if !links.is_empty() {
        output.push_str("\n## Read & download\n");
        for link in links {
            output.push_str(&format!("- {}: {}\n", link.label, link.url));
        }
    }
    if let Some(cover) = book.cover_url() {
        output.push_str(&format!("\nCover: {cover}\n"));
    }
    output
}

fn format_library(shown: &[Bookmark], total: usize) -> String {
    let mut output = if shown.len() == total {
        format!("# Library ({total} books)\n\n")
    } else {
        format!("# Library ({} of {} books)\n\n", shown.len(), total)
    };
    for bookmark in shown {
        output.push_str(&format!(
            "{} — saved {}\n",
            format_book_line(bookmark.book(), true),
            bookmark.bookmarked_at().format("%Y-%m-%d")
        ));
    }
    output
}
