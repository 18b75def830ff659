//! The Digital Athenaeum: a public-domain book catalog client with a local bookmark library.
//!
//! - `domain`: books, bookmarks, catalog queries and the storage / transport seams
//! - `application`: `CatalogClient` and `BookmarkService`
//! - `infra`: JSON file slots and the reqwest transport
//! - `interface`: MCP stdio server

pub mod config;

pub mod domain {
    pub mod catalog;
    pub mod error;
    pub mod repository;

    pub mod model {
        pub mod book;
        pub mod bookmark;
        pub mod id;
        pub mod query;
    }
}

pub mod application {
    pub mod bookmarks;
    pub mod catalog;
    pub mod error;
}

pub mod infra {
    pub mod http;
    pub mod json_store;
}

pub mod interface {
    pub mod mcp;
}
