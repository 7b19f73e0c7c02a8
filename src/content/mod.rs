pub mod document;
pub mod service;

pub use document::{Block, BlockKind, Column, ContentEdit, LocalizedText, PageDocument, Row, GRID_COLUMNS};
pub use service::{edit, put, reset, resolve, PageSource, ResolvedPage, HOME_PAGE_KEY};

use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Row not found: {0}")]
    RowNotFound(Uuid),

    #[error("Column not found: {0}")]
    ColumnNotFound(Uuid),

    #[error("Block not found: {0}")]
    BlockNotFound(Uuid),

    #[error("Column width must be between 1 and {max}, got {0}", max = GRID_COLUMNS)]
    InvalidWidth(u8),

    #[error("Row {row_id} is {total} columns wide, the grid has {max}", max = GRID_COLUMNS)]
    RowTooWide { row_id: Uuid, total: u32 },

    #[error("Media URL must be http(s): '{0}'")]
    InvalidUrl(String),

    #[error("Stored page is not a valid document: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
