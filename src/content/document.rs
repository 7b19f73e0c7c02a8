use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::ContentError;

pub const GRID_COLUMNS: u8 = 12;
pub const DEFAULT_LOCALE: &str = "en";

/// Locale → text. Lookups fall back to English, then to any locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

impl LocalizedText {
    pub fn new(locale: &str, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(locale.to_string(), text.into());
        Self(map)
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(DEFAULT_LOCALE))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }

    /// An empty text removes the locale
    pub fn set(&mut self, locale: &str, text: &str) {
        if text.is_empty() {
            self.0.remove(locale);
        } else {
            self.0.insert(locale.to_string(), text.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Text {
        body: LocalizedText,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        caption: LocalizedText,
    },
    Video {
        url: String,
        #[serde(default)]
        caption: LocalizedText,
    },
}

impl BlockKind {
    fn media_url(&self) -> Option<&str> {
        match self {
            BlockKind::Text { .. } => None,
            BlockKind::Image { url, .. } | BlockKind::Video { url, .. } => Some(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub width: u8,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: Uuid,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Row {
    fn width(&self) -> u32 {
        self.columns.iter().map(|c| u32::from(c.width)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// One edit, as sent by the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ContentEdit {
    AddRow { index: Option<usize> },
    RemoveRow { row_id: Uuid },
    MoveRow { row_id: Uuid, index: usize },
    AddColumn { row_id: Uuid, width: u8 },
    RemoveColumn { column_id: Uuid },
    SetColumnWidth { column_id: Uuid, width: u8 },
    AddBlock { column_id: Uuid, kind: BlockKind },
    UpdateBlock { block_id: Uuid, kind: BlockKind },
    RemoveBlock { block_id: Uuid },
    MoveBlock { block_id: Uuid, column_id: Uuid, index: usize },
    SetBlockText { block_id: Uuid, locale: String, text: String },
}

fn check_width(width: u8) -> Result<(), ContentError> {
    if width == 0 || width > GRID_COLUMNS {
        return Err(ContentError::InvalidWidth(width));
    }
    Ok(())
}

impl PageDocument {
    pub fn apply(&mut self, edit: ContentEdit) -> Result<(), ContentError> {
        match edit {
            ContentEdit::AddRow { index } => { self.add_row(index); }
            ContentEdit::RemoveRow { row_id } => self.remove_row(row_id)?,
            ContentEdit::MoveRow { row_id, index } => self.move_row(row_id, index)?,
            ContentEdit::AddColumn { row_id, width } => { self.add_column(row_id, width)?; }
            ContentEdit::RemoveColumn { column_id } => self.remove_column(column_id)?,
            ContentEdit::SetColumnWidth { column_id, width } => self.set_column_width(column_id, width)?,
            ContentEdit::AddBlock { column_id, kind } => { self.add_block(column_id, kind)?; }
            ContentEdit::UpdateBlock { block_id, kind } => self.update_block(block_id, kind)?,
            ContentEdit::RemoveBlock { block_id } => self.remove_block(block_id)?,
            ContentEdit::MoveBlock { block_id, column_id, index } => self.move_block(block_id, column_id, index)?,
            ContentEdit::SetBlockText { block_id, locale, text } => self.set_block_text(block_id, &locale, &text)?,
        }
        Ok(())
    }

    /// New row with one full-width column; appended when `index` is past the end
    pub fn add_row(&mut self, index: Option<usize>) -> Uuid {
        let row = Row {
            id: Uuid::new_v4(),
            columns: vec![Column { id: Uuid::new_v4(), width: GRID_COLUMNS, blocks: Vec::new() }],
        };
        let id = row.id;
        let at = index.unwrap_or(self.rows.len()).min(self.rows.len());
        self.rows.insert(at, row);
        id
    }

    pub fn remove_row(&mut self, row_id: Uuid) -> Result<(), ContentError> {
        let at = self.row_index(row_id)?;
        self.rows.remove(at);
        Ok(())
    }

    pub fn move_row(&mut self, row_id: Uuid, index: usize) -> Result<(), ContentError> {
        let from = self.row_index(row_id)?;
        let row = self.rows.remove(from);
        let to = index.min(self.rows.len());
        self.rows.insert(to, row);
        Ok(())
    }

    pub fn add_column(&mut self, row_id: Uuid, width: u8) -> Result<Uuid, ContentError> {
        check_width(width)?;
        let at = self.row_index(row_id)?;
        let row = &mut self.rows[at];
        let total = row.width() + u32::from(width);
        if total > u32::from(GRID_COLUMNS) {
            return Err(ContentError::RowTooWide { row_id, total });
        }
        let id = Uuid::new_v4();
        row.columns.push(Column { id, width, blocks: Vec::new() });
        Ok(id)
    }

    pub fn remove_column(&mut self, column_id: Uuid) -> Result<(), ContentError> {
        let (r, c) = self.column_index(column_id)?;
        self.rows[r].columns.remove(c);
        Ok(())
    }

    pub fn set_column_width(&mut self, column_id: Uuid, width: u8) -> Result<(), ContentError> {
        check_width(width)?;
        let (r, c) = self.column_index(column_id)?;
        let row = &mut self.rows[r];
        let total = row.width() - u32::from(row.columns[c].width) + u32::from(width);
        if total > u32::from(GRID_COLUMNS) {
            return Err(ContentError::RowTooWide { row_id: row.id, total });
        }
        row.columns[c].width = width;
        Ok(())
    }

    pub fn add_block(&mut self, column_id: Uuid, kind: BlockKind) -> Result<Uuid, ContentError> {
        let (r, c) = self.column_index(column_id)?;
        let id = Uuid::new_v4();
        self.rows[r].columns[c].blocks.push(Block { id, kind });
        Ok(id)
    }

    pub fn update_block(&mut self, block_id: Uuid, kind: BlockKind) -> Result<(), ContentError> {
        self.block_mut(block_id)?.kind = kind;
        Ok(())
    }

    pub fn remove_block(&mut self, block_id: Uuid) -> Result<(), ContentError> {
        let (r, c, b) = self.block_index(block_id)?;
        self.rows[r].columns[c].blocks.remove(b);
        Ok(())
    }

    /// Moves a block within its column or into another one
    pub fn move_block(&mut self, block_id: Uuid, column_id: Uuid, index: usize) -> Result<(), ContentError> {
        // resolve the destination first so a bad id leaves the document untouched
        self.column_index(column_id)?;
        let (r, c, b) = self.block_index(block_id)?;
        let block = self.rows[r].columns[c].blocks.remove(b);
        let (tr, tc) = self.column_index(column_id)?;
        let blocks = &mut self.rows[tr].columns[tc].blocks;
        let to = index.min(blocks.len());
        blocks.insert(to, block);
        Ok(())
    }

    /// Text blocks take the body, media blocks the caption
    pub fn set_block_text(&mut self, block_id: Uuid, locale: &str, text: &str) -> Result<(), ContentError> {
        match &mut self.block_mut(block_id)?.kind {
            BlockKind::Text { body } => body.set(locale, text),
            BlockKind::Image { caption, .. } | BlockKind::Video { caption, .. } => caption.set(locale, text),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        for row in &self.rows {
            for column in &row.columns {
                check_width(column.width)?;
                for block in &column.blocks {
                    if let Some(url) = block.kind.media_url() {
                        let ok = url::Url::parse(url.trim())
                            .map(|u| u.scheme() == "http" || u.scheme() == "https")
                            .unwrap_or(false);
                        if !ok {
                            return Err(ContentError::InvalidUrl(url.to_string()));
                        }
                    }
                }
            }
            let total = row.width();
            if total > u32::from(GRID_COLUMNS) {
                return Err(ContentError::RowTooWide { row_id: row.id, total });
            }
        }
        Ok(())
    }

    pub fn block(&self, block_id: Uuid) -> Option<&Block> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.blocks.iter())
            .find(|b| b.id == block_id)
    }

    fn row_index(&self, row_id: Uuid) -> Result<usize, ContentError> {
        self.rows.iter().position(|r| r.id == row_id).ok_or(ContentError::RowNotFound(row_id))
    }

    fn column_index(&self, column_id: Uuid) -> Result<(usize, usize), ContentError> {
        for (r, row) in self.rows.iter().enumerate() {
            if let Some(c) = row.columns.iter().position(|c| c.id == column_id) {
                return Ok((r, c));
            }
        }
        Err(ContentError::ColumnNotFound(column_id))
    }

    fn block_index(&self, block_id: Uuid) -> Result<(usize, usize, usize), ContentError> {
        for (r, row) in self.rows.iter().enumerate() {
            for (c, column) in row.columns.iter().enumerate() {
                if let Some(b) = column.blocks.iter().position(|b| b.id == block_id) {
                    return Ok((r, c, b));
                }
            }
        }
        Err(ContentError::BlockNotFound(block_id))
    }

    fn block_mut(&mut self, block_id: Uuid) -> Result<&mut Block, ContentError> {
        let (r, c, b) = self.block_index(block_id)?;
        Ok(&mut self.rows[r].columns[c].blocks[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> BlockKind {
        BlockKind::Text { body: LocalizedText::new("en", s) }
    }

    #[test]
    fn localized_text_falls_back() {
        let mut t = LocalizedText::new("he", "שלום");
        assert_eq!(t.get("en"), Some("שלום"));
        t.set("en", "Welcome");
        assert_eq!(t.get("fr"), Some("Welcome"));
        assert_eq!(t.get("he"), Some("שלום"));
        t.set("en", "");
        assert_eq!(t.get("en"), Some("שלום"));
    }

    #[test]
    fn columns_cannot_overflow_the_grid() {
        let mut doc = PageDocument::default();
        let row = doc.add_row(None);
        let first = doc.rows[0].columns[0].id;
        assert!(matches!(doc.add_column(row, 4), Err(ContentError::RowTooWide { total: 16, .. })));
        doc.set_column_width(first, 8).unwrap();
        let second = doc.add_column(row, 4).unwrap();
        assert!(doc.set_column_width(second, 5).is_err());
        assert!(matches!(doc.set_column_width(second, 0), Err(ContentError::InvalidWidth(0))));
        doc.validate().unwrap();
    }

    #[test]
    fn blocks_move_across_columns() {
        let mut doc = PageDocument::default();
        let row = doc.add_row(None);
        let left = doc.rows[0].columns[0].id;
        doc.set_column_width(left, 6).unwrap();
        let right = doc.add_column(row, 6).unwrap();

        let a = doc.add_block(left, text("a")).unwrap();
        let b = doc.add_block(left, text("b")).unwrap();
        doc.move_block(b, right, 0).unwrap();
        doc.move_block(a, right, 99).unwrap();

        let ids: Vec<Uuid> = doc.rows[0].columns[1].blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![b, a]);
        assert!(doc.rows[0].columns[0].blocks.is_empty());

        assert!(doc.move_block(a, Uuid::new_v4(), 0).is_err());
        assert_eq!(doc.rows[0].columns[1].blocks.len(), 2);
    }

    #[test]
    fn rows_reorder_and_edits_apply() {
        let mut doc = PageDocument::default();
        let first = doc.add_row(None);
        let second = doc.add_row(None);
        doc.apply(ContentEdit::MoveRow { row_id: second, index: 0 }).unwrap();
        assert_eq!(doc.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);

        let column = doc.rows[1].columns[0].id;
        let block = doc.add_block(column, BlockKind::Video { url: "https://video.example.org/1".into(), caption: LocalizedText::default() }).unwrap();
        doc.apply(ContentEdit::SetBlockText { block_id: block, locale: "he".into(), text: "הדלקת נרות".into() }).unwrap();
        match &doc.block(block).unwrap().kind {
            BlockKind::Video { caption, .. } => assert_eq!(caption.get("he"), Some("הדלקת נרות")),
            other => panic!("unexpected block {:?}", other),
        }
        doc.apply(ContentEdit::RemoveRow { row_id: first }).unwrap();
        assert_eq!(doc.rows.len(), 1);
        assert!(matches!(doc.remove_row(first), Err(ContentError::RowNotFound(_))));
    }

    #[test]
    fn validate_rejects_bad_media_urls() {
        let mut doc = PageDocument::default();
        doc.add_row(None);
        let column = doc.rows[0].columns[0].id;
        doc.add_block(column, BlockKind::Image { url: "javascript:alert(1)".into(), alt: None, caption: LocalizedText::default() })
            .unwrap();
        assert!(matches!(doc.validate(), Err(ContentError::InvalidUrl(_))));
    }

    #[test]
    fn json_shape() {
        let json = serde_json::json!({
            "rows": [{
                "id": Uuid::nil(),
                "columns": [{
                    "id": Uuid::nil(),
                    "width": 12,
                    "blocks": [{ "id": Uuid::nil(), "type": "text", "body": { "en": "Shabbat shalom" } }]
                }]
            }]
        });
        let doc: PageDocument = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), json);
    }
}
