use crate::error::FeedError;
use crate::export::ExportDocument;
use crate::format;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::HashMap;
use uuid::Uuid;

/// Columns never offered as prompt attributes
const NON_ATTRIBUTE_KEYS: [&str; 6] = [
    "id",
    "unpaid_clicks",
    "item_group_id",
    "additional_image_link",
    "image_link",
    "link",
];

/// Normalize a feed header into a lookup key.
///
/// Lower-cases, strips parentheses and collapses each whitespace run into `_`,
/// so "Sale Price (GBP)" becomes "sale_price_gbp".
pub fn normalize_header(header: &str) -> String {
    let mut key = String::with_capacity(header.len());
    let mut in_space = false;
    for c in header.to_lowercase().chars() {
        if c == '(' || c == ')' {
            continue;
        }
        if c.is_whitespace() {
            if !in_space {
                key.push('_');
            }
            in_space = true;
        } else {
            key.push(c);
            in_space = false;
        }
    }
    key
}

/// Turn an attribute key back into a display name, "sale_price" -> "Sale Price"
pub fn display_name(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A feed column: the header as uploaded and its normalized key
#[derive(Debug, Clone, PartialEq)]
pub struct FeedColumn {
    pub header: String,
    pub key: String,
}

/// One product row; values are aligned with the feed's columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub id: Uuid,
    values: Vec<String>,
}

/// A parsed tab-separated product feed
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    columns: Vec<FeedColumn>,
    /// normalized key -> column position; a repeated key points at its last column
    key_index: HashMap<String, usize>,
    rows: Vec<FeedRow>,
}

impl Feed {
    /// Parse TSV content.
    ///
    /// The first non-blank line is the header. Lines that are blank after
    /// trimming are skipped, and rows whose cells are all empty are dropped.
    pub fn parse(content: &str) -> Result<Feed, FeedError> {
        let content = content.strip_prefix(format::BOM).unwrap_or(content);
        let mut lines = content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty());

        let header_line = lines.next().ok_or(FeedError::Empty)?;
        let columns: Vec<FeedColumn> = header_line
            .split('\t')
            .map(|h| {
                let header = h.trim().to_string();
                let key = normalize_header(&header);
                FeedColumn { header, key }
            })
            .collect();

        let key_index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();

        let mut rows = Vec::new();
        let mut dropped = 0;
        for line in lines {
            let mut cells = line.split('\t');
            let values: Vec<String> = columns
                .iter()
                .map(|_| cells.next().unwrap_or("").to_string())
                .collect();

            if values.iter().all(|v| v.is_empty()) {
                dropped += 1;
                continue;
            }
            rows.push(FeedRow {
                id: Uuid::new_v4(),
                values,
            });
        }

        info!("Parsed feed with {} columns and {} products", columns.len(), rows.len());
        if dropped > 0 {
            debug!("Dropped {} empty rows", dropped);
        }

        Ok(Feed {
            columns,
            key_index,
            rows,
        })
    }

    pub fn columns(&self) -> &[FeedColumn] {
        &self.columns
    }

    /// The headers as uploaded, in order
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.key_index.contains_key(key)
    }

    pub fn row(&self, id: Uuid) -> Option<&FeedRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Value of `key` in `row`; None when the feed has no such column
    pub fn value<'a>(&self, row: &'a FeedRow, key: &str) -> Option<&'a str> {
        self.key_index
            .get(key)
            .and_then(|&i| row.values.get(i))
            .map(String::as_str)
    }

    pub fn get(&self, id: Uuid, key: &str) -> Option<&str> {
        self.row(id).and_then(|row| self.value(row, key))
    }

    /// Overwrite one cell
    pub fn set(&mut self, id: Uuid, key: &str, value: &str) -> Result<(), FeedError> {
        let index = *self
            .key_index
            .get(key)
            .ok_or_else(|| FeedError::UnknownColumn(key.to_string()))?;
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| FeedError::UnknownRow(id.to_string()))?;
        row.values[index] = value.to_string();
        Ok(())
    }

    /// Normalized keys that can be offered as prompt attributes
    pub fn selectable_attributes(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.key.as_str())
            .filter(|k| !NON_ATTRIBUTE_KEYS.contains(k))
            .collect()
    }

    /// Serialize back to TSV with the original headers and column order.
    ///
    /// Each header emits the value for its normalized key, so a repeated key
    /// writes its last column under every header that shares it. Tabs and
    /// newlines inside a value are flattened to a single space.
    pub fn serialize(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers().join("\t"));
        for row in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| flatten_cell(self.value(row, &c.key).unwrap_or("")))
                .collect();
            lines.push(cells.join("\t"));
        }
        lines.join("\n")
    }

    /// Serialized feed with the BOM prefix
    pub fn to_document(&self) -> String {
        let mut doc = String::new();
        doc.push(format::BOM);
        doc.push_str(&self.serialize());
        doc
    }

    pub fn export_document(&self, date: NaiveDate) -> ExportDocument {
        ExportDocument {
            filename: export_filename(date),
            contents: self.to_document(),
        }
    }
}

fn flatten_cell(value: &str) -> String {
    value.replace(['\t', '\n'], " ")
}

/// Filename for a feed export made on `date`
pub fn export_filename(date: NaiveDate) -> String {
    format!("optimised_feed_{}.tsv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header("Sale Price (GBP)"), "sale_price_gbp");
        assert_eq!(normalize_header("Feed  label"), "feed_label");
        assert_eq!(normalize_header("( x)"), "_x");
        assert_eq!(normalize_header("title"), "title");
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("custom_label_0"), "Custom Label 0");
        assert_eq!(display_name("brand"), "Brand");
    }

    #[test]
    fn repeated_key_resolves_to_last_column() {
        let feed = Feed::parse("Title\ttitle\tprice\nA\tB\t1\n").unwrap();
        let row = &feed.rows()[0];
        assert_eq!(feed.value(row, "title"), Some("B"));
        assert_eq!(feed.serialize(), "Title\ttitle\tprice\nB\tB\t1");
    }

    #[test]
    fn drops_blank_rows() {
        let feed = Feed::parse("title\tprice\nShoe\t10\n\t\t\n  \t  \n").unwrap();
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(Feed::parse("").unwrap_err(), FeedError::Empty);
        assert_eq!(Feed::parse("\n  \n\t\n").unwrap_err(), FeedError::Empty);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_cut() {
        let feed = Feed::parse("title\tprice\tbrand\nShoe\nHat\t5\tAcme\textra").unwrap();
        let rows = feed.rows();
        assert_eq!(feed.value(&rows[0], "price"), Some(""));
        assert_eq!(feed.value(&rows[1], "brand"), Some("Acme"));
        assert_eq!(feed.serialize(), "title\tprice\tbrand\nShoe\t\t\nHat\t5\tAcme");
    }

    #[test]
    fn set_flattens_on_export() {
        let mut feed = Feed::parse("Title\tDescription (long)\nShoe\tplain").unwrap();
        let id = feed.rows()[0].id;
        feed.set(id, "description_long", "line one\nline\ttwo").unwrap();
        assert_eq!(feed.get(id, "description_long"), Some("line one\nline\ttwo"));
        assert_eq!(
            feed.serialize(),
            "Title\tDescription (long)\nShoe\tline one line two"
        );
        assert_eq!(feed.set(id, "colour", "red"), Err(FeedError::UnknownColumn("colour".to_string())));
    }

    #[test]
    fn bom_and_crlf_are_tolerated() {
        let feed = Feed::parse("\u{feff}title\tprice\r\nShoe\t10\r\n").unwrap();
        assert_eq!(feed.headers(), vec!["title", "price"]);
        assert_eq!(feed.get(feed.rows()[0].id, "price"), Some("10"));
        assert!(feed.to_document().starts_with('\u{feff}'));
    }

    #[test]
    fn selectable_attributes_skip_links_and_ids() {
        let feed = Feed::parse("id\ttitle\tlink\tImage Link\tbrand\nA1\tShoe\thttp://x\thttp://y\tAcme").unwrap();
        assert_eq!(feed.selectable_attributes(), vec!["title", "brand"]);
    }

    #[test]
    fn feed_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(export_filename(date), "optimised_feed_2025-01-31.tsv");
    }
}
