use std::borrow::Cow;

/// UTF-8 byte-order mark prepended to every exported document
pub const BOM: char = '\u{feff}';

/// Format a value as a single spreadsheet-safe CSV cell.
///
/// Values containing a comma, a double quote or a line break are wrapped in
/// double quotes with embedded quotes doubled. Anything else is returned as is.
pub fn format_cell(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Join cells into one comma-separated record
pub fn join_record<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| format_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Newline-join lines and prefix the BOM
pub fn to_document<S: AsRef<str>>(lines: &[S]) -> String {
    let mut doc = String::new();
    doc.push(BOM);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            doc.push('\n');
        }
        doc.push_str(line.as_ref());
    }
    doc
}
