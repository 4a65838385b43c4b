//! Tabular outputs.
//!
//! Column definitions are the nodes of the output node's nested canvas. The
//! model answers with `{ rows: [ { <key>: string } ] }`, which renders into an
//! escaped HTML table.

use serde_json::{Map, Value, json};

use crate::canvas::{Node, NodeId};
use crate::provider::ResponseSchema;
use crate::text;
use crate::{Error, Result};

/// One column of a table output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Field name in the response rows.
    pub key: String,
    /// Header text.
    pub title: String,
    /// What the column holds; passed to the model.
    pub description: String,
}

impl TableColumn {
    /// Derives a column from a definition node.
    ///
    /// Returns `None` when the title yields an empty key.
    pub fn from_node(node: &Node) -> Option<Self> {
        let title = node.title().trim();
        let key = text::column_key(title);
        if key.is_empty() {
            return None;
        }

        Some(Self {
            key,
            title: title.to_owned(),
            description: text::strip_tags(node.content()).trim().to_owned(),
        })
    }
}

/// Derives the columns of a table from its definition nodes.
///
/// Definitions whose key repeats an earlier one are ignored.
pub fn columns(definitions: &[Node]) -> Vec<TableColumn> {
    let mut columns: Vec<TableColumn> = Vec::new();
    for column in definitions.iter().filter_map(TableColumn::from_node) {
        if !columns.iter().any(|c| c.key == column.key) {
            columns.push(column);
        }
    }
    columns
}

/// Builds the row schema for a set of columns.
pub(super) fn row_schema(columns: &[TableColumn]) -> ResponseSchema {
    let properties: Map<String, Value> = columns
        .iter()
        .map(|c| {
            let mut property = json!({ "type": "string" });
            if !c.description.is_empty() {
                property["description"] = Value::String(c.description.clone());
            }
            (c.key.clone(), property)
        })
        .collect();
    let required: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();

    ResponseSchema::new(
        "table",
        json!({
            "type": "object",
            "properties": {
                "rows": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                        "additionalProperties": false,
                    },
                },
            },
            "required": ["rows"],
            "additionalProperties": false,
        }),
    )
}

/// Extracts the cell values of every row, in column order.
///
/// Missing and null cells read as empty; numbers and booleans are rendered as
/// text. Any other shape rejects the whole response.
pub(super) fn parse_rows(
    output_id: &NodeId,
    columns: &[TableColumn],
    response: &Value,
) -> Result<Vec<Vec<String>>> {
    let rows = response
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::malformed(output_id, "expected a `rows` array"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row
                .as_object()
                .ok_or_else(|| Error::malformed(output_id, format!("row {i} is not an object")))?;

            columns
                .iter()
                .map(|c| match row.get(&c.key) {
                    None | Some(Value::Null) => Ok(String::new()),
                    Some(Value::String(s)) => Ok(s.clone()),
                    Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
                    Some(_) => Err(Error::malformed(
                        output_id,
                        format!("cell `{}` of row {i} is not text", c.key),
                    )),
                })
                .collect()
        })
        .collect()
}

/// Renders rows as an HTML table with escaped headers and cells.
pub(super) fn render_html(columns: &[TableColumn], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in columns {
        html.push_str("<th>");
        html.push_str(&text::sanitize_html_text(&column.title));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&text::sanitize_html_text(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}
