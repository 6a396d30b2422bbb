//! Recipe CSV parsing.
//!
//! Expected headers: `recipe_video_id`, `video_title`, `category_name`, `item_name`,
//! and optionally `video_url` and `steps_json`. Header names are trimmed; extra
//! columns are ignored.

use crate::error::Result;
use crate::recommend::parse_ingredient_list;
use crate::vector_store::RecipeDocument;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

/// One cooking step from the `steps_json` column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeStep {
    #[serde(default)]
    pub step: u32,
    #[serde(default)]
    pub step_title: Option<String>,
    #[serde(default, alias = "description")]
    pub step_detail: Option<String>,
}

/// A validated recipe row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRow {
    pub recipe_id: i64,
    pub title: String,
    pub category: String,
    pub video_url: Option<String>,
    /// Parsed ingredient list; `None` when the row had no `item_name`.
    pub ingredients: Option<Vec<String>>,
    pub steps: Vec<RecipeStep>,
}

impl RecipeRow {
    /// Text embedded for this recipe.
    pub fn document_text(&self, include_steps: bool) -> String {
        let items = self.ingredients.as_ref().map(|i| i.join(", ")).unwrap_or_default();
        let mut text = format!("분류: {} / 요리명: {} / 재료: {}", self.category, self.title, items);

        if include_steps {
            let details: Vec<&str> = self
                .steps
                .iter()
                .filter_map(|s| s.step_detail.as_deref())
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .collect();
            if !details.is_empty() {
                text.push_str(" / 조리순서: ");
                text.push_str(&details.join(" "));
            }
        }

        text
    }

    /// Build the stored document for this row.
    pub fn to_document(&self, content: String, embedding: Vec<f32>) -> RecipeDocument {
        RecipeDocument::new(
            self.recipe_id,
            self.title.clone(),
            Some(self.category.clone()),
            self.video_url.clone(),
            self.ingredients.as_ref().map(|i| i.join(", ")),
            content,
            embedding,
        )
    }
}

/// A row that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based line number in the file.
    pub line: u64,
    pub reason: String,
}

/// Result of reading a recipe CSV.
#[derive(Debug, Default)]
pub struct ParsedRecipes {
    pub rows: Vec<RecipeRow>,
    pub rows_read: usize,
    pub rejected: Vec<RowRejection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    recipe_video_id: Option<String>,
    video_title: Option<String>,
    category_name: Option<String>,
    item_name: Option<String>,
    video_url: Option<String>,
    steps_json: Option<String>,
}

/// Parse the `steps_json` column. Malformed input is an error; nothing is patched up.
pub fn parse_steps(raw: &str) -> serde_json::Result<Vec<RecipeStep>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

/// Read and validate recipe rows.
///
/// Rows with a missing, non-numeric or non-positive id are rejected, as are rows
/// that are not valid UTF-8 or whose `steps_json` does not parse. For duplicate ids
/// the first row wins. Only header and I/O errors fail the whole read.
pub fn read_recipes<R: Read>(reader: R, default_category: &str) -> Result<ParsedRecipes> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut parsed = ParsedRecipes::default();
    let mut seen = HashSet::new();

    for record in csv_reader.records() {
        parsed.rows_read += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                parsed.rejected.push(RowRejection {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw: RawRow = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                parsed.rejected.push(RowRejection {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match validate(raw, default_category) {
            Ok(row) => {
                if seen.insert(row.recipe_id) {
                    parsed.rows.push(row);
                } else {
                    parsed.rejected.push(RowRejection {
                        line,
                        reason: format!("duplicate recipe_video_id {}", row.recipe_id),
                    });
                }
            }
            Err(reason) => parsed.rejected.push(RowRejection { line, reason }),
        }
    }

    Ok(parsed)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate(raw: RawRow, default_category: &str) -> std::result::Result<RecipeRow, String> {
    let id_text = non_empty(raw.recipe_video_id).ok_or("missing recipe_video_id")?;
    let recipe_id =
        parse_id(&id_text).ok_or_else(|| format!("invalid recipe_video_id '{}'", id_text))?;

    let steps = match non_empty(raw.steps_json) {
        Some(json) => parse_steps(&json).map_err(|e| format!("malformed steps_json: {}", e))?,
        None => Vec::new(),
    };

    Ok(RecipeRow {
        recipe_id,
        title: non_empty(raw.video_title).unwrap_or_default(),
        category: non_empty(raw.category_name).unwrap_or_else(|| default_category.to_string()),
        video_url: non_empty(raw.video_url),
        ingredients: non_empty(raw.item_name).map(|items| parse_ingredient_list(&items)),
        steps,
    })
}

/// Accept positive integer ids, plus the `<digits>.0` form spreadsheet exports produce.
/// Exponents and other float syntax are rejected rather than rounded.
fn parse_id(text: &str) -> Option<i64> {
    let digits = match text.split_once('.') {
        Some((whole, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => whole,
        Some(_) => return None,
        None => text,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_and_defaults() {
        let csv = " recipe_video_id , video_title,category_name,item_name\n7,두부조림,,\" 두부 , 간장,\"\n";
        let parsed = read_recipes(csv.as_bytes(), "기타").unwrap();

        assert_eq!(parsed.rows_read, 1);
        let row = &parsed.rows[0];
        assert_eq!(row.recipe_id, 7);
        assert_eq!(row.category, "기타");
        assert_eq!(row.ingredients, Some(vec!["두부".to_string(), "간장".to_string()]));
        assert!(row.video_url.is_none());
    }

    #[test]
    fn test_rejects_bad_ids_and_duplicates() {
        let csv = "recipe_video_id,video_title,item_name\n\
                   1,a,김치\n\
                   ,b,김치\n\
                   -4,c,김치\n\
                   1,d,두부\n\
                   2.0,e,감자\n\
                   2.5,f,감자\n";
        let parsed = read_recipes(csv.as_bytes(), "기타").unwrap();

        let ids: Vec<i64> = parsed.rows.iter().map(|r| r.recipe_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(parsed.rows[0].title, "a");
        assert_eq!(parsed.rejected.len(), 4);
        assert_eq!(parsed.rejected[0].line, 3);
        assert!(parsed.rejected[2].reason.contains("duplicate"));
    }

    #[test]
    fn test_parse_id_forms() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("42.00"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("+5"), None);
        assert_eq!(parse_id("1e19"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id("42."), None);
        assert_eq!(parse_id("99999999999999999999"), None);
    }

    #[test]
    fn test_invalid_utf8_row_is_rejected_not_fatal() {
        let mut csv = "recipe_video_id,video_title,item_name\n1,a,김치\n2,".as_bytes().to_vec();
        csv.extend_from_slice(&[0xFF, 0xFE]);
        csv.extend_from_slice(b",x\n3,c,y\n");

        let parsed = read_recipes(csv.as_slice(), "기타").unwrap();

        let ids: Vec<i64> = parsed.rows.iter().map(|r| r.recipe_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(parsed.rows_read, 3);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 3);
        assert_eq!(parsed.rows[0].ingredients, Some(vec!["김치".to_string()]));
    }

    #[test]
    fn test_missing_item_name_is_none() {
        let csv = "recipe_video_id,video_title,item_name\n3,물,\n";
        let parsed = read_recipes(csv.as_bytes(), "기타").unwrap();
        assert!(parsed.rows[0].ingredients.is_none());
        assert_eq!(parsed.rows[0].document_text(false), "분류: 기타 / 요리명: 물 / 재료: ");
    }

    #[test]
    fn test_parse_steps_strict() {
        let json = r#"[
            {"step": 1, "step_title": "손질", "step_detail": "김치를 썬다"},
            {"step": 2, "description": "끓인다"}
        ]"#;
        let steps = parse_steps(json).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_detail.as_deref(), Some("끓인다"));

        tokio_test::assert_err!(parse_steps("```json [] ```"));
        tokio_test::assert_err!(parse_steps("\"[{\"\"step\"\": 1}]\""));
        assert!(parse_steps("  ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_steps_reject_row() {
        let csv = "recipe_video_id,video_title,item_name,steps_json\n5,라면,\"라면, 물\",not json\n";
        let parsed = read_recipes(csv.as_bytes(), "기타").unwrap();
        assert!(parsed.rows.is_empty());
        assert!(parsed.rejected[0].reason.contains("steps_json"));
    }

    #[test]
    fn test_document_text_with_steps() {
        let row = RecipeRow {
            recipe_id: 1,
            title: "김치찌개".to_string(),
            category: "한식".to_string(),
            video_url: None,
            ingredients: Some(vec!["김치".to_string(), "두부".to_string()]),
            steps: vec![
                RecipeStep { step: 1, step_title: None, step_detail: Some("김치를 볶는다".to_string()) },
                RecipeStep { step: 2, step_title: None, step_detail: Some("물을 붓는다".to_string()) },
            ],
        };

        assert_eq!(row.document_text(false), "분류: 한식 / 요리명: 김치찌개 / 재료: 김치, 두부");
        assert_eq!(
            row.document_text(true),
            "분류: 한식 / 요리명: 김치찌개 / 재료: 김치, 두부 / 조리순서: 김치를 볶는다 물을 붓는다"
        );
    }
}
