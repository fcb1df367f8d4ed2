// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `ask` subcommand: one ad-hoc question, rendered as a text table.

use std::hash::{DefaultHasher, Hash, Hasher};

use fleetlens_core::{FleetlensError, Insight};
use serde_json::Value;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, question: &str, no_cache: bool) -> Result<(), FleetlensError> {
    let key = question_key(question);
    let insight = ctx.ask(&key, None, question, no_cache).await?;
    print!("{}", render(&insight));
    Ok(())
}

/// Stable cache key for an ad-hoc question, so repeating the same question
/// within the TTL serves the cached answer.
fn question_key(question: &str) -> String {
    let mut hasher = DefaultHasher::new();
    question.trim().hash(&mut hasher);
    format!("ask.{:016x}", hasher.finish())
}

/// Render an insight as an aligned text table with provenance markers.
fn render(insight: &Insight) -> String {
    let mut out = String::new();

    if insight.from_cache {
        out.push_str("(served from cache)\n");
    }
    if let Some(reasoning) = &insight.reasoning {
        out.push_str(reasoning);
        out.push('\n');
    }

    if insight.columns.is_empty() {
        out.push_str("no tabular result\n");
    } else {
        let widths: Vec<usize> = insight
            .columns
            .iter()
            .map(|col| {
                insight
                    .rows
                    .iter()
                    .map(|row| cell(row.get(col.as_str())).len())
                    .chain(std::iter::once(col.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (col, width) in insight.columns.iter().zip(widths.iter().copied()) {
            out.push_str(&format!("{col:<width$}  "));
        }
        out.push('\n');
        for row in &insight.rows {
            for (col, width) in insight.columns.iter().zip(widths.iter().copied()) {
                let value = cell(row.get(col.as_str()));
                out.push_str(&format!("{value:<width$}  "));
            }
            out.push('\n');
        }
    }

    if let Some(total) = insight.total_rows {
        out.push_str(&format!("{} of {total} rows shown\n", insight.rows.len()));
    }
    if let Some(url) = &insight.download_url {
        out.push_str(&format!("full result: {url}\n"));
    }
    out
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample_insight() -> Insight {
        Insight {
            id: "i-1".into(),
            question: "q".into(),
            columns: vec!["vehicle".into(), "km".into()],
            rows: vec![
                serde_json::from_value(json!({"vehicle": "v-100", "km": 12})).unwrap(),
                serde_json::from_value(json!({"vehicle": "v-2", "km": 3450})).unwrap(),
            ],
            reasoning: None,
            queried_at: Utc::now(),
            total_rows: Some(12),
            download_url: None,
            from_cache: true,
        }
    }

    #[test]
    fn render_aligns_columns_and_marks_cache() {
        let text = render(&sample_insight());
        assert!(text.starts_with("(served from cache)\n"));
        assert!(text.contains("vehicle"));
        assert!(text.contains("v-100"));
        assert!(text.contains("2 of 12 rows shown"));
    }

    #[test]
    fn question_key_is_stable_and_trimmed() {
        assert_eq!(question_key("how far?"), question_key("  how far?  "));
        assert_ne!(question_key("how far?"), question_key("how long?"));
        assert!(question_key("x").starts_with("ask."));
    }

    #[test]
    fn empty_result_renders_placeholder() {
        let mut insight = sample_insight();
        insight.columns.clear();
        insight.rows.clear();
        insight.from_cache = false;
        let text = render(&insight);
        assert!(text.contains("no tabular result"));
        assert!(!text.contains("served from cache"));
    }
}
