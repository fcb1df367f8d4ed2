// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `dashboard` subcommand: run every catalog query and print a summary.
//!
//! Queries run strictly sequentially -- the remote session model does not
//! tolerate concurrent chats -- and individual failures never abort the run;
//! a failed query is reported as unavailable and the next one proceeds.

use fleetlens_catalog::DASHBOARD_QUERIES;
use tracing::warn;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> Result<(), fleetlens_core::FleetlensError> {
    let mut unavailable = 0usize;

    for query in DASHBOARD_QUERIES {
        match ctx.ask(query.key, Some(query.ttl), query.question, false).await {
            Ok(insight) => {
                let marker = if insight.from_cache { " (cached)" } else { "" };
                let total = insight
                    .total_rows
                    .map(|t| format!(", {t} total"))
                    .unwrap_or_default();
                println!(
                    "{:<32} {} rows{total}{marker}",
                    query.key,
                    insight.rows.len()
                );
            }
            Err(err) => {
                warn!(key = query.key, error = %err, "dashboard query failed");
                println!("{:<32} unavailable", query.key);
                unavailable += 1;
            }
        }
    }

    if unavailable > 0 {
        println!(
            "{unavailable} of {} queries unavailable",
            DASHBOARD_QUERIES.len()
        );
    }
    Ok(())
}
