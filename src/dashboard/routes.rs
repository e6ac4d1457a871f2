//! Dashboard API route handlers.
//!
//! JSON endpoints plus a plain-text board. State is shared via
//! `Arc<DashboardState>` and replaced wholesale after each cycle.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::render::{render_text, BoardRow};
use crate::engine::report::CycleReport;
use crate::engine::supervisor::SourceStatus;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub board: RwLock<Vec<BoardRow>>,
    pub sources: RwLock<Vec<SourceStatus>>,
    pub last_report: RwLock<Option<CycleReport>>,
}

impl DashboardState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            board: RwLock::new(Vec::new()),
            sources: RwLock::new(Vec::new()),
            last_report: RwLock::new(None),
        }
    }

    /// Publish one cycle's output.
    pub async fn update(&self, rows: Vec<BoardRow>, sources: Vec<SourceStatus>, report: CycleReport) {
        *self.board.write().await = rows;
        *self.sources.write().await = sources;
        *self.last_report.write().await = Some(report);
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub uptime_secs: i64,
    pub cycle_count: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub entries: usize,
    pub opportunities: usize,
    pub sources: Vec<SourceStatus>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = state.last_report.read().await;
    let sources = state.sources.read().await;

    Json(StatusResponse {
        name: state.name.clone(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        cycle_count: report.as_ref().map_or(0, |r| r.cycle_number),
        last_cycle_at: report.as_ref().map(|r| r.timestamp),
        entries: report.as_ref().map_or(0, |r| r.entries()),
        opportunities: report.as_ref().map_or(0, |r| r.opportunities),
        sources: sources.clone(),
    })
}

/// GET /api/board
pub async fn get_board(State(state): State<AppState>) -> Json<Vec<BoardRow>> {
    let board = state.board.read().await;
    Json(board.clone())
}

/// GET /
pub async fn get_board_text(State(state): State<AppState>) -> String {
    let board = state.board.read().await;
    render_text(&board)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconciler::{Board, SourceRecords};
    use std::collections::BTreeMap;

    fn empty_report(cycle: u64) -> CycleReport {
        CycleReport::summarize(cycle, &SourceRecords::new(), &Board::default(), &BTreeMap::new())
    }

    #[tokio::test]
    async fn test_get_status_before_first_cycle() {
        let state = Arc::new(DashboardState::new("arbwatch-test"));
        let Json(resp) = get_status(State(state)).await;
        assert_eq!(resp.name, "arbwatch-test");
        assert_eq!(resp.cycle_count, 0);
        assert!(resp.last_cycle_at.is_none());
        assert!(resp.sources.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_state() {
        let state = Arc::new(DashboardState::new("arbwatch-test"));
        state.update(Vec::new(), Vec::new(), empty_report(3)).await;

        let Json(resp) = get_status(State(state.clone())).await;
        assert_eq!(resp.cycle_count, 3);
        assert!(resp.last_cycle_at.is_some());

        let Json(board) = get_board(State(state)).await;
        assert!(board.is_empty());
    }

    #[tokio::test]
    async fn test_board_text_empty() {
        let state = Arc::new(DashboardState::new("arbwatch-test"));
        let text = get_board_text(State(state)).await;
        assert!(text.contains("No live matches"));
    }

    #[test]
    fn test_status_response_serializes() {
        let resp = StatusResponse {
            name: "arbwatch".into(),
            uptime_secs: 60,
            cycle_count: 5,
            last_cycle_at: None,
            entries: 12,
            opportunities: 1,
            sources: Vec::new(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"cycle_count\":5"));
        assert!(json.contains("\"opportunities\":1"));
    }
}
