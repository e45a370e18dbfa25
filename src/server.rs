use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::dashboard::{render_for_user, DashboardOptions};
use crate::page::CHART_ERROR_MESSAGE;

/// The dashboard route has no user parameter.
pub const DASHBOARD_USER_ID: i64 = 1;

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    options: Arc<DashboardOptions>,
}

impl AppState {
    pub fn new(db_path: PathBuf, options: DashboardOptions) -> Self {
        Self {
            db_path: Arc::new(db_path),
            options: Arc::new(options),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/plot", get(plot_page))
        .with_state(state)
}

async fn plot_page(State(state): State<AppState>) -> Html<String> {
    let result = tokio::task::spawn_blocking(move || {
        render_for_user(&state.db_path, DASHBOARD_USER_ID, &state.options).into_html()
    })
    .await;

    match result {
        Ok(html) => Html(html),
        Err(e) => {
            log::warn!("Dashboard render task failed: {e}");
            Html(CHART_ERROR_MESSAGE.to_string())
        }
    }
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}/plot", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewMood;
    use crate::db::Database;
    use crate::page::NO_DATA_MESSAGE;
    use crate::table::test_rows::ts;

    #[tokio::test]
    async fn test_plot_page_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Database::open(&path).unwrap();

        let state = AppState::new(path, DashboardOptions::default());
        let Html(body) = plot_page(State(state)).await;
        assert_eq!(body, NO_DATA_MESSAGE);
    }

    #[tokio::test]
    async fn test_plot_page_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().join("nope.db"), DashboardOptions::default());
        let Html(body) = plot_page(State(state)).await;
        assert_eq!(body, NO_DATA_MESSAGE);
    }

    #[tokio::test]
    async fn test_plot_page_renders_for_user_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moods.db");
        let db = Database::open(&path).unwrap();
        for (user_id, day) in [(1, 2), (2, 3)] {
            db.insert_mood(&NewMood {
                user_id,
                mood_score: 6.0,
                arousal_score: 3.0,
                recorded_at: ts(day, 10),
            })
            .unwrap();
        }
        drop(db);

        let state = AppState::new(path, DashboardOptions::default());
        let Html(body) = plot_page(State(state)).await;
        assert!(body.contains("<h1>Mood Analysis</h1>"));
        assert_eq!(body.matches("<img ").count(), 4);
    }
}
