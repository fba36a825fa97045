use super::AppState;
use crate::types::ScoreEntry;

impl AppState {
    /// Record a legacy `setScore` entry.
    ///
    /// Needs contestant, task and points; anything shorter is ignored.
    pub async fn record_score(&self, args: &[String]) -> Option<ScoreEntry> {
        let [contestant, task, points, ..] = args else {
            tracing::debug!("setScore with {} argument(s), nothing recorded", args.len());
            return None;
        };

        let entry = ScoreEntry {
            contestant: contestant.clone(),
            task: task.clone(),
            points: points.clone(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };
        self.score_log.write().await.push(entry.clone());
        Some(entry)
    }

    pub async fn list_scores(&self) -> Vec<ScoreEntry> {
        self.score_log.read().await.clone()
    }

    pub async fn clear_scores(&self) {
        self.score_log.write().await.clear();
    }
}
