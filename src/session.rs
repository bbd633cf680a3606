//! In-memory session and analytics bookkeeping.
//!
//! Conversation history is capped per session and the recent-query buffer is
//! a bounded ring, so memory cannot grow without bound under sustained
//! traffic. A simple collaborator: the retrieval core never depends on it.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::models::ChatMessage;

/// Messages kept per session (oldest dropped first).
const MAX_HISTORY: usize = 20;
/// Recent queries kept for analytics.
const MAX_RECENT: usize = 100;
/// Topics reported by the analytics endpoint.
const TOP_TOPICS: usize = 20;
/// Recent queries reported by the analytics endpoint.
const REPORTED_RECENT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RecentQuery {
    pub question: String,
    pub timestamp: DateTime<Utc>,
    pub response_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub total_queries: u64,
    pub active_sessions: usize,
    pub avg_response_time: f64,
    pub popular_topics: Vec<TopicCount>,
    pub recent_queries: Vec<RecentQuery>,
    pub total_documents: usize,
}

#[derive(Default)]
struct AnalyticsState {
    query_count: u64,
    total_response_secs: f64,
    recent: VecDeque<RecentQuery>,
    topics: HashMap<String, u64>,
}

/// Concurrency-safe store for conversation sessions and query analytics.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
    analytics: RwLock<AnalyticsState>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session and return its opaque id.
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .insert(session_id.clone(), Vec::new());
        session_id
    }

    /// Conversation history for a session; empty for unknown ids.
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a message, keeping only the most recent `MAX_HISTORY` entries.
    pub fn add_message(&self, session_id: &str, role: &str, content: &str) {
        let mut sessions = self.sessions.write();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        });
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }
    }

    /// Record a completed query for analytics.
    pub fn track_query(&self, question: &str, elapsed: Duration) {
        let mut analytics = self.analytics.write();
        analytics.query_count += 1;
        analytics.total_response_secs += elapsed.as_secs_f64();

        analytics.recent.push_back(RecentQuery {
            question: question.to_string(),
            timestamp: Utc::now(),
            response_secs: elapsed.as_secs_f64(),
        });
        if analytics.recent.len() > MAX_RECENT {
            analytics.recent.pop_front();
        }

        // Crude topic extraction: meaningful alphabetic words only.
        for word in question.to_lowercase().split_whitespace() {
            if word.len() > 3 && word.chars().all(|c| c.is_alphabetic()) {
                *analytics.topics.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn analytics(&self, total_documents: usize) -> AnalyticsReport {
        let analytics = self.analytics.read();

        let avg = if analytics.query_count == 0 {
            0.0
        } else {
            analytics.total_response_secs / analytics.query_count as f64
        };

        let mut topics: Vec<TopicCount> = analytics
            .topics
            .iter()
            .map(|(topic, &count)| TopicCount {
                topic: topic.clone(),
                count,
            })
            .collect();
        topics.sort_by(|a, b| b.count.cmp(&a.count).then(a.topic.cmp(&b.topic)));
        topics.truncate(TOP_TOPICS);

        let recent: Vec<RecentQuery> = analytics
            .recent
            .iter()
            .rev()
            .take(REPORTED_RECENT)
            .rev()
            .cloned()
            .collect();

        AnalyticsReport {
            total_queries: analytics.query_count,
            active_sessions: self.sessions.read().len(),
            avg_response_time: (avg * 1000.0).round() / 1000.0,
            popular_topics: topics,
            recent_queries: recent,
            total_documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_capped_at_max() {
        let manager = SessionManager::new();
        let id = manager.create_session();
        for i in 0..30 {
            manager.add_message(&id, "user", &format!("message {i}"));
        }
        let history = manager.history(&id);
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].content, "message 10");
        assert_eq!(history.last().unwrap().content, "message 29");
    }

    #[test]
    fn test_unknown_session_has_empty_history() {
        let manager = SessionManager::new();
        assert!(manager.history("nope").is_empty());
    }

    #[test]
    fn test_recent_queries_bounded() {
        let manager = SessionManager::new();
        for i in 0..150 {
            manager.track_query(&format!("query {i}"), Duration::from_millis(10));
        }
        let report = manager.analytics(0);
        assert_eq!(report.total_queries, 150);
        assert_eq!(report.recent_queries.len(), REPORTED_RECENT);
        // Oldest entries were evicted; newest survive.
        assert_eq!(report.recent_queries.last().unwrap().question, "query 149");
    }

    #[test]
    fn test_avg_response_time() {
        let manager = SessionManager::new();
        manager.track_query("one", Duration::from_millis(100));
        manager.track_query("two", Duration::from_millis(300));
        let report = manager.analytics(0);
        assert!((report.avg_response_time - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_topic_extraction_skips_short_and_numeric() {
        let manager = SessionManager::new();
        manager.track_query("configure FortiGate vpn r740", Duration::from_millis(1));
        let report = manager.analytics(0);
        let topics: Vec<&str> = report
            .popular_topics
            .iter()
            .map(|t| t.topic.as_str())
            .collect();
        assert!(topics.contains(&"configure"));
        assert!(topics.contains(&"fortigate"));
        // "vpn" too short, "r740" not alphabetic
        assert!(!topics.contains(&"vpn"));
        assert!(!topics.contains(&"r740"));
    }
}
