//! Feedback events and the sink they are handed to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the user did with a recommended course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Like,
    Dislike,
    Skip,
}

/// Reaction to a single recommended course, together with the state the
/// recommendation was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFeedback {
    pub user_id: String,
    pub course: String,
    pub action: FeedbackAction,
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub disliked: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<String>,
    pub strategy: String,
}

/// Free-form opinion about the service itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub user_id: String,
    /// 1 to 5 when given
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl UserFeedback {
    pub fn is_valid_rating(&self) -> bool {
        self.rating.map_or(true, |r| (1..=5).contains(&r))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackEvent {
    Recommendation(RecommendationFeedback),
    User(UserFeedback),
}

/// Event stamped with an id and receive time, as it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEnvelope {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: FeedbackEvent,
}

impl FeedbackEnvelope {
    pub fn new(event: FeedbackEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            event,
        }
    }
}

/// Destination for feedback events.
///
/// `record` must return promptly; implementations that do I/O hand the
/// event off and report failures through logging only.
pub trait FeedbackSink: Send + Sync {
    fn record(&self, event: FeedbackEvent);

    /// Block until previously recorded events are persisted
    fn flush(&self) {}
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedbackSink;

impl FeedbackSink for NullFeedbackSink {
    fn record(&self, event: FeedbackEvent) {
        tracing::trace!("Discarding feedback event {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_flat() {
        let envelope = FeedbackEnvelope::new(FeedbackEvent::Recommendation(RecommendationFeedback {
            user_id: "u1".into(),
            course: "IB111".into(),
            action: FeedbackAction::Dislike,
            liked: vec!["MB151".into()],
            disliked: vec![],
            skipped: vec![],
            strategy: "mmr".into(),
        }));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["kind"], "recommendation");
        assert_eq!(json["action"], "dislike");
        assert_eq!(json["course"], "IB111");
        assert!(json["id"].is_string());

        let back: FeedbackEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_user_feedback_rating_range() {
        let mut feedback = UserFeedback {
            user_id: "u".into(),
            rating: Some(5),
            faculty: None,
            text: String::new(),
        };
        assert!(feedback.is_valid_rating());
        feedback.rating = Some(0);
        assert!(!feedback.is_valid_rating());
        feedback.rating = Some(6);
        assert!(!feedback.is_valid_rating());
        feedback.rating = None;
        assert!(feedback.is_valid_rating());
    }

    #[test]
    fn test_rating_may_be_omitted() {
        let event: FeedbackEvent =
            serde_json::from_str(r#"{"kind":"user","user_id":"u","text":"no stars"}"#).unwrap();
        assert!(matches!(event, FeedbackEvent::User(u) if u.rating.is_none() && u.text == "no stars"));
    }

    #[test]
    fn test_null_sink_accepts_events() {
        let sink = NullFeedbackSink;
        sink.record(FeedbackEvent::User(UserFeedback {
            user_id: "u".into(),
            rating: Some(3),
            faculty: Some("FI".into()),
            text: "fine".into(),
        }));
        sink.flush();
    }
}
