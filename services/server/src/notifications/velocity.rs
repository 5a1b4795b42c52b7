use async_trait::async_trait;
use rt_protocol::ContentType;
use sqlx::PgPool;

use crate::repo;

/// Hours of vote history a "current" velocity reading covers.
const VELOCITY_WINDOW_HOURS: i64 = 3;

/// A user is considered "experienced" once their relevant content-type
/// total exceeds this many items.
const EXPERIENCED_THRESHOLD: i32 = 10;

/// Abstracts velocity evaluation so a future detector (e.g. ML-based) can
/// replace the rule engine without the pipeline referencing any
/// detector-specific field.
#[async_trait]
pub trait VelocityDetector: Send + Sync {
    async fn should_notify(
        &self,
        pool: &PgPool,
        user_id: i64,
        content_type: ContentType,
        votes_per_hour: f64,
    ) -> Result<bool, sqlx::Error>;

    async fn is_exponential_growth(
        &self,
        pool: &PgPool,
        content_type: ContentType,
        content_id: i64,
        current_vph: f64,
    ) -> Result<bool, sqlx::Error>;
}

pub struct RuleBasedVelocityDetector;

#[async_trait]
impl VelocityDetector for RuleBasedVelocityDetector {
    async fn should_notify(
        &self,
        pool: &PgPool,
        user_id: i64,
        content_type: ContentType,
        votes_per_hour: f64,
    ) -> Result<bool, sqlx::Error> {
        let baseline = repo::baselines::find_by_user(pool, user_id).await?;
        let Some(baseline) = baseline else {
            // No baseline yet: treat as a brand new user.
            return Ok(votes_per_hour >= 5.0);
        };

        // The content-type-aware total/baseline pair this event concerns:
        // `UserBaseline` tracks posts and comments separately, so comment
        // engagement is judged against the comment-specific figures.
        let (total, avg) = match content_type {
            ContentType::Post => (baseline.total_posts, baseline.avg_post_votes_per_hour),
            ContentType::Comment => (baseline.total_comments, baseline.avg_comment_votes_per_hour),
        };

        if total <= EXPERIENCED_THRESHOLD {
            Ok(votes_per_hour >= 5.0)
        } else {
            Ok(votes_per_hour >= 1.5 * avg)
        }
    }

    async fn is_exponential_growth(
        &self,
        pool: &PgPool,
        content_type: ContentType,
        content_id: i64,
        current_vph: f64,
    ) -> Result<bool, sqlx::Error> {
        let previous_hour_votes = repo::vote_activity::votes_in_hour_offset(pool, content_type, content_id, 1).await?;
        Ok(current_vph >= 2.0 * previous_hour_votes as f64)
    }
}

pub async fn current_votes_per_hour(pool: &PgPool, content_type: ContentType, content_id: i64) -> Result<f64, sqlx::Error> {
    repo::vote_activity::votes_per_hour(pool, content_type, content_id, VELOCITY_WINDOW_HOURS).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_and_threshold_constants_are_stable() {
        assert_eq!(VELOCITY_WINDOW_HOURS, 3);
        assert_eq!(EXPERIENCED_THRESHOLD, 10);
    }
}
