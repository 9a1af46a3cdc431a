//! Auxiliary feeds shown next to a disaster: image verification, official
//! bulletins and a simulated social media feed.
//!
//! None of these touch the audit trail or publish events.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{rejection::JsonRejection, Extension, Json, Path};
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use relief_records::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::service::ServiceError;

/// Request body for `POST /verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub reason: String,
}

/// Handler for `POST /verify`.
///
/// A URL passes when it contains "ok" or "safe", ignoring case.
pub async fn verify_image_handler(
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(body) = payload?;
    let url = body
        .image_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("image_url required".to_string()))?;

    let lowered = url.to_lowercase();
    let verified = lowered.contains("ok") || lowered.contains("safe");
    let reason = if verified {
        "Image is safe"
    } else {
        "Image failed verification"
    };

    tracing::debug!(verified, "image verification");
    Ok(Json(VerifyResponse {
        verified,
        reason: reason.to_string(),
    }))
}

/// One official bulletin.
#[derive(Debug, Serialize, Deserialize)]
pub struct OfficialUpdate {
    pub id: u32,
    pub title: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "disasterId")]
    pub disaster_id: u32,
    pub location_name: String,
}

/// (title, content, location, minutes ago), oldest first.
const BULLETINS: [(&str, &str, &str, i64); 5] = [
    (
        "Evacuation Order",
        "Mandatory evacuation for Zone A due to rising floodwaters.",
        "Zone A",
        60,
    ),
    (
        "Shelter Opened",
        "Temporary shelter now open at City High School gym.",
        "City High School",
        30,
    ),
    (
        "Power Outage",
        "Widespread power outage reported in the downtown area.",
        "Downtown",
        20,
    ),
    (
        "Weather Update",
        "Heavy rainfall expected to continue for the next 3 hours.",
        "Citywide",
        10,
    ),
    (
        "All Clear",
        "Floodwaters receding. It is now safe to return to Zone B.",
        "Zone B",
        2,
    ),
];

/// Handler for `GET /official`. The five most recent bulletins, newest first.
pub async fn official_updates_handler() -> Json<Vec<OfficialUpdate>> {
    let now = Utc::now();
    let updates = BULLETINS
        .iter()
        .enumerate()
        .rev()
        .take(5)
        .map(|(i, (title, content, location, minutes_ago))| OfficialUpdate {
            id: i as u32 + 1,
            title: title.to_string(),
            content: content.to_string(),
            timestamp: (now - Duration::minutes(*minutes_ago)).timestamp_millis(),
            disaster_id: 1,
            location_name: location.to_string(),
        })
        .collect();
    Json(updates)
}

const POST_TEMPLATES: [&str; 10] = [
    "SOS! Major {tag} in {location}! We need immediate assistance!",
    "My building in {location} is surrounded by water. Has anyone heard from emergency services? #{tag}",
    "ReliefOrg is setting up a temporary shelter for those affected by the {location} {tag}. Location to follow.",
    "Reports of heavy damage in {location}. Roads are blocked. #disaster #{tag}",
    "Power is out in most of {location}. Please conserve your phone battery.",
    "Urgent need for clean drinking water and food in {location}. Can anyone help? #{tag} #help",
    "Seeing a lot of smoke near downtown {location}. Is there an official update on the {tag}?",
    "All major highways leading out of {location} are closed. Do not attempt to travel. #{tag}",
    "If you are in {location} and need rescue, please put a white cloth on your door.",
    "City Hall in {location} is now operating as an emergency command center for the {tag}.",
];

const POSTERS: [&str; 8] = [
    "RescueOrg",
    "JaneDoe",
    "CityNews",
    "AidWorker",
    "WeatherAlert",
    "CitizenX",
    "LocalGov",
    "ReporterJim",
];

/// One simulated social media post.
#[derive(Debug, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: u32,
    pub user: String,
    pub avatar: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub location: String,
}

/// Builds 5 to 9 posts about `location`, each tagged with one of `tags`
/// (or "disaster" when there are none), a few minutes apart.
pub fn generate_social_feed(
    rng: &mut impl Rng,
    location: &str,
    tags: &BTreeSet<String>,
    now_ms: i64,
) -> Vec<SocialPost> {
    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
    let count = rng.gen_range(5..=9);

    (0..count)
        .map(|i| {
            let template = POST_TEMPLATES.choose(rng).copied().unwrap_or(POST_TEMPLATES[0]);
            let tag = tags.choose(rng).copied().unwrap_or("disaster");
            let user = POSTERS.choose(rng).copied().unwrap_or(POSTERS[0]);
            let gender = if rng.gen_bool(0.5) { "men" } else { "women" };
            let spacing_ms = 60_000.0 * rng.gen_range(1.0..11.0);

            SocialPost {
                id: i + 1,
                user: user.to_string(),
                avatar: format!("https://randomuser.me/api/portraits/thumb/{gender}/{i}.jpg"),
                content: template.replace("{location}", location).replace("{tag}", tag),
                timestamp: now_ms - (f64::from(i) * spacing_ms) as i64,
                location: location.to_string(),
            }
        })
        .collect()
}

/// Handler for `GET /social/{disaster_id}`.
pub async fn social_feed_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(disaster_id): Path<String>,
) -> Result<Json<Vec<SocialPost>>, ApiError> {
    let disaster = match state.records.get_disaster(disaster_id).await {
        Ok(d) => d,
        Err(ServiceError::Record(RecordError::NotFound { .. })) => {
            return Err(ApiError::NotFound("Disaster not found.".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let feed = generate_social_feed(
        &mut rand::thread_rng(),
        &disaster.location_name,
        &disaster.tags,
        Utc::now().timestamp_millis(),
    );
    Ok(Json(feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn social_feed_uses_location_and_tags() {
        let tags = BTreeSet::from(["flood".to_string()]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let feed = generate_social_feed(&mut rng, "Riverdale", &tags, 1_000_000_000);

            assert!((5..=9).contains(&feed.len()));
            for (i, post) in feed.iter().enumerate() {
                assert_eq!(post.id as usize, i + 1);
                assert_eq!(post.location, "Riverdale");
                assert!(post.content.contains("Riverdale"));
                assert!(!post.content.contains('{'));
                assert!(POSTERS.contains(&post.user.as_str()));
                assert!(post.avatar.ends_with(&format!("/{i}.jpg")));
                assert!(post.timestamp <= 1_000_000_000);
            }
            assert_eq!(feed[0].timestamp, 1_000_000_000);
        }
    }

    #[test]
    fn social_feed_falls_back_to_generic_tag() {
        let mut rng = StdRng::seed_from_u64(7);
        let feed = generate_social_feed(&mut rng, "Springfield", &BTreeSet::new(), 0);
        for post in &feed {
            assert!(!post.content.contains("{tag}"));
            if post.content.contains('#') {
                assert!(post.content.contains("#disaster"));
            }
        }
    }

    #[tokio::test]
    async fn official_updates_are_newest_first() {
        let Json(updates) = official_updates_handler().await;
        assert_eq!(updates.len(), 5);
        assert_eq!(updates[0].title, "All Clear");
        assert_eq!(updates[4].title, "Evacuation Order");
        assert!(updates.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[tokio::test]
    async fn verify_checks_url_markers() {
        let verdict = |url: &str| {
            let body = VerifyRequest {
                image_url: Some(url.to_string()),
            };
            async move { verify_image_handler(Ok(Json(body))).await }
        };

        let Json(ok) = verdict("https://img.example/SAFE-photo.jpg").await.unwrap();
        assert!(ok.verified);
        assert_eq!(ok.reason, "Image is safe");

        let Json(bad) = verdict("https://img.example/photo.jpg").await.unwrap();
        assert!(!bad.verified);
        assert_eq!(bad.reason, "Image failed verification");

        let missing = verify_image_handler(Ok(Json(VerifyRequest { image_url: None }))).await;
        assert!(matches!(missing, Err(ApiError::BadRequest(_))));
    }
}
