use moka::future::Cache;
use once_cell::sync::OnceCell;
use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 300;

/// (team_id, user_id) => membership is active
static MEMBERSHIP_CACHE: OnceCell<Cache<(u64, u64), bool>> = OnceCell::new();

fn build(ttl_secs: u64) -> Cache<(u64, u64), bool> {
    Cache::builder()
        .max_capacity(100_000) // tune based on memory
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

fn cache() -> &'static Cache<(u64, u64), bool> {
    MEMBERSHIP_CACHE.get_or_init(|| build(DEFAULT_TTL_SECS))
}

/// Sets the TTL; only the first call before any lookup has an effect
pub fn configure(ttl_secs: u64) -> bool {
    MEMBERSHIP_CACHE.set(build(ttl_secs)).is_ok()
}

pub async fn get(team_id: u64, user_id: u64) -> Option<bool> {
    cache().get(&(team_id, user_id)).await
}

pub async fn remember(team_id: u64, user_id: u64, active: bool) {
    cache().insert((team_id, user_id), active).await;
}

/// Drop a cached answer after the membership row changed
pub async fn forget(team_id: u64, user_id: u64) {
    cache().invalidate(&(team_id, user_id)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn remembers_and_forgets_memberships() {
        assert_eq!(get(901, 1).await, None);

        remember(901, 1, true).await;
        remember(901, 2, false).await;
        assert_eq!(get(901, 1).await, Some(true));
        assert_eq!(get(901, 2).await, Some(false));

        forget(901, 1).await;
        assert_eq!(get(901, 1).await, None);
    }
}
