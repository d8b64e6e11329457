use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use tracing::{info, warn};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMAIL_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check if an email might be registered (false positives possible).
/// A poisoned filter answers "maybe" so callers fall through to the database.
pub fn might_exist(email: &str) -> bool {
    let email = normalize(email);
    match EMAIL_FILTER.read() {
        Ok(filter) => filter.contains(&email),
        Err(_) => {
            warn!("Email filter lock poisoned");
            true
        }
    }
}

/// Insert a single email into the filter
pub fn insert(email: &str) {
    insert_batch(&[normalize(email)]);
}

/// Warm up the email filter using streaming + batching
pub async fn warmup_email_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&email));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    info!(total, "Email filter warmup complete");
    Ok(())
}

/// Insert a batch of normalized emails
fn insert_batch(emails: &[String]) {
    match EMAIL_FILTER.write() {
        Ok(mut filter) => {
            for email in emails {
                filter.add(email);
            }
        }
        Err(_) => warn!(count = emails.len(), "Email filter lock poisoned, skipping insert"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_emails_are_found_case_insensitively() {
        insert("Filter.Test@Attendance.com");
        assert!(might_exist("filter.test@attendance.com"));
        assert!(might_exist("  FILTER.TEST@attendance.com "));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Jane@Example.COM "), "jane@example.com");
    }
}
