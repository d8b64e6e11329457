pub mod db_utils;
pub mod email_filter;
pub mod membership_cache;
