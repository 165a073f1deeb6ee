//! Upstream timings API access.

pub mod client;

pub use client::{convert_time_string, format_date_for_api, AladhanClient, ALADHAN_BASE_URL};
