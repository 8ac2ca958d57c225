use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A persisted item that is addressed by a stable string id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// `<unix-millis>-<random hex>`; sorts by creation time and never collides
/// within a process in practice.
pub fn new_id() -> String {
    let mut bytes = [0_u8; 10];
    OsRng.fill_bytes(&mut bytes);
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        hex.push_str(format!("{:02x}", b).as_str());
    }
    format!("{}-{hex}", now_millis())
}

/// UTC timestamp in the `2024-01-10T09:30:00.000Z` form.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_time_prefixed() {
        let ids: HashSet<String> = (0..500).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 500);
        let sample = new_id();
        let (millis, hex) = sample.split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(hex.len(), 20);
    }

    #[test]
    fn timestamp_is_utc_with_millis() {
        let stamp = now_timestamp();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2024-01-10T09:30:00.000Z".len());
    }
}
