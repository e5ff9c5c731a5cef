//! `AnnounceKey` resource returned by `GET /api/generate`.
use serde::{Deserialize, Serialize};

use crate::core::auth::Key;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AnnounceKey {
    pub announce_key: Key,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AnnounceKey;
    use crate::core::auth::Key;

    #[test]
    fn it_should_serialize_the_key_as_a_plain_string() {
        let resource = AnnounceKey {
            announce_key: Key::from_str("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap(),
        };

        assert_eq!(
            serde_json::to_string(&resource).unwrap(),
            "{\"announce_key\":\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"}"
        );
    }
}
