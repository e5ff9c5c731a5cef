//! API handlers: the public JSON surface consumed by the frontend and the
//! restricted admin endpoints.
//!
//! Restricted endpoints gate on a process-wide shared secret carried in the
//! `Authorization` header. If no secret is configured they are disabled
//! entirely.
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Host, Multipart, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::resources::announce_key::AnnounceKey;
use super::resources::stats::Stats;
use super::resources::torrent::{AddInfoHashForm, DeleteInfoHashForm, ListItem, TorrentFileParams};
use super::responses;
use crate::core::auth::Key;
use crate::core::databases::error::Error as DatabaseError;
use crate::core::error::Error;
use crate::core::Tracker;
use crate::shared::bit_torrent::info_hash::InfoHash;
use crate::shared::bit_torrent::torrent_file;

/// It validates the shared admin secret. Used at the start of every
/// restricted handler.
fn validate_admin_secret(tracker: &Tracker, headers: &HeaderMap) -> Result<(), Response> {
    // A missing secret in the configuration disables the restricted API.
    let Some(secret) = tracker.admin_secret() else {
        return Err(responses::forbidden_response("restricted API access disabled"));
    };

    match headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) {
        None => Err(responses::bad_request_response(
            "restricted API request with empty authorization header",
        )),
        Some(token) if token == secret => Ok(()),
        Some(_) => Err(responses::forbidden_response("invalid authorization")),
    }
}

/// It handles `GET /api/stats`: tracker-wide hashcount/seeders/leechers.
pub async fn get_stats_handler(State(tracker): State<Arc<Tracker>>) -> Response {
    match tracker.torrent_summaries().await {
        Ok(summaries) => axum::Json(Stats::from(summaries.as_slice())).into_response(),
        Err(err) => {
            error!("could not aggregate tracker stats: {err}");
            responses::internal_server_error_response("could not query database")
        }
    }
}

/// It handles `GET /api/infohashes`: the per-torrent listing.
pub async fn get_info_hashes_handler(State(tracker): State<Arc<Tracker>>) -> Response {
    match tracker.torrent_summaries().await {
        Ok(summaries) => {
            let items: Vec<ListItem> = summaries.iter().map(ListItem::from).collect();
            axum::Json(items).into_response()
        }
        Err(err) => {
            error!("could not list info-hashes: {err}");
            responses::internal_server_error_response("could not query database")
        }
    }
}

/// It handles `GET /api/generate`: issues a new announce key.
pub async fn generate_announce_key_handler(State(tracker): State<Arc<Tracker>>) -> Response {
    match tracker.generate_announce_key().await {
        Ok(announce_key) => axum::Json(AnnounceKey { announce_key }).into_response(),
        Err(err) => {
            error!("could not generate announce key: {err}");
            responses::internal_server_error_response("could not generate announce key")
        }
    }
}

/// It handles `POST /api/infohash` (restricted): registers an info-hash
/// with a name.
pub async fn add_info_hash_handler(
    State(tracker): State<Arc<Tracker>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<AddInfoHashForm>,
) -> Response {
    if let Err(rejection) = validate_admin_secret(&tracker, &headers) {
        return rejection;
    }

    match tracker.register_info_hash(&form.info_hash, &form.name).await {
        Ok(()) => responses::created_response(),
        Err(Error::Database {
            source: DatabaseError::UniqueViolation { .. },
        }) => responses::bad_request_response("info_hash already registered"),
        Err(err) => {
            error!("could not register info-hash: {err}");
            responses::internal_server_error_response("could not register info_hash")
        }
    }
}

/// It handles `DELETE /api/infohash` (restricted): removes an info-hash,
/// cascading to its announces.
pub async fn delete_info_hash_handler(
    State(tracker): State<Arc<Tracker>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<DeleteInfoHashForm>,
) -> Response {
    if let Err(rejection) = validate_admin_secret(&tracker, &headers) {
        return rejection;
    }

    match tracker.unregister_info_hash(&form.info_hash).await {
        Ok(()) => responses::ok_response(),
        Err(Error::Database {
            source: DatabaseError::DeleteFailed { .. },
        }) => responses::bad_request_response("info_hash not registered"),
        Err(err) => {
            error!("could not remove info-hash: {err}");
            responses::internal_server_error_response("could not remove info_hash")
        }
    }
}

/// It handles `POST /api/torrentfile` (restricted): a multipart torrent
/// file upload. The stored file is stripped of its announce URL and gets
/// the private flag forced.
///
/// Both this endpoint and `POST /api/infohash` are supported because the
/// latter makes testing easier and may be convenient for public torrents.
pub async fn upload_torrent_file_handler(
    State(tracker): State<Arc<Tracker>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(rejection) = validate_admin_secret(&tracker, &headers) {
        return rejection;
    }

    let Some(bytes) = read_file_field(multipart).await else {
        return responses::bad_request_response("could not process posted file");
    };

    let torrent = match torrent_file::strip_for_registry(&bytes) {
        Ok(torrent) => torrent,
        Err(_) => return responses::bad_request_response("could not decode posted file"),
    };

    match tracker.register_torrent_file(&torrent).await {
        Ok(()) => responses::created_response(),
        Err(Error::Database {
            source: DatabaseError::UniqueViolation { .. },
        }) => responses::bad_request_response("info_hash already registered"),
        Err(err) => {
            error!("could not register torrent file: {err}");
            responses::internal_server_error_response("could not register torrent file")
        }
    }
}

async fn read_file_field(mut multipart: Multipart) -> Option<Vec<u8>> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            return field.bytes().await.ok().map(|bytes| bytes.to_vec());
        }
    }

    None
}

/// It handles `GET /api/torrentfile`: if the announce key is issued and the
/// info-hash has a stored file, it returns the torrent with the caller's
/// announce URL injected back in.
pub async fn get_torrent_file_handler(
    State(tracker): State<Arc<Tracker>>,
    Host(host): Host,
    Query(params): Query<TorrentFileParams>,
) -> Response {
    let Ok(key) = Key::from_str(&params.announce_key) else {
        return responses::bad_request_response("invalid announce key");
    };

    match tracker.is_issued_key(&key).await {
        Ok(true) => (),
        Ok(false) => return responses::bad_request_response("invalid announce key"),
        Err(err) => {
            error!("could not validate announce key: {err}");
            return responses::internal_server_error_response("unable to validate announce key");
        }
    }

    let Ok(info_hash) = InfoHash::from_str(&params.info_hash) else {
        return responses::bad_request_response("could not decode hex info_hash");
    };

    let stored = match tracker.stored_torrent_file(&info_hash).await {
        Ok(Some(stored)) => stored,
        Ok(None) => return responses::bad_request_response("no matching infohash with stored torrent file"),
        Err(err) => {
            error!("could not fetch torrent file: {err}");
            return responses::internal_server_error_response("unable to fetch torrent file");
        }
    };

    let announce_url = format!("http://{host}/{key}/announce");

    match torrent_file::with_announce_url(&stored, &announce_url) {
        Ok(bytes) => (
            axum::http::StatusCode::OK,
            [(header::CONTENT_TYPE, "application/x-bittorrent")],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!("could not rebuild torrent file: {err}");
            responses::internal_server_error_response("could not construct new torrent file")
        }
    }
}

#[cfg(test)]
mod tests {

    mod the_admin_secret_validation {
        use axum::http::{header, HeaderMap, HeaderValue, StatusCode};

        use crate::config::Configuration;
        use crate::core::Tracker;
        use crate::servers::apis::handlers::validate_admin_secret;

        fn tracker_with_secret(secret: Option<&str>) -> Tracker {
            let config = Configuration {
                admin_secret: secret.map(ToOwned::to_owned),
                ..Configuration::ephemeral()
            };
            Tracker::new(&config).unwrap()
        }

        fn headers_with_authorization(token: &str) -> HeaderMap {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(token).unwrap());
            headers
        }

        #[test]
        fn it_should_be_disabled_when_no_secret_is_configured() {
            let tracker = tracker_with_secret(None);

            let rejection = validate_admin_secret(&tracker, &headers_with_authorization("anything")).unwrap_err();

            assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
        }

        #[test]
        fn an_empty_configured_secret_should_also_disable_it() {
            let tracker = tracker_with_secret(Some(""));

            let rejection = validate_admin_secret(&tracker, &headers_with_authorization("anything")).unwrap_err();

            assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
        }

        #[test]
        fn it_should_reject_a_request_without_an_authorization_header() {
            let tracker = tracker_with_secret(Some("s3cr3t"));

            let rejection = validate_admin_secret(&tracker, &HeaderMap::new()).unwrap_err();

            assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        }

        #[test]
        fn it_should_reject_a_request_with_the_wrong_secret() {
            let tracker = tracker_with_secret(Some("s3cr3t"));

            let rejection = validate_admin_secret(&tracker, &headers_with_authorization("wrong")).unwrap_err();

            assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
        }

        #[test]
        fn it_should_accept_the_configured_secret() {
            let tracker = tracker_with_secret(Some("s3cr3t"));

            assert!(validate_admin_secret(&tracker, &headers_with_authorization("s3cr3t")).is_ok());
        }
    }

    mod the_registry_round_trip {
        use std::collections::HashMap;
        use std::sync::Arc;

        use serde_bencode::value::Value;

        use crate::config::Configuration;
        use crate::core::databases::error::Error as DatabaseError;
        use crate::core::error::Error;
        use crate::core::Tracker;
        use crate::shared::bit_torrent::info_hash::InfoHash;
        use crate::shared::bit_torrent::torrent_file;

        fn tracker() -> Arc<Tracker> {
            Arc::new(Tracker::new(&Configuration::ephemeral()).unwrap())
        }

        fn sample_torrent_bytes() -> Vec<u8> {
            let mut info: HashMap<Vec<u8>, Value> = HashMap::new();
            info.insert(b"name".to_vec(), Value::Bytes(b"linux.iso".to_vec()));
            info.insert(b"length".to_vec(), Value::Int(1024));
            info.insert(b"piece length".to_vec(), Value::Int(16384));
            info.insert(b"pieces".to_vec(), Value::Bytes(vec![0xab; 20]));

            let mut root: HashMap<Vec<u8>, Value> = HashMap::new();
            root.insert(b"announce".to_vec(), Value::Bytes(b"http://old.invalid/announce".to_vec()));
            root.insert(b"info".to_vec(), Value::Dict(info));

            serde_bencode::to_bytes(&Value::Dict(root)).unwrap()
        }

        #[tokio::test]
        async fn a_registered_info_hash_should_be_reported_as_duplicate_on_reinsertion() {
            let tracker = tracker();
            let info_hash = InfoHash(*b"aaaaaaaaaaaaaaaaaaaa");

            tracker.register_info_hash(&info_hash, "test torrent").await.unwrap();

            let result = tracker.register_info_hash(&info_hash, "test torrent").await;

            assert!(matches!(
                result,
                Err(Error::Database {
                    source: DatabaseError::UniqueViolation { .. }
                })
            ));
        }

        #[tokio::test]
        async fn an_uploaded_torrent_file_should_be_stored_stripped_and_retrievable() {
            let tracker = tracker();

            let torrent = torrent_file::strip_for_registry(&sample_torrent_bytes()).unwrap();
            tracker.register_torrent_file(&torrent).await.unwrap();

            let stored = tracker.stored_torrent_file(&torrent.info_hash).await.unwrap().unwrap();
            assert_eq!(stored, torrent.file);

            // The allowlist admits the uploaded torrent.
            let key = tracker.generate_announce_key().await.unwrap();
            assert!(tracker.authorize(&key, &torrent.info_hash).await.is_ok());
        }

        #[tokio::test]
        async fn deleting_an_info_hash_should_stop_admitting_it() {
            let tracker = tracker();
            let info_hash = InfoHash(*b"aaaaaaaaaaaaaaaaaaaa");

            tracker.register_info_hash(&info_hash, "test torrent").await.unwrap();

            let key = tracker.generate_announce_key().await.unwrap();
            tracker.authorize(&key, &info_hash).await.unwrap();

            tracker.unregister_info_hash(&info_hash).await.unwrap();

            assert!(tracker.authorize(&key, &info_hash).await.is_err());
        }
    }
}
