//! Axum [`handler`](axum::handler) for the `announce` request.
//!
//! The handler glues the delivery layer to the core tracker: admission
//! first, then the announce pipeline, and finally the compact bencoded
//! reply. Every error is converted into a bencoded failure with a `200 OK`
//! status so clients never hang on an unparsable non-2xx body.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::core::announce::{Announce, Endpoint};
use crate::core::auth::Key;
use crate::core::{AnnounceData, Tracker};
use crate::servers::http::v1::extractors::announce_key::ExtractKey;
use crate::servers::http::v1::extractors::announce_request::ExtractRequest;
use crate::servers::http::v1::requests::announce::Announce as AnnounceRequest;
use crate::servers::http::v1::responses::{self, announce};

/// It handles the `announce` request.
pub async fn handle(
    State(tracker): State<Arc<Tracker>>,
    ExtractKey(key): ExtractKey,
    ExtractRequest(announce_request): ExtractRequest,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
) -> Response {
    debug!("http announce request: {announce_request:?}");

    match handle_announce(&tracker, key, &announce_request, client_addr).await {
        Ok(announce_data) => announce::Compact::from(announce_data).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn handle_announce(
    tracker: &Arc<Tracker>,
    key: Key,
    announce_request: &AnnounceRequest,
    client_addr: SocketAddr,
) -> Result<AnnounceData, responses::error::Error> {
    // Only IPv4 peers fit the compact endpoint format.
    let IpAddr::V4(client_ip) = client_addr.ip() else {
        return Err(responses::error::Error::parse_announce());
    };

    tracker
        .authorize(&key, &announce_request.info_hash)
        .await
        .map_err(responses::error::Error::from)?;

    let announce = announce_from_request(key, announce_request, client_ip);

    tracker.announce(&announce).await.map_err(responses::error::Error::from)
}

/// It ignores any peer address in the announce request params: the IP comes
/// from the connection, the port from the query.
fn announce_from_request(key: Key, announce_request: &AnnounceRequest, client_ip: Ipv4Addr) -> Announce {
    Announce {
        key,
        info_hash: announce_request.info_hash,
        endpoint: Endpoint::new(client_ip, announce_request.port),
        numwant: announce_request.numwant,
        amount_left: announce_request.left,
        downloaded: announce_request.downloaded,
        uploaded: announce_request.uploaded,
        event: announce_request.event,
    }
}
