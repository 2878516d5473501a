//! HTTP API request handlers

use crate::app::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use types::utils::normalize_mac;
use types::QueryKind;

type ScriptResponse = Result<(StatusCode, String), (StatusCode, String)>;

/// Boot script for a MAC address
pub async fn boot_by_mac(
    State(state): State<Arc<AppState>>,
    Path(mac): Path<String>,
) -> ScriptResponse {
    respond(&state, QueryKind::Mac, &mac)
}

/// Boot script for a serial number
pub async fn boot_by_serial(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> ScriptResponse {
    respond(&state, QueryKind::Serial, &serial)
}

/// Boot script for a group
pub async fn boot_by_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> ScriptResponse {
    respond(&state, QueryKind::Group, &group)
}

/// Default boot script
pub async fn boot_default(State(state): State<Arc<AppState>>) -> ScriptResponse {
    Ok((StatusCode::OK, state.resolver.resolve_default()))
}

fn respond(state: &AppState, kind: QueryKind, identity: &str) -> ScriptResponse {
    match state.resolver.resolve(kind, identity) {
        Ok(script) => Ok((StatusCode::OK, script)),
        Err(e) => {
            let label = e.label().unwrap_or("-");
            if kind == QueryKind::Mac {
                tracing::error!(
                    mac = identity,
                    normalised_mac = %normalize_mac(identity),
                    label = label,
                    "{}",
                    e
                );
            } else {
                tracing::error!(kind = %kind, identity = identity, label = label, "{}", e);
            }

            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
    }
}
