//! Response envelope shared by the JSON handlers.
//!
//! Dashboard endpoints answer `{ "data": ... }`. The embed-facing submit
//! and booking endpoints answer bare objects their scripts read directly.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
