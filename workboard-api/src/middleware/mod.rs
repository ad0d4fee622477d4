/// HTTP middleware
///
/// Bearer authentication lives in `workboard_shared::auth::middleware`; this
/// module holds the layers that only the server needs.

pub mod security;
