//! Local-only SSVC derivation. A known stub — do not invent remote policy.

use warden_scoring::SsvcInfo;

/// Always produces the conservative default TRACK decision, synchronously,
/// with no network call.
pub fn derive() -> SsvcInfo {
    SsvcInfo::default_stub()
}
