#![no_main]

use cinema_booking_client::StoredDraft;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Drafts are read back from device storage that another app version (or a
    // user with a file manager) may have written.
    let Ok(stored) = serde_json::from_slice::<StoredDraft>(data) else {
        return;
    };

    // Pricing and expiry must never panic on decoded input.
    let _ = stored.draft.total();
    let _ = stored.is_expired(chrono::Utc::now(), chrono::Duration::minutes(30));

    // Re-encoding a decoded draft must succeed.
    let _ = serde_json::to_string(&stored);
});
