#![no_main]

use cinema_booking_client::models::{Reservation, Seat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Backend payloads with lenient ids and decimal-or-string prices.
    let _ = serde_json::from_slice::<Reservation>(data);
    let _ = serde_json::from_slice::<Vec<Seat>>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<Reservation>(s);
    }
});
