#![no_main]

use libfuzzer_sys::fuzz_target;
use signaling_protocol::codec::{decode_packet, encode_packet};
use signaling_protocol::signal::InboundSignal;

fuzz_target!(|text: &str| {
    let Ok(packet) = decode_packet(text) else {
        return;
    };

    if let Some((name, args)) = packet.as_event() {
        let _ = InboundSignal::from_event(name, args).kind();
    }

    // Anything we accept must re-encode to something we accept again
    let encoded = encode_packet(&packet);
    assert!(decode_packet(&encoded).is_ok(), "re-encode failed: {encoded}");
});
