#![no_main]

use libfuzzer_sys::fuzz_target;
use signaling_protocol::packet::EnginePacket;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Frames come straight off the socket; decode must only ever return Err
    if let Ok(EnginePacket::Message(body)) = EnginePacket::decode(text) {
        let _ = signaling_protocol::codec::decode_packet(&body);
    }
});
