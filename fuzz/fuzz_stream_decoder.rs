//! Fuzz target for the streaming line decoder and delta extraction.
//!
//! Run with: cargo +nightly fuzz run fuzz_stream_decoder
//!
//! Feeds arbitrary byte sequences through `LineDecoder` in uneven chunks,
//! then runs each produced line through JSON parsing and every dialect's
//! `extract_delta`. None of it may panic, regardless of input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quillstream_core::dialect::ProviderDialect;
use quillstream_core::stream::LineDecoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    // Split the input into chunks of varying size to exercise buffering
    // across arbitrary boundaries, including mid-UTF-8-sequence.
    for chunk in data.chunks(7) {
        decoder.push(chunk);

        while let Some(line) = decoder.next_line() {
            let payload = line.trim().strip_prefix("data:").unwrap_or(&line).trim();
            if let Ok(event) = serde_json::from_str::<serde_json::Value>(payload) {
                let _ = ProviderDialect::Claude.extract_delta(&event);
                let _ = ProviderDialect::OpenAiChat.extract_delta(&event);
                let _ = ProviderDialect::OpenAiCompletions.extract_delta(&event);
            }
        }
    }
});
