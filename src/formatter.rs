//! Provenance footer formatting
//!
//! Builds the final post text: the rewritten body, a blank line, then a
//! two-line footer naming the source and its trust rating.
//!
//! ```text
//! <rewritten body>
//!
//! Source - @FabrizioRomano
//! [ 🟢 (90%) - Highly Reliable ]
//! ```

use crate::models::{PublishPayload, Source};

/// Qualitative label for a reliability percentage
///
/// Bands are half-open and evaluated top-down.
pub fn reliability_descriptor(reliability: u8) -> &'static str {
    match reliability {
        75.. => "Highly Reliable",
        50..=74 => "Mixed/Decent",
        25..=49 => "Questionable",
        _ => "Probably Waffle",
    }
}

/// Footer lines for a source
pub fn footer(source: &Source) -> String {
    format!(
        "Source - @{}\n[ {} ({}%) - {} ]",
        source.id,
        source.tier.glyph(),
        source.reliability,
        reliability_descriptor(source.reliability)
    )
}

/// Assemble the payload for a rewritten body
pub fn payload(rewritten: &str, source: &Source) -> PublishPayload {
    PublishPayload {
        body: rewritten.to_string(),
        footer: footer(source),
    }
}

/// Final text handed to the publisher
pub fn build_payload(rewritten: &str, source: &Source) -> String {
    payload(rewritten, source).into_text()
}
