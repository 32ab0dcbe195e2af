//! Caption XML in its two dialects.
//!
//! Format 3 (what InnerTube serves today):
//!
//! ```xml
//! <timedtext format="3"><body>
//!   <p t="1500" d="2000"><s ac="0">Hello</s><s t="400"> world</s></p>
//! </body></timedtext>
//! ```
//!
//! Legacy format, timings already in seconds:
//!
//! ```xml
//! <transcript><text start="1.5" dur="2.0">Hello world</text></transcript>
//! ```

use crate::TranscriptSegment;
use crate::xml::{Element, elements};

/// Parse caption XML into segments in document order.
///
/// Tries format 3 first and only falls back to the legacy dialect when that
/// finds nothing. Never fails: unrecognized input gives an empty vec.
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    let segments: Vec<_> = elements(xml, "p").filter_map(format3_segment).collect();
    if !segments.is_empty() {
        return segments;
    }
    elements(xml, "text").filter_map(legacy_segment).collect()
}

fn format3_segment(p: Element<'_>) -> Option<TranscriptSegment> {
    let t: u64 = p.attr("t")?.trim().parse().ok()?;
    let d: u64 = p.attr("d")?.trim().parse().ok()?;
    segment(&p, t as f64 / 1000.0, d as f64 / 1000.0)
}

fn legacy_segment(text: Element<'_>) -> Option<TranscriptSegment> {
    let start = seconds(&text.attr("start")?)?;
    let dur = seconds(&text.attr("dur")?)?;
    segment(&text, start, dur)
}

/// Finite, non-negative seconds; `NaN`, `inf` and negatives are rejected
/// since they cannot survive a JSON round trip through the cache.
fn seconds(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn segment(el: &Element<'_>, offset: f64, duration: f64) -> Option<TranscriptSegment> {
    let text = el.text();
    if text.is_empty() {
        return None;
    }
    Some(TranscriptSegment { text, offset, duration })
}
