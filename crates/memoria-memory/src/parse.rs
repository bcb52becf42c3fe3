// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for pulling a JSON object out of model output.

use serde::de::IgnoredAny;

/// Return the first complete JSON object in `response`, dropping code
/// fences and any prose around it. When no object parses from the first
/// `{`, falls back to the outermost `{...}` span, then to the trimmed input.
pub(crate) fn json_object_span(response: &str) -> &str {
    let trimmed = strip_code_fence(response.trim());
    let Some(start) = trimmed.find('{') else {
        return trimmed;
    };

    let candidate = &trimmed[start..];
    let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<IgnoredAny>();
    if let Some(Ok(_)) = stream.next() {
        return &candidate[..stream.byte_offset()];
    }

    match trimmed.rfind('}') {
        Some(end) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") up to the first newline
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
