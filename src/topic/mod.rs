//! Topic matching and validation
//!
//! Implements filter matching for `/`-separated topics with the two MQTT
//! wildcards: `+` matches exactly one level, a trailing `#` matches the
//! remainder of the topic. Matching sits on the dispatch hot path (once per
//! inbound message per registered filter), so it walks both strings level by
//! level without allocating.

/// Check if a topic filter matches a concrete topic name.
///
/// Matching rules:
/// - `/` is the level separator
/// - `+` matches exactly one level and never crosses a separator
/// - `#` matches the remaining topic, including an empty one (`""` matches
///   the filter `"#"`)
/// - any other level must match exactly
///
/// Both walks must be exhausted simultaneously for a match, unless a `#` is
/// reached while topic levels remain to be examined. A filter with more
/// levels than the topic never matches, even when the extra level is `#`:
/// `a/#` does not match `a`.
pub fn topic_matches_filter(topic: &str, filter: &str) -> bool {
    let mut topic_levels = topic.split('/');
    let mut filter_levels = filter.split('/');

    loop {
        let Some(filter_level) = filter_levels.next() else {
            // Filter exhausted: match only if the topic is too
            return topic_levels.next().is_none();
        };
        let Some(topic_level) = topic_levels.next() else {
            // Topic exhausted but the filter still has levels
            return false;
        };

        match filter_level {
            "#" => return true,
            "+" => {}
            _ if filter_level == topic_level => {}
            _ => return false,
        }
    }
}

/// Validate a topic name (used in publishes).
///
/// Topic names:
/// - Must be at least 1 character
/// - Must not exceed 65535 bytes
/// - Must not contain null character
/// - Must not contain wildcards (+ or #)
pub fn validate_topic_name(topic: &str) -> Result<(), &'static str> {
    if topic.is_empty() {
        return Err("topic name cannot be empty");
    }

    if topic.len() > 65535 {
        return Err("topic name exceeds maximum length");
    }

    if topic.contains('\0') {
        return Err("topic name cannot contain null character");
    }

    if topic.contains('+') || topic.contains('#') {
        return Err("topic name cannot contain wildcards");
    }

    Ok(())
}

/// Validate a topic filter (used in handler registration).
///
/// Topic filters:
/// - Must be at least 1 character
/// - Must not exceed 65535 bytes
/// - Must not contain null character
/// - Multi-level wildcard (#) must occupy an entire level and be the last
/// - Single-level wildcard (+) must occupy an entire level
pub fn validate_topic_filter(filter: &str) -> Result<(), &'static str> {
    if filter.is_empty() {
        return Err("topic filter cannot be empty");
    }

    if filter.len() > 65535 {
        return Err("topic filter exceeds maximum length");
    }

    if filter.contains('\0') {
        return Err("topic filter cannot contain null character");
    }

    let levels: Vec<&str> = filter.split('/').collect();

    for (i, level) in levels.iter().enumerate() {
        if level.contains('#') {
            // # must be the entire level and the last level
            if *level != "#" {
                return Err("multi-level wildcard must occupy entire level");
            }
            if i != levels.len() - 1 {
                return Err("multi-level wildcard must be last level");
            }
        }

        if level.contains('+') && *level != "+" {
            return Err("single-level wildcard must occupy entire level");
        }
    }

    Ok(())
}
