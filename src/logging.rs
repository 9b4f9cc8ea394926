//! Internal logging helpers for structured codec events.

/// Single logging target for the codec.
pub(crate) const LOG_TARGET: &str = "tablestore_codec";

macro_rules! codec_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use codec_log;
