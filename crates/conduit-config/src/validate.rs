use crate::error::{ConfigError, ConfigResult};
use crate::model::Config;
use crate::timeouts::{MAX_TIMEOUT_SECS, SHORT_TIMEOUT_WARN_SECS};

/// Runs every per-concern validator in order, stopping at the first failure.
/// Mirrors the teacher's `validate()` entry point: one function per concern,
/// the first `ValidationError` wins.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_timeouts(config)?;
    validate_message_bus(config)?;
    validate_routing(config)?;
    validate_expert_analysis(config)?;
    validate_session(config)?;
    validate_server(config)?;
    Ok(())
}

fn validate_timeouts(config: &Config) -> ConfigResult<()> {
    let t = &config.timeouts;

    for (field, secs) in [
        ("tool_timeout_secs", t.tool_secs),
        ("daemon_timeout_secs", t.daemon_secs),
        ("shim_timeout_secs", t.shim_secs),
        ("client_timeout_secs", t.client_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::ValidationError {
                field,
                message: "must be positive".to_string(),
            });
        }
        if secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError {
                field,
                message: format!("must not exceed {MAX_TIMEOUT_SECS}s"),
            });
        }
        if secs < SHORT_TIMEOUT_WARN_SECS {
            tracing::warn!(field, secs, "timeout is unusually short (< 5s)");
        }
    }

    if !(t.tool_secs < t.daemon_secs) {
        return Err(ConfigError::TimeoutOrderViolation {
            lesser: "tool_timeout_secs",
            lesser_secs: t.tool_secs,
            greater: "daemon_timeout_secs",
            greater_secs: t.daemon_secs,
        });
    }
    if !(t.daemon_secs < t.shim_secs) {
        return Err(ConfigError::TimeoutOrderViolation {
            lesser: "daemon_timeout_secs",
            lesser_secs: t.daemon_secs,
            greater: "shim_timeout_secs",
            greater_secs: t.shim_secs,
        });
    }
    if !(t.shim_secs < t.client_secs) {
        return Err(ConfigError::TimeoutOrderViolation {
            lesser: "shim_timeout_secs",
            lesser_secs: t.shim_secs,
            greater: "client_timeout_secs",
            greater_secs: t.client_secs,
        });
    }

    let (daemon_ratio, shim_ratio, client_ratio) = t.ratios();
    let (exp_daemon, exp_shim, exp_client) = crate::timeouts::TimeoutHierarchy::expected_ratios();
    if (daemon_ratio - exp_daemon).abs() > 1.0
        || (shim_ratio - exp_shim).abs() > 1.0
        || (client_ratio - exp_client).abs() > 1.0
    {
        tracing::warn!(
            daemon_ratio,
            shim_ratio,
            client_ratio,
            "timeout buffer ratios depart noticeably from the expected 1.5x/2.0x/2.5x shape"
        );
    }

    Ok(())
}

fn validate_message_bus(config: &Config) -> ConfigResult<()> {
    let bus = &config.message_bus;
    if bus.inline_threshold_bytes == 0 {
        return Err(ConfigError::ValidationError {
            field: "message_bus_inline_threshold_bytes",
            message: "must be positive".to_string(),
        });
    }
    if bus.ttl_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "message_bus_ttl_secs",
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_routing(config: &Config) -> ConfigResult<()> {
    let routing = &config.routing;
    if !(0.0..=1.0).contains(&routing.complexity_threshold) || routing.complexity_threshold.is_nan() {
        return Err(ConfigError::ValidationError {
            field: "routing_complexity_threshold",
            message: "must be between 0.0 and 1.0".to_string(),
        });
    }
    if routing.context_threshold_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "routing_context_threshold_tokens",
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_expert_analysis(config: &Config) -> ConfigResult<()> {
    if config.expert_analysis.max_file_size_kb == 0 {
        return Err(ConfigError::ValidationError {
            field: "expert_analysis_max_file_size_kb",
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_session(config: &Config) -> ConfigResult<()> {
    let session = &config.session;
    if session.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "session_timeout_secs",
            message: "must be positive".to_string(),
        });
    }
    if session.cleanup_interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "session_cleanup_interval",
            message: "must be positive".to_string(),
        });
    }
    if session.concurrency_max == 0 {
        return Err(ConfigError::ValidationError {
            field: "session_concurrency_max",
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    if config.server.max_inbound_bytes == 0 {
        return Err(ConfigError::ValidationError {
            field: "max_inbound_bytes",
            message: "must be positive".to_string(),
        });
    }
    if config.server.max_queue_depth == 0 {
        return Err(ConfigError::ValidationError {
            field: "max_queue_depth",
            message: "must be positive".to_string(),
        });
    }
    if config.server.connection_concurrency_max == 0 {
        return Err(ConfigError::ValidationError {
            field: "connection_concurrency_max",
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}
