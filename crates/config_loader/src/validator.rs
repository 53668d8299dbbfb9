//! 配置校验模块
//!
//! 校验规则：
//! - listen 必须是合法的 socket 地址
//! - 队列容量、并发上限 >= 1
//! - http 目标必须配置 http/https URL
//! - 请求头名称非空，超时 > 0
//! - 可选的 body 上限、metrics 端口若配置则 > 0

use std::net::SocketAddr;

use contracts::{ContractError, RelayBlueprint, SinkType};

/// 校验 RelayBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_server(blueprint)?;
    validate_queue(blueprint)?;
    validate_dispatch(blueprint)?;
    validate_destination(blueprint)?;
    validate_observability(blueprint)?;
    Ok(())
}

/// 校验监听地址
fn validate_server(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let server = &blueprint.server;
    if server.listen.parse::<SocketAddr>().is_err() {
        return Err(ContractError::config_validation(
            "server.listen",
            format!("'{}' is not a valid socket address", server.listen),
        ));
    }
    if server.max_body_bytes == Some(0) {
        return Err(ContractError::config_validation(
            "server.max_body_bytes",
            "max_body_bytes must be > 0 when set",
        ));
    }
    Ok(())
}

fn validate_queue(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be >= 1",
        ));
    }
    Ok(())
}

fn validate_dispatch(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatch.max_in_flight == 0 {
        return Err(ContractError::config_validation(
            "dispatch.max_in_flight",
            "max_in_flight must be >= 1",
        ));
    }
    Ok(())
}

/// 校验投递目标
fn validate_destination(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let dest = &blueprint.destination;

    if dest.name.is_empty() {
        return Err(ContractError::config_validation(
            "destination.name",
            "destination name cannot be empty",
        ));
    }

    if dest.kind == SinkType::Http {
        let url = dest.url.trim();
        if url.is_empty() {
            return Err(ContractError::config_validation(
                "destination.url",
                "http destination requires a url",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ContractError::config_validation(
                "destination.url",
                format!("'{url}' must start with http:// or https://"),
            ));
        }
    }

    if dest.timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            "destination.timeout_ms",
            "timeout_ms must be > 0 when set",
        ));
    }

    if dest.headers.keys().any(|name| name.trim().is_empty()) {
        return Err(ContractError::config_validation(
            "destination.headers",
            "header name cannot be empty",
        ));
    }

    Ok(())
}

fn validate_observability(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.observability.metrics_port == Some(0) {
        return Err(ContractError::config_validation(
            "observability.metrics_port",
            "metrics_port must be > 0, omit it to disable the endpoint",
        ));
    }
    Ok(())
}
